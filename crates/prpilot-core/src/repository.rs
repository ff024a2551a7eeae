//! GitHub repository references

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// URL prefixes stripped before splitting into owner and name
const GITHUB_PREFIXES: [&str; 3] = ["https://github.com/", "http://github.com/", "github.com/"];

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a repository URL such as `https://github.com/owner/repo/`
    ///
    /// A bare `owner/repo` is accepted as well. Anything that does not reduce
    /// to exactly two non-empty path segments is rejected.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.strip_suffix('/').unwrap_or(url);
        let path = GITHUB_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        let invalid = || Error::InvalidRepositoryReference(url.to_string());

        let (owner, name) = path.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let repo = RepositoryRef::parse("https://github.com/o/r").unwrap();
        assert_eq!(repo, RepositoryRef::new("o", "r"));
    }

    #[test]
    fn test_parse_trailing_slash() {
        let repo = RepositoryRef::parse("https://github.com/o/r/").unwrap();
        assert_eq!(repo.owner, "o");
        assert_eq!(repo.name, "r");
    }

    #[test]
    fn test_parse_bare_owner_repo() {
        let repo = RepositoryRef::parse("acme/widget").unwrap();
        assert_eq!(repo, RepositoryRef::new("acme", "widget"));
    }

    #[test]
    fn test_parse_without_scheme() {
        let repo = RepositoryRef::parse("github.com/acme/widget").unwrap();
        assert_eq!(repo, RepositoryRef::new("acme", "widget"));
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        for input in ["https://github.com/acme", "acme", "https://github.com/", ""] {
            let err = RepositoryRef::parse(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidRepositoryReference(_)),
                "expected rejection for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(RepositoryRef::parse("https://github.com//r").is_err());
        assert!(RepositoryRef::parse("o//").is_err());
    }

    #[test]
    fn test_parse_rejects_extra_segments() {
        assert!(RepositoryRef::parse("https://github.com/o/r/pull/1").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(RepositoryRef::new("acme", "widget").to_string(), "acme/widget");
    }
}
