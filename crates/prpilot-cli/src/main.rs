//! Prpilot CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use prpilot_core::{config, AppConfig};
use prpilot_web::{create_router, AppState};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified verbosity level
fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("prpilot_cli={}", level).parse()?)
        .add_directive(format!("prpilot_core={}", level).parse()?)
        .add_directive(format!("prpilot_github={}", level).parse()?)
        .add_directive(format!("prpilot_llm={}", level).parse()?)
        .add_directive(format!("prpilot_web={}", level).parse()?)
        .add_directive(format!("tower_http={}", level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 1) // Show module path at debug+
        .with_file(verbose >= 2) // Show file:line at trace
        .with_line_number(verbose >= 2);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "prpilot")]
#[command(about = "GitHub pull request review backend with AI-assisted reviews")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output logs as JSON (for machine parsing)
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Validate configuration and exit
    CheckConfig(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "PRPILOT_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "PRPILOT_PORT", default_value = "8000")]
    port: u16,

    /// OAuth app client id
    #[arg(long, env = "GITHUB_CLIENT_ID")]
    github_client_id: String,

    /// OAuth app client secret
    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    github_client_secret: String,

    /// Callback URL registered with the OAuth app
    #[arg(long, env = "OAUTH_CALLBACK_URL")]
    oauth_callback_url: String,

    /// Completion API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    completion_api_key: String,

    #[arg(long, env = "GROQ_MODEL", default_value = config::DEFAULT_COMPLETION_MODEL)]
    completion_model: String,

    /// OpenAI-compatible completion API base URL
    #[arg(long, env = "PRPILOT_COMPLETION_URL", default_value = config::DEFAULT_COMPLETION_URL)]
    completion_url: String,

    #[arg(long, env = "PRPILOT_GITHUB_API_URL", default_value = config::DEFAULT_GITHUB_API_URL)]
    github_api_url: String,

    /// Host serving the OAuth authorize and token endpoints
    #[arg(long, env = "PRPILOT_GITHUB_OAUTH_URL", default_value = config::DEFAULT_GITHUB_OAUTH_URL)]
    github_oauth_url: String,

    /// Where the browser lands after login
    #[arg(long, env = "PRPILOT_FRONTEND_URL", default_value = config::DEFAULT_FRONTEND_URL)]
    frontend_url: String,

    /// Answer the OAuth callback with JSON instead of redirecting
    #[arg(long)]
    no_frontend_redirect: bool,
}

impl ServeArgs {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            github_client_id: self.github_client_id.clone(),
            github_client_secret: SecretString::new(self.github_client_secret.clone()),
            oauth_callback_url: self.oauth_callback_url.clone(),
            github_oauth_url: self.github_oauth_url.clone(),
            github_api_url: self.github_api_url.clone(),
            completion_api_key: SecretString::new(self.completion_api_key.clone()),
            completion_url: self.completion_url.clone(),
            completion_model: self.completion_model.clone(),
            frontend_url: (!self.no_frontend_redirect).then(|| self.frontend_url.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging with CLI options
    init_logging(cli.verbose, cli.quiet, cli.log_json)?;

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::CheckConfig(args) => {
            args.app_config()
                .validate()
                .context("Invalid configuration")?;
            println!("Configuration OK");
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.app_config();
    let state = AppState::from_config(&config).context("Invalid configuration")?;
    let app = create_router(Arc::new(state));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        addr = %addr,
        github_api = %config.github_api_url,
        model = %config.completion_model,
        "Starting prpilot server"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
