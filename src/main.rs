use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use legal_intake_orchestrator::{
    config::{Config, LogFormat},
    orchestrator::AnalysisRequest,
    server::{health, model_status, AppState, McpServer, SharedState},
};

#[derive(Debug, Parser)]
#[command(name = "legal-intake-orchestrator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve JSON-RPC requests on stdin/stdout (default)
    Serve,
    /// Answer a single message and print the response as JSON
    Analyze {
        /// The user's message
        #[arg(required_unless_present = "request")]
        message: Option<String>,
        /// Read a full request (message, history, attachments) from a JSON file
        #[arg(long, conflicts_with = "message")]
        request: Option<PathBuf>,
    },
    /// Print health and self-hosted model status as JSON
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Legal intake orchestrator starting..."
    );

    let state: SharedState = match AppState::from_config(config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "Failed to initialize providers");
            return Err(e.into());
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = McpServer::new(state);
            info!("Server ready, waiting for requests on stdin...");

            if let Err(e) = server.run().await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
            info!("Server shutdown complete");
        }
        Command::Analyze { message, request } => {
            let request = match (message, request) {
                (_, Some(path)) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str::<AnalysisRequest>(&raw)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                (Some(message), None) => AnalysisRequest::new(message),
                (None, None) => anyhow::bail!("either MESSAGE or --request is required"),
            };

            let response = state.orchestrator.analyze(request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Health => {
            let report = serde_json::json!({
                "health": health(&state).await,
                "models": model_status(&state).await,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Initialize tracing/logging. Output goes to stderr; stdout carries responses.
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
