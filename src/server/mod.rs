//! Server module for the JSON-RPC stdio transport.
//!
//! This module provides:
//! - MCP-style server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::orchestrator::LegalOrchestrator;
use crate::providers::OllamaClient;

/// Application state shared across handlers.
///
/// Read-only after startup; concurrent calls share nothing mutable.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Orchestration core.
    pub orchestrator: LegalOrchestrator,
    /// Self-hosted backend, queried directly for model status and health.
    pub self_hosted: OllamaClient,
}

impl AppState {
    /// Create new application state
    pub fn new(config: &Config, orchestrator: LegalOrchestrator) -> AppResult<Self> {
        let self_hosted = OllamaClient::new(&config.ollama, &config.request)?;

        tracing::info!(
            providers = ?orchestrator.chain().provider_names(),
            self_hosted = %self_hosted.base_url(),
            "AppState initialized"
        );

        Ok(Self {
            orchestrator,
            self_hosted,
        })
    }

    /// Build everything from configuration.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let orchestrator = LegalOrchestrator::from_config(&config)?;
        Self::new(&config, orchestrator)
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
