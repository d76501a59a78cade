//! # Legal Intake Orchestrator
//!
//! Inference orchestration for a legal-intake assistant. A user message, its
//! conversation history and optional evidence files go in; a conversational
//! answer, clarifying questions, a case stage and (when enough context exists)
//! a structured case analysis come out.
//!
//! ## Features
//!
//! - **Prioritized fallback**: providers are tried strictly in order, skipping
//!   those lacking vision when media is attached or failing a liveness probe
//! - **Multimodal evidence**: images and video go inline to vision-capable
//!   providers; PDF, DOCX and plain text are extracted and appended as text
//! - **Structured analysis**: win probability, statutes and precedents with
//!   derived URLs, and attorney recommendations from a curated directory
//! - **Graceful degradation**: every provider or parse failure resolves to a
//!   well-formed response; only configuration errors are fatal
//!
//! ## Architecture
//!
//! ```text
//! JSON-RPC client → McpServer (stdio) → LegalOrchestrator → FallbackChain
//!                                               ↓                 ↓
//!                                       AnalysisExtractor    Gemini / Ollama (HTTP)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use legal_intake_orchestrator::{AppState, Config, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = Arc::new(AppState::from_config(config)?);
//!     McpServer::new(state).run().await?;
//!     Ok(())
//! }
//! ```

/// Structured analysis extraction, citation URLs and attorney lookup.
pub mod analysis;
/// Prioritized provider fallback.
pub mod chain;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Attachment preparation (inline media and document text).
pub mod modality;
/// Clarifying-question extraction.
pub mod normalizer;
/// Orchestration entry point.
pub mod orchestrator;
/// Centralized prompts.
pub mod prompts;
/// Inference provider interface and backends.
pub mod providers;
/// JSON-RPC server and request handling.
pub mod server;
/// Case stage tracking.
pub mod stage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use orchestrator::{AnalysisRequest, AnalysisResponse, LegalOrchestrator};
pub use server::{AppState, McpServer, SharedState};
