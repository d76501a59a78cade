use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised inside a single provider attempt.
///
/// These never cross the [`Provider::call`](crate::providers::Provider::call)
/// boundary: they are logged there and collapsed into "no answer".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider {provider} is not configured: {message}")]
    NotConfigured { provider: String, message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("All providers exhausted")]
    Exhausted,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Attachment preparation errors
#[derive(Debug, Error)]
pub enum ModalityError {
    #[error("Failed to decode attachment {filename}: {message}")]
    Decode { filename: String, message: String },

    #[error("Unsupported media type {media_type} for {filename}")]
    UnsupportedType {
        filename: String,
        media_type: String,
    },

    #[error("Failed to extract text from {filename}: {message}")]
    Extraction { filename: String, message: String },
}

/// Structured analysis extraction errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Insufficient context: {words} words (need {required})")]
    InsufficientContext { words: usize, required: usize },

    #[error("No provider produced an analysis completion")]
    NoCompletion,

    #[error("Failed to parse analysis: {message}")]
    Parse { message: String },
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for attachment preparation
pub type ModalityResult<T> = Result<T, ModalityError>;

/// Result type alias for structured analysis extraction
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;
