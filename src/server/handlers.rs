use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::error::{McpError, McpResult};
use crate::orchestrator::{AnalysisRequest, Exchange};
use crate::providers::Provider;

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "legal_analyze" => handle_analyze(state, arguments).await,
        "legal_summarize" => handle_summarize(state, arguments).await,
        "legal_model_status" => handle_model_status(state).await,
        "legal_health" => handle_health(state).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Self-hosted backend status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub available: bool,
    pub models: Vec<String>,
    /// Configured model when available, `"none"` otherwise.
    pub active_model: String,
}

/// Service health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub self_hosted_available: bool,
    pub active_model: String,
    pub providers: Vec<String>,
}

/// Parameters for `legal_summarize`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeParams {
    #[serde(default, alias = "conversation_history")]
    pub conversation_history: Vec<Exchange>,
}

async fn handle_analyze(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let request: AnalysisRequest = parse_arguments("legal_analyze", arguments)?;
    if request.user_message.trim().is_empty() {
        return Err(McpError::InvalidParameters {
            tool_name: "legal_analyze".to_string(),
            message: "userMessage must not be empty".to_string(),
        });
    }

    let response = state.orchestrator.analyze(request).await;
    serde_json::to_value(response).map_err(McpError::Json)
}

async fn handle_summarize(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "legal_summarize",
        arguments,
        |params: SummarizeParams| async move {
            if params.conversation_history.is_empty() {
                return Err(McpError::InvalidParameters {
                    tool_name: "legal_summarize".to_string(),
                    message: "conversationHistory must not be empty".to_string(),
                });
            }
            state
                .orchestrator
                .summarize(&params.conversation_history)
                .await
                .map_err(McpError::from)
        },
    )
    .await
}

/// Model status for the self-hosted backend only.
pub async fn model_status(state: &SharedState) -> ModelStatus {
    let available = state.self_hosted.is_available().await;
    let models = if available {
        state.self_hosted.list_models().await
    } else {
        Vec::new()
    };

    ModelStatus {
        available,
        models,
        active_model: if available {
            state.self_hosted.model().to_string()
        } else {
            "none".to_string()
        },
    }
}

/// Health report. Always `"healthy"` while the process is serving.
pub async fn health(state: &SharedState) -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        self_hosted_available: state.self_hosted.is_available().await,
        active_model: state.self_hosted.model().to_string(),
        providers: state.orchestrator.chain().provider_names(),
    }
}

async fn handle_model_status(state: &SharedState) -> McpResult<Value> {
    serde_json::to_value(model_status(state).await).map_err(McpError::Json)
}

async fn handle_health(state: &SharedState) -> McpResult<Value> {
    serde_json::to_value(health(state).await).map_err(McpError::Json)
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Parse typed parameters, run the operation and serialize its result.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: Into<McpError>,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;
    let result = operation(params).await.map_err(Into::into)?;
    serde_json::to_value(result).map_err(McpError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments_missing() {
        let result: McpResult<SummarizeParams> = parse_arguments("legal_summarize", None);
        assert!(matches!(result, Err(McpError::InvalidParameters { .. })));
    }

    #[test]
    fn test_parse_arguments_wrong_type() {
        let result: McpResult<AnalysisRequest> =
            parse_arguments("legal_analyze", Some(json!({"userMessage": 42})));
        assert!(matches!(result, Err(McpError::InvalidParameters { .. })));
    }

    #[test]
    fn test_summarize_params_accept_snake_case() {
        let params: SummarizeParams = parse_arguments(
            "legal_summarize",
            Some(json!({"conversation_history": [{"user_message": "a", "system_response": "b"}]})),
        )
        .unwrap();
        assert_eq!(params.conversation_history[0].user_message, "a");
    }

    #[test]
    fn test_model_status_serialization() {
        let status = ModelStatus {
            available: false,
            models: vec![],
            active_model: "none".to_string(),
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["activeModel"], "none");
        assert_eq!(json["available"], false);
    }

    #[test]
    fn test_health_serialization() {
        let status = HealthStatus {
            status: "healthy".to_string(),
            service: "legal-intake-orchestrator".to_string(),
            self_hosted_available: true,
            active_model: "llama2".to_string(),
            providers: vec!["ollama".to_string()],
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["selfHostedAvailable"], true);
        assert_eq!(json["activeModel"], "llama2");
    }
}
