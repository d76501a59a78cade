//! JSON-RPC 2.0 protocol over stdio.
//!
//! This module provides:
//! - JSON-RPC 2.0 request/response handling
//! - Tool definitions and schemas
//! - Line-delimited stdio communication

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState};

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier, null when it could not be determined.
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: Capabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique tool name (used in tool calls).
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (e.g., "text").
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    /// Whether the result represents an error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Server reading line-delimited JSON-RPC requests.
///
/// Requests are handled one at a time in arrival order; responses are written
/// one per line.
pub struct McpServer {
    state: SharedState,
}

impl McpServer {
    /// Create a new server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server on process stdio
    pub async fn run(&self) -> std::io::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Legal intake orchestrator starting...");

        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        -32700,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            // Notifications get no response.
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        if request.jsonrpc != "2.0" {
            return if is_notification {
                None
            } else {
                Some(JsonRpcResponse::error(
                    request.id,
                    -32600,
                    format!("Invalid request: unsupported jsonrpc version {}", request.jsonrpc),
                ))
            };
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" => {
                debug!("Received initialized notification");
                None
            }
            "notifications/cancelled" => {
                debug!("Received cancelled notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        -32601,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");

        JsonRpcResponse::success(
            id,
            serde_json::json!({
                "tools": all_tools()
            }),
        )
    }

    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
                }
            },
            None => {
                return JsonRpcResponse::error(id, -32602, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let (content, is_error) =
            match handle_tool_call(&self.state, &params.name, params.arguments).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                        error!(error = %e, "Failed to serialize tool result");
                        format!("{{\"error\": \"Serialization failed: {}\"}}", e)
                    });
                    (
                        ToolResultContent {
                            content_type: "text".to_string(),
                            text,
                        },
                        None,
                    )
                }
                Err(e) => (
                    ToolResultContent {
                        content_type: "text".to_string(),
                        text: format!("Error: {}", e),
                    },
                    Some(true),
                ),
            };

        let tool_result = ToolCallResult {
            content: vec![content],
            is_error,
        };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }
}

/// Every tool this server exposes.
pub fn all_tools() -> Vec<Tool> {
    vec![
        get_analyze_tool(),
        get_summarize_tool(),
        get_model_status_tool(),
        get_health_tool(),
    ]
}

fn exchange_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "userMessage": {"type": "string"},
            "systemResponse": {"type": "string"}
        },
        "required": ["userMessage"]
    })
}

fn get_analyze_tool() -> Tool {
    Tool {
        name: "legal_analyze".to_string(),
        description: "Answer one turn of a legal intake conversation. Returns the response text, up to 4 clarifying questions, the case stage, a confidence label and, when enough context exists, a structured analysis with statutes, precedents and attorney recommendations.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "userMessage": {
                    "type": "string",
                    "description": "The user's current message"
                },
                "conversationHistory": {
                    "type": "array",
                    "items": exchange_schema(),
                    "description": "Prior exchanges, oldest first"
                },
                "attachments": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "filename": {"type": "string"},
                            "mediaType": {"type": "string"},
                            "base64Data": {"type": "string"}
                        },
                        "required": ["filename", "mediaType", "base64Data"]
                    },
                    "description": "Optional evidence files (images, video, PDF, DOCX, plain text)"
                }
            },
            "required": ["userMessage"]
        }),
    }
}

fn get_summarize_tool() -> Tool {
    Tool {
        name: "legal_summarize".to_string(),
        description: "Summarize a legal intake conversation: key facts, timeline and potential legal issues.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "conversationHistory": {
                    "type": "array",
                    "items": exchange_schema(),
                    "minItems": 1
                }
            },
            "required": ["conversationHistory"]
        }),
    }
}

fn get_model_status_tool() -> Tool {
    Tool {
        name: "legal_model_status".to_string(),
        description: "Availability and installed models of the self-hosted inference backend.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

fn get_health_tool() -> Tool {
    Tool {
        name: "legal_health".to_string(),
        description: "Service health, including self-hosted backend liveness and the configured provider order.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}
