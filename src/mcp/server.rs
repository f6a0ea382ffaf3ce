// MCP Server - JSON-RPC handler shared by the stdio and HTTP transports
use crate::{
    connectors::ConnectorManager,
    errors::{McpError, McpResult},
    mcp::types::*,
};
use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct McpServer {
    manager: Arc<ConnectorManager>,
}

impl McpServer {
    pub fn new(manager: Arc<ConnectorManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectorManager {
        &self.manager
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout until EOF.
    pub async fn run(self) -> Result<()> {
        info!(connectors = self.manager.connector_count(), "MCP server starting on stdio");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break; // EOF
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            debug!(request = %message, "Received message");

            let Some(response) = self.handle_message(message).await else {
                continue;
            };

            let response_str = serde_json::to_string(&response)?;
            debug!(response = %response_str, "Sending response");

            stdout.write_all(response_str.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        info!("MCP server stdin closed, shutting down");
        Ok(())
    }

    /// Handle one raw JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(message) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                error!(error = %e, "Unparseable JSON-RPC message");
                Some(JsonRpcResponse::error(None, &McpError::Json(e)))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(request.params).await,
            "resources/list" => Ok(self.list_resources()),
            "resources/read" => self.read_resource(request.params).await,
            "connectors/list" => Ok(self.list_connectors()),
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::result(request.id, value),
            Err(e) => {
                debug!(method = %request.method, error = %e, "Request failed");
                JsonRpcResponse::error(request.id, &e)
            }
        })
    }

    fn initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let client_info = params
            .and_then(|p| p.get("clientInfo").cloned())
            .and_then(|c| serde_json::from_value::<ClientInfo>(c).ok());

        if let Some(info) = &client_info {
            info!(client = %info.name, version = %info.version, "Client connected");
        }

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "resources": {
                    "subscribe": false,
                    "listChanged": false
                },
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn list_tools(&self) -> Value {
        json!({ "tools": self.manager.list_all_tools() })
    }

    async fn call_tool(&self, params: Option<Value>) -> McpResult<Value> {
        let call: ToolCallRequest = serde_json::from_value(
            params.ok_or_else(|| McpError::InvalidArguments("Missing params".to_string()))?,
        )
        .map_err(|e| McpError::InvalidArguments(e.to_string()))?;

        let output = self.manager.call_tool(&call.name, call.arguments).await?;
        Ok(serde_json::to_value(ToolCallResult::from(output))?)
    }

    fn list_resources(&self) -> Value {
        json!({ "resources": self.manager.list_all_resources() })
    }

    async fn read_resource(&self, params: Option<Value>) -> McpResult<Value> {
        let read: ResourceReadRequest = serde_json::from_value(
            params.ok_or_else(|| McpError::InvalidArguments("Missing params".to_string()))?,
        )
        .map_err(|e| McpError::InvalidArguments(e.to_string()))?;

        let content = self.manager.read_resource(&read.uri).await?;
        Ok(json!({ "contents": [content] }))
    }

    fn list_connectors(&self) -> Value {
        json!({ "connectors": self.manager.descriptors() })
    }
}
