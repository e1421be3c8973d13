//! MCP request handler - routes protocol methods to the registry and gateway

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use super::messages::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Methods};
use super::server::RequestHandler;
use crate::gateway::{InvocationGateway, InvocationRequest};

/// Protocol revision reported when the client does not name one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported in `initialize`
pub const SERVER_NAME: &str = "stl-viewer-mcp";

/// Handles MCP methods for the viewer server
pub struct McpHandler {
    gateway: Arc<InvocationGateway>,
    server_version: String,
}

impl McpHandler {
    pub fn new(gateway: Arc<InvocationGateway>) -> Self {
        Self {
            gateway,
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        if let Some(client) = params.get("clientInfo") {
            info!("Client connected: {}", client);
        }

        serde_json::json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": self.server_version,
            }
        })
    }

    fn list_tools(&self) -> Value {
        serde_json::json!({ "tools": self.gateway.registry().list_tools() })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let request: InvocationRequest = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        info!("Tool call: {}", request.tool_name);
        match self.gateway.invoke(request).await {
            Ok(outcome) => {
                debug!("Tool outcome (success={}): {}", outcome.success, outcome.message);
                Ok(outcome.to_call_result())
            }
            Err(e) => {
                warn!("Tool call rejected: {}", e);
                Err(JsonRpcError::from(&e))
            }
        }
    }
}

impl RequestHandler for McpHandler {
    fn handle(&self, request: JsonRpcRequest) -> impl Future<Output = JsonRpcResponse> + Send {
        async move {
            let id = request.id;
            let result = match request.method.as_str() {
                Methods::INITIALIZE => Ok(self.initialize(&request.params)),
                Methods::PING => Ok(serde_json::json!({})),
                Methods::TOOLS_LIST => Ok(self.list_tools()),
                Methods::TOOLS_CALL => self.call_tool(request.params).await,
                other => Err(JsonRpcError::method_not_found(other)),
            };

            match result {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(error) => JsonRpcResponse::error(id, error),
            }
        }
    }

    fn notify(&self, request: &JsonRpcRequest) {
        if request.method == Methods::INITIALIZED {
            info!("Client initialization complete");
        } else {
            debug!("Ignoring notification: {}", request.method);
        }
    }
}
