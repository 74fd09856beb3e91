//! Remote MCP toolkit over streamable HTTP.
//!
//! Speaks JSON-RPC 2.0 against a single MCP endpoint: `initialize`, the
//! `notifications/initialized` notification, `tools/list`, and `tools/call`.
//! Tool discovery is lazy and cached, so constructing the toolkit at startup
//! never performs network I/O.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ToolDescriptor, Toolkit};

/// MCP protocol version we support
const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// `tools/list` result payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct McpToolsResponse {
    pub tools: Vec<McpToolDescriptor>,
}

/// Tool descriptor from the MCP server.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct McpToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

/// `tools/call` result payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct McpCallToolResponse {
    #[serde(default)]
    pub content: Vec<McpContent>,
    #[serde(default)]
    pub is_error: bool,
}

/// Content item from an MCP response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct McpContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Toolkit backed by a remote MCP server.
pub struct McpTools {
    name: String,
    endpoint: String,
    client: reqwest::Client,
    request_id: AtomicU64,
    /// Discovered tools, populated on first use
    descriptors: RwLock<Option<Vec<ToolDescriptor>>>,
}

impl McpTools {
    /// Create a toolkit for the MCP server at `url`. No connection is made
    /// until the first discovery or invocation.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let endpoint = url.into().trim_end_matches('/').to_string();

        Self {
            name: name.into(),
            endpoint,
            client,
            request_id: AtomicU64::new(1),
            descriptors: RwLock::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn send_jsonrpc(&self, method: &str, params: Option<Value>) -> anyhow::Result<Value> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }

        let json_response: JsonRpcResponse = response.json().await?;

        if let Some(error) = json_response.error {
            anyhow::bail!("JSON-RPC error {}: {}", error.code, error.message);
        }

        json_response
            .result
            .ok_or_else(|| anyhow::anyhow!("No result in response"))
    }

    /// Handshake with the server and discover its tools.
    async fn discover(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        let params = serde_json::json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "agno-agent",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        self.send_jsonrpc("initialize", Some(params)).await?;

        // Notification, no response expected, but some servers require it
        let _ = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .send()
            .await;

        let result = self.send_jsonrpc("tools/list", None).await?;
        let tools_response: McpToolsResponse = serde_json::from_value(result)?;

        tracing::info!(
            toolkit = %self.name,
            endpoint = %self.endpoint,
            tools = tools_response.tools.len(),
            "MCP tools discovered"
        );

        Ok(tools_response
            .tools
            .into_iter()
            .map(|t| ToolDescriptor {
                name: t.name,
                description: t.description,
                parameters_schema: t.input_schema,
            })
            .collect())
    }

    /// Return cached descriptors, discovering them on first use.
    async fn ensure_discovered(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        if let Some(cached) = self.descriptors.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let discovered = self.discover().await?;
        *self.descriptors.write().await = Some(discovered.clone());
        Ok(discovered)
    }
}

#[async_trait]
impl Toolkit for McpTools {
    fn name(&self) -> &str {
        &self.name
    }

    async fn tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        self.ensure_discovered().await
    }

    async fn invoke(&self, tool: &str, args: Value) -> anyhow::Result<String> {
        let known = self.ensure_discovered().await?;
        if !known.iter().any(|t| t.name == tool) {
            anyhow::bail!("MCP server {} does not expose tool {}", self.name, tool);
        }

        let params = serde_json::json!({
            "name": tool,
            "arguments": args,
        });

        let result = self.send_jsonrpc("tools/call", Some(params)).await?;
        let response: McpCallToolResponse = serde_json::from_value(result)?;

        let output = response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if response.is_error {
            anyhow::bail!("Tool error: {}", output);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonrpc_request_omits_missing_params() {
        let request = JsonRpcRequest::new(7, "tools/list", None);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "tools/list");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn tools_list_response_deserializes() {
        let raw = serde_json::json!({
            "tools": [{
                "name": "search_docs",
                "description": "Search the Agno documentation",
                "inputSchema": { "type": "object", "properties": { "query": { "type": "string" } } }
            }]
        });

        let parsed: McpToolsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.tools.len(), 1);
        assert_eq!(parsed.tools[0].name, "search_docs");
        assert_eq!(parsed.tools[0].input_schema["type"], "object");
    }

    #[test]
    fn call_response_joins_text_content() {
        let raw = serde_json::json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "second" }
            ],
            "isError": false
        });

        let parsed: McpCallToolResponse = serde_json::from_value(raw).unwrap();
        let text = parsed
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        assert!(!parsed.is_error);
        assert_eq!(text, "first\nsecond");
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let toolkit = McpTools::new("docs", "https://docs.agno.com/mcp/");
        assert_eq!(toolkit.endpoint(), "https://docs.agno.com/mcp");
    }
}
