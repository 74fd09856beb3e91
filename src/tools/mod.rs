//! Tool adapters available to the agent.
//!
//! A toolkit is a heterogeneous capability the agent can call into: a remote
//! MCP server, a web-search API, and so on. Each toolkit exposes one or more
//! named tools with JSON-schema parameters; the agent advertises them to the
//! model as function declarations and routes function calls back through the
//! owning toolkit.

pub mod mcp;
pub mod tavily;

pub use mcp::McpTools;
pub use tavily::TavilyTools;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::llm::ToolDefinition;

/// Description of a single tool inside a toolkit.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

impl ToolDescriptor {
    /// Convert to the model-facing function declaration.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters_schema.clone(),
        }
    }
}

/// A capability the agent can invoke.
#[async_trait]
pub trait Toolkit: Send + Sync {
    /// Toolkit name, for logging and the tools endpoint.
    fn name(&self) -> &str;

    /// The tools this toolkit currently exposes. Remote toolkits may need a
    /// network round trip on first call.
    async fn tools(&self) -> anyhow::Result<Vec<ToolDescriptor>>;

    /// Invoke a tool by name with JSON arguments.
    async fn invoke(&self, tool: &str, args: Value) -> anyhow::Result<String>;
}

/// Ordered collection of toolkits attached to an agent.
///
/// Order matters: when two toolkits expose the same tool name, the one added
/// first wins.
#[derive(Clone, Default)]
pub struct ToolSet {
    toolkits: Vec<Arc<dyn Toolkit>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, toolkit: Arc<dyn Toolkit>) {
        self.toolkits.push(toolkit);
    }

    pub fn toolkits(&self) -> &[Arc<dyn Toolkit>] {
        &self.toolkits
    }

    /// Flatten all toolkits into model function declarations.
    ///
    /// A toolkit that fails discovery (e.g. the MCP server is unreachable) is
    /// skipped with a warning rather than failing the whole run.
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = Vec::new();
        for toolkit in &self.toolkits {
            match toolkit.tools().await {
                Ok(tools) => {
                    definitions.extend(tools.iter().map(ToolDescriptor::to_definition))
                }
                Err(e) => {
                    tracing::warn!(toolkit = toolkit.name(), "tool discovery failed: {}", e)
                }
            }
        }
        definitions
    }

    /// Invoke `tool` through the first toolkit that exposes it.
    pub async fn invoke(&self, tool: &str, args: Value) -> anyhow::Result<String> {
        for toolkit in &self.toolkits {
            let tools = match toolkit.tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    tracing::warn!(toolkit = toolkit.name(), "tool discovery failed: {}", e);
                    continue;
                }
            };
            if tools.iter().any(|t| t.name == tool) {
                return toolkit.invoke(tool, args).await;
            }
        }
        anyhow::bail!("Unknown tool: {}", tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubToolkit {
        name: &'static str,
        tool: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Toolkit for StubToolkit {
        fn name(&self) -> &str {
            self.name
        }

        async fn tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
            Ok(vec![ToolDescriptor {
                name: self.tool.to_string(),
                description: String::new(),
                parameters_schema: json!({ "type": "object" }),
            }])
        }

        async fn invoke(&self, _tool: &str, _args: Value) -> anyhow::Result<String> {
            Ok(self.reply.to_string())
        }
    }

    #[tokio::test]
    async fn definitions_preserve_toolkit_order() {
        let mut set = ToolSet::new();
        set.push(Arc::new(StubToolkit {
            name: "docs",
            tool: "search_docs",
            reply: "",
        }));
        set.push(Arc::new(StubToolkit {
            name: "web",
            tool: "web_search",
            reply: "",
        }));

        let definitions = set.definitions().await;
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["search_docs", "web_search"]);
    }

    #[tokio::test]
    async fn invoke_routes_to_first_matching_toolkit() {
        let mut set = ToolSet::new();
        set.push(Arc::new(StubToolkit {
            name: "first",
            tool: "lookup",
            reply: "from first",
        }));
        set.push(Arc::new(StubToolkit {
            name: "second",
            tool: "lookup",
            reply: "from second",
        }));

        let output = set.invoke("lookup", json!({})).await.unwrap();
        assert_eq!(output, "from first");
    }

    #[tokio::test]
    async fn invoke_unknown_tool_errors() {
        let set = ToolSet::new();
        assert!(set.invoke("nope", json!({})).await.is_err());
    }
}
