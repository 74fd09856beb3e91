//! Tavily web-search toolkit.
//!
//! Reads `TAVILY_API_KEY` from the environment on each call, so the toolkit
//! can be constructed before credentials are available.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ToolDescriptor, Toolkit};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Tavily API request body.
#[derive(Debug, Serialize)]
struct TavilySearchRequest {
    api_key: String,
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_answer: Option<bool>,
}

/// Tavily API response.
#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

/// A single result from Tavily.
#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
}

/// Web search via the Tavily API.
pub struct TavilyTools {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TavilyTools {
    fn default() -> Self {
        Self::new()
    }
}

impl TavilyTools {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: TAVILY_API_URL.to_string(),
        }
    }

    async fn search(&self, query: &str, max_results: u32) -> anyhow::Result<String> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("TAVILY_API_KEY environment variable is not set"))?;

        let request = TavilySearchRequest {
            api_key,
            query: query.to_string(),
            max_results: Some(max_results),
            include_answer: Some(true),
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Tavily API error ({}): {}", status, error_text);
        }

        let tavily_response: TavilySearchResponse = response.json().await?;
        Ok(format_results(query, &tavily_response))
    }
}

/// Format a Tavily response for the model: quick answer first, then sources.
fn format_results(query: &str, response: &TavilySearchResponse) -> String {
    if response.results.is_empty() && response.answer.is_none() {
        return format!("No results found for: {}", query);
    }

    let mut output = String::new();

    if let Some(answer) = &response.answer {
        if !answer.is_empty() {
            output.push_str("## Quick Answer\n\n");
            output.push_str(answer);
            output.push_str("\n\n---\n\n## Sources\n\n");
        }
    }

    for (i, result) in response.results.iter().enumerate() {
        output.push_str(&format!(
            "### {}. {}\n**URL:** {}\n\n{}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }

    output
}

#[async_trait]
impl Toolkit for TavilyTools {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        Ok(vec![ToolDescriptor {
            name: "web_search".to_string(),
            description: "Search the web for real-time information. Returns search results \
                          with titles, snippets and URLs."
                .to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default: 5, max: 10)"
                    }
                },
                "required": ["query"]
            }),
        }])
    }

    async fn invoke(&self, tool: &str, args: Value) -> anyhow::Result<String> {
        if tool != "web_search" {
            anyhow::bail!("Unknown Tavily tool: {}", tool);
        }

        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let max_results = args["max_results"].as_u64().unwrap_or(5).min(10) as u32;

        self.search(query, max_results).await
    }
}
