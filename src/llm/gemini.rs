//! Google Gemini client — native Generative Language API.
//!
//! Uses the non-streaming `generateContent` endpoint. The API key is read
//! from `GOOGLE_API_KEY` at request time, so constructing the client never
//! fails; a missing key surfaces on the first call.

use std::time::Duration;

use serde_json::{json, Value};

use super::{
    ChatRequest, ChatResponse, MessageContent, ModelError, Role, TokenUsage, ToolCall,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Handle to a named Gemini model.
pub struct GeminiClient {
    id: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client for the given model identifier (e.g. `gemini-2.5-flash-lite`).
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_base_url(id, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (used by tests).
    pub fn with_base_url(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            id: id.into(),
            base_url: base_url.into(),
            client,
        }
    }

    /// The model identifier this client is bound to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Execute one chat completion.
    pub async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse, ModelError> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.id
        );

        let body = build_request_body(request);

        tracing::debug!(model = %self.id, messages = request.messages.len(), "sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value =
            serde_json::from_str(&text).map_err(|e| ModelError::Parse(e.to_string()))?;
        parse_response(&value)
    }
}

/// Build the `generateContent` request body from a provider-neutral request.
///
/// System messages become the `systemInstruction`; user and tool turns map to
/// role `user`, assistant turns to role `model`. Consecutive messages that
/// map to the same wire role are merged into one content entry with multiple
/// parts, so a model turn that produced text plus function calls is replayed
/// exactly as the API emitted it (and roles stay alternating, as the API
/// requires).
pub(crate) fn build_request_body(request: &ChatRequest) -> Value {
    let mut system_parts: Vec<Value> = Vec::new();
    let mut contents: Vec<(&'static str, Vec<Value>)> = Vec::new();

    for message in &request.messages {
        let parts = message_parts(&message.content);
        let role = match message.role {
            Role::System => {
                system_parts.extend(parts);
                continue;
            }
            Role::User | Role::Tool => "user",
            Role::Assistant => "model",
        };
        match contents.last_mut() {
            Some((last_role, last_parts)) if *last_role == role => last_parts.extend(parts),
            _ => contents.push((role, parts)),
        }
    }

    let contents: Vec<Value> = contents
        .into_iter()
        .map(|(role, parts)| json!({ "role": role, "parts": parts }))
        .collect();

    let mut body = json!({ "contents": contents });

    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    body
}

fn message_parts(content: &MessageContent) -> Vec<Value> {
    match content {
        MessageContent::Text(text) => vec![json!({ "text": text })],
        MessageContent::ToolCall { name, args } => vec![json!({
            "functionCall": { "name": name, "args": args }
        })],
        MessageContent::ToolResult { name, output } => vec![json!({
            "functionResponse": {
                "name": name,
                "response": { "output": output },
            }
        })],
    }
}

/// Parse a `generateContent` response body.
pub(crate) fn parse_response(value: &Value) -> Result<ChatResponse, ModelError> {
    let candidate = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ModelError::Parse("no candidates in response".to_string()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            // Skip thinking parts; only surface the final answer
            if part.get("thought").and_then(|t| t.as_bool()) == Some(true) {
                continue;
            }
            if let Some(fc) = part.get("functionCall") {
                tool_calls.push(ToolCall {
                    name: fc["name"].as_str().unwrap_or_default().to_string(),
                    args: fc.get("args").cloned().unwrap_or_else(|| json!({})),
                });
            } else if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
        }
    }

    let usage = value.get("usageMetadata").map(|meta| TokenUsage {
        input_tokens: meta["promptTokenCount"].as_u64().unwrap_or(0) as u32,
        output_tokens: meta["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
    });

    Ok(ChatResponse {
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ToolDefinition};

    #[test]
    fn request_body_separates_system_instruction() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system("be brief"),
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi"),
            ],
            tools: vec![],
        };

        let body = build_request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn request_body_includes_function_declarations() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("search for agno")],
            tools: vec![ToolDefinition {
                name: "web_search".to_string(),
                description: "Search the web".to_string(),
                parameters: json!({ "type": "object" }),
            }],
        };

        let body = build_request_body(&request);
        let declaration = &body["tools"][0]["functionDeclarations"][0];

        assert_eq!(declaration["name"], "web_search");
    }

    #[test]
    fn tool_turns_map_to_function_response_parts() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::tool_call("web_search", json!({ "query": "agno" })),
                ChatMessage::tool_result("web_search", "three results"),
            ],
            tools: vec![],
        };

        let body = build_request_body(&request);

        assert_eq!(
            body["contents"][0]["parts"][0]["functionCall"]["name"],
            "web_search"
        );
        assert_eq!(
            body["contents"][1]["parts"][0]["functionResponse"]["response"]["output"],
            "three results"
        );
    }

    #[test]
    fn consecutive_model_messages_merge_into_one_turn() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::user("look this up"),
                ChatMessage::assistant("let me search"),
                ChatMessage::tool_call("web_search", json!({ "query": "agno" })),
                ChatMessage::tool_result("web_search", "results"),
            ],
            tools: vec![],
        };

        let body = build_request_body(&request);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        let model_parts = contents[1]["parts"].as_array().unwrap();
        assert_eq!(model_parts.len(), 2);
        assert_eq!(model_parts[0]["text"], "let me search");
        assert_eq!(model_parts[1]["functionCall"]["name"], "web_search");
        assert_eq!(contents[2]["role"], "user");
    }

    #[test]
    fn text_response_parsed() {
        let value = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Agno is " }, { "text": "a framework." }] }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 5 }
        });

        let response = parse_response(&value).unwrap();

        assert_eq!(response.content.as_deref(), Some("Agno is a framework."));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.unwrap().input_tokens, 12);
    }

    #[test]
    fn function_call_response_parsed() {
        let value = json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "functionCall": { "name": "web_search", "args": { "query": "agno" } }
                    }]
                }
            }]
        });

        let response = parse_response(&value).unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "web_search");
        assert_eq!(response.tool_calls[0].args["query"], "agno");
    }

    #[test]
    fn thought_parts_are_skipped() {
        let value = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "working it out...", "thought": true },
                        { "text": "answer" }
                    ]
                }
            }]
        });

        let response = parse_response(&value).unwrap();
        assert_eq!(response.content.as_deref(), Some("answer"));
    }

    #[test]
    fn empty_candidates_is_a_parse_error() {
        let value = json!({ "candidates": [] });
        assert!(matches!(
            parse_response(&value),
            Err(ModelError::Parse(_))
        ));
    }
}
