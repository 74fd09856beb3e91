//! Language model client module.
//!
//! Provides the chat types shared between the agent and the model backend,
//! with Google Gemini as the only implementation.

mod gemini;

pub use gemini::GeminiClient;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content variants the Gemini wire format distinguishes.
#[derive(Debug, Clone)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// A function call the model asked for (assistant turn)
    ToolCall { name: String, args: Value },
    /// The output of an executed function call (tool turn)
    ToolResult { name: String, output: String },
}

/// One turn in a conversation.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn tool_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::ToolCall {
                name: name.into(),
                args,
            },
        }
    }

    pub fn tool_result(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::ToolResult {
                name: name.into(),
                output: output.into(),
            },
        }
    }
}

/// A function the model may call, in provider-neutral form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// A function call returned by the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

/// Token usage reported by the model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Text content, if the model produced any
    pub content: Option<String>,
    /// Function calls the model asked for (may be empty)
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("GOOGLE_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}
