//! Agent composition and the run delegation path.
//!
//! An [`Agent`] is an immutable composition of a model client, a session
//! database, an ordered set of toolkits, and behavior flags. Construction
//! goes through [`AgentBuilder`], which refuses to build with a missing
//! model or database; there is no partially configured agent.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{DbError, SessionRun, SqliteDb};
use crate::llm::{ChatMessage, ChatRequest, GeminiClient, ModelError};
use crate::tools::{ToolSet, Toolkit};

/// Exchanges pulled into context when `add_history_to_context` is set.
const HISTORY_LIMIT: usize = 20;

/// Upper bound on model/tool round trips for a single run.
const MAX_TOOL_ROUNDS: usize = 5;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent {0} is missing a model client")]
    MissingModel(String),

    #[error("Agent {0} is missing a database")]
    MissingDb(String),

    #[error("Session summaries are disabled for agent {0}")]
    SummariesDisabled(String),

    #[error("Session {0} has no history to summarize")]
    EmptySession(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Serializable view of an agent's configuration.
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub model: String,
    pub toolkits: Vec<String>,
    pub add_history_to_context: bool,
    pub markdown: bool,
    pub enable_session_summaries: bool,
}

/// A tool invocation performed during a run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedToolCall {
    pub tool: String,
    pub args: Value,
    pub output: String,
}

/// The result of one agent run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub session_id: String,
    pub content: String,
    pub tool_calls: Vec<ExecutedToolCall>,
}

/// An agent: model + session database + toolkits + behavior flags.
pub struct Agent {
    name: String,
    model: Arc<GeminiClient>,
    db: SqliteDb,
    tools: ToolSet,
    add_history_to_context: bool,
    markdown: bool,
    enable_session_summaries: bool,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            name: name.into(),
            model: None,
            db: None,
            tools: ToolSet::new(),
            add_history_to_context: false,
            markdown: false,
            enable_session_summaries: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.name.clone(),
            model: self.model.id().to_string(),
            toolkits: self
                .tools
                .toolkits()
                .iter()
                .map(|t| t.name().to_string())
                .collect(),
            add_history_to_context: self.add_history_to_context,
            markdown: self.markdown,
            enable_session_summaries: self.enable_session_summaries,
        }
    }

    pub fn toolkits(&self) -> &ToolSet {
        &self.tools
    }

    /// Session ids this agent has stored, most recent first.
    pub async fn sessions(&self) -> Result<Vec<String>, AgentError> {
        Ok(self.db.list_sessions(&self.name).await?)
    }

    /// Stored history for one session, oldest first.
    pub async fn session_history(&self, session_id: &str) -> Result<Vec<SessionRun>, AgentError> {
        Ok(self.db.history(&self.name, session_id, HISTORY_LIMIT).await?)
    }

    pub(crate) fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}, a helpful assistant for the Agno framework. \
             Use the available tools to look up documentation and search the web \
             when the answer is not already known.",
            self.name
        );
        if self.markdown {
            prompt.push_str(" Format your responses in Markdown.");
        }
        prompt
    }

    /// Run the agent once: build context, call the model, execute any tool
    /// calls it requests (bounded), and persist the exchange.
    ///
    /// When `session_id` is `None` a fresh session is started.
    pub async fn run(
        &self,
        session_id: Option<String>,
        message: &str,
    ) -> Result<RunOutput, AgentError> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut messages = vec![ChatMessage::system(self.system_prompt())];

        if self.add_history_to_context {
            if let Some(summary) = self.db.latest_summary(&self.name, &session_id).await? {
                messages.push(ChatMessage::system(format!(
                    "Summary of the conversation so far:\n{}",
                    summary
                )));
            }
            for run in self.db.history(&self.name, &session_id, HISTORY_LIMIT).await? {
                messages.push(ChatMessage::user(run.user_message));
                messages.push(ChatMessage::assistant(run.assistant_message));
            }
        }

        messages.push(ChatMessage::user(message));

        let tools = self.tools.definitions().await;
        let mut executed = Vec::new();

        // The model may produce text alongside tool calls; the most recent
        // text wins when the round bound cuts the loop short.
        let mut last_content: Option<String> = None;
        for round in 0..=MAX_TOOL_ROUNDS {
            let request = ChatRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let response = self.model.generate(&request).await?;

            if let Some(text) = response.content.as_ref().filter(|t| !t.is_empty()) {
                last_content = Some(text.clone());
            }

            if response.tool_calls.is_empty() || round == MAX_TOOL_ROUNDS {
                break;
            }

            // Replay the model turn faithfully: its text part goes into
            // context next to the function calls it produced.
            if let Some(text) = response.content {
                if !text.is_empty() {
                    messages.push(ChatMessage::assistant(text));
                }
            }

            for call in response.tool_calls {
                tracing::info!(agent = %self.name, tool = %call.name, "executing tool call");

                // Tool failures are fed back to the model instead of
                // aborting the run.
                let output = match self.tools.invoke(&call.name, call.args.clone()).await {
                    Ok(output) => output,
                    Err(e) => format!("Error: {}", e),
                };

                messages.push(ChatMessage::tool_call(call.name.clone(), call.args.clone()));
                messages.push(ChatMessage::tool_result(call.name.clone(), output.clone()));
                executed.push(ExecutedToolCall {
                    tool: call.name,
                    args: call.args,
                    output,
                });
            }
        }

        let content = last_content.ok_or(AgentError::EmptyResponse)?;

        self.db
            .append_run(&self.name, &session_id, message, &content)
            .await?;

        Ok(RunOutput {
            session_id,
            content,
            tool_calls: executed,
        })
    }

    /// Summarize a session with one model call and store the result.
    pub async fn summarize_session(&self, session_id: &str) -> Result<String, AgentError> {
        if !self.enable_session_summaries {
            return Err(AgentError::SummariesDisabled(self.name.clone()));
        }

        let history = self.db.history(&self.name, session_id, 50).await?;
        if history.is_empty() {
            return Err(AgentError::EmptySession(session_id.to_string()));
        }

        let mut transcript = String::new();
        for run in &history {
            transcript.push_str(&format!(
                "User: {}\nAssistant: {}\n",
                run.user_message, run.assistant_message
            ));
        }

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(
                    "Summarize the following conversation in a short paragraph. \
                     Keep concrete facts, decisions, and open questions.",
                ),
                ChatMessage::user(transcript),
            ],
            tools: vec![],
        };

        let response = self.model.generate(&request).await?;
        let summary = response.content.ok_or(AgentError::EmptyResponse)?;

        self.db
            .store_summary(&self.name, session_id, &summary)
            .await?;

        Ok(summary)
    }
}

/// Builder for [`Agent`]. `model` and `db` are required.
pub struct AgentBuilder {
    name: String,
    model: Option<Arc<GeminiClient>>,
    db: Option<SqliteDb>,
    tools: ToolSet,
    add_history_to_context: bool,
    markdown: bool,
    enable_session_summaries: bool,
}

impl AgentBuilder {
    pub fn model(mut self, model: Arc<GeminiClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn db(mut self, db: SqliteDb) -> Self {
        self.db = Some(db);
        self
    }

    /// Attach a toolkit. Order is preserved and meaningful.
    pub fn toolkit(mut self, toolkit: Arc<dyn Toolkit>) -> Self {
        self.tools.push(toolkit);
        self
    }

    pub fn add_history_to_context(mut self, enabled: bool) -> Self {
        self.add_history_to_context = enabled;
        self
    }

    pub fn markdown(mut self, enabled: bool) -> Self {
        self.markdown = enabled;
        self
    }

    pub fn enable_session_summaries(mut self, enabled: bool) -> Self {
        self.enable_session_summaries = enabled;
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        let model = self
            .model
            .ok_or_else(|| AgentError::MissingModel(self.name.clone()))?;
        let db = self
            .db
            .ok_or_else(|| AgentError::MissingDb(self.name.clone()))?;

        Ok(Agent {
            name: self.name,
            model,
            db,
            tools: self.tools,
            add_history_to_context: self.add_history_to_context,
            markdown: self.markdown,
            enable_session_summaries: self.enable_session_summaries,
        })
    }
}
