//! # Agno Agent
//!
//! Self-hosted serving stack for a single documentation/search agent:
//! a Gemini model client, SQLite-backed session storage, a remote MCP
//! toolkit for the Agno docs, and Tavily web search, composed into an
//! HTTP application.
//!
//! ## Composition
//!
//! ```text
//!   Config (env)
//!      │
//!      ▼
//!   SqliteDb ── GeminiClient ── [McpTools, TavilyTools]
//!      │             │                 │
//!      └─────────────┴────────┬────────┘
//!                             ▼
//!                           Agent
//!                             │
//!                             ▼
//!                          AgentOs ──► axum app
//! ```
//!
//! ## Modules
//! - `config`: environment variables and storage directory setup
//! - `db`: session history and summaries in `agno.db`
//! - `llm`: Gemini client and chat types
//! - `tools`: toolkit trait plus the MCP and Tavily adapters
//! - `agent`: validated agent composition and the run path
//! - `os`: hosting object and server entry point
//! - `api`: HTTP routes over the hosting object

pub mod agent;
pub mod api;
pub mod config;
pub mod db;
pub mod llm;
pub mod os;
pub mod tools;

pub use agent::{Agent, AgentBuilder};
pub use config::Config;
pub use db::SqliteDb;
pub use llm::GeminiClient;
pub use os::AgentOs;
