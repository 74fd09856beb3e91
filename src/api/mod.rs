//! HTTP API for the agent host.
//!
//! ## Endpoints
//!
//! - `GET  /api/health` - Health check
//! - `GET  /api/agents` - List agent configurations
//! - `POST /api/agents/:name/runs` - Run an agent with a message
//! - `GET  /api/agents/:name/tools` - List discovered tool descriptors
//! - `GET  /api/agents/:name/sessions` - List session ids
//! - `GET  /api/agents/:name/sessions/:session_id` - Session history
//! - `POST /api/agents/:name/sessions/:session_id/summary` - Summarize a session

mod routes;
pub mod types;

pub use routes::{router, AppState};
