//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::db::SessionRun;
use crate::tools::ToolDescriptor;

/// Body of `POST /api/agents/:name/runs`.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub message: String,
    /// Continue an existing session; omitted starts a new one.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub runs: Vec<SessionRun>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub session_id: String,
    pub summary: String,
}

/// Tools exposed by one toolkit, or the discovery error if it is unreachable.
#[derive(Debug, Serialize)]
pub struct ToolkitTools {
    pub toolkit: String,
    pub tools: Vec<ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
