//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::{AgentError, AgentInfo, RunOutput};
use crate::os::{AgentOs, OsError};

use super::types::*;

/// Shared application state.
pub struct AppState {
    pub os: Arc<AgentOs>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build the application router over a hosting object.
pub fn router(os: Arc<AgentOs>) -> Router {
    let state = Arc::new(AppState { os });

    Router::new()
        .route("/api/health", get(health))
        .route("/api/agents", get(list_agents))
        .route("/api/agents/:name/runs", post(create_run))
        .route("/api/agents/:name/tools", get(list_tools))
        .route("/api/agents/:name/sessions", get(list_sessions))
        .route("/api/agents/:name/sessions/:session_id", get(get_session))
        .route(
            "/api/agents/:name/sessions/:session_id/summary",
            post(create_summary),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn os_error(e: OsError) -> ApiError {
    match e {
        OsError::UnknownAgent(_) => error(StatusCode::NOT_FOUND, e.to_string()),
        OsError::NoAgents => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn agent_error(e: AgentError) -> ApiError {
    match e {
        AgentError::SummariesDisabled(_) | AgentError::EmptySession(_) => {
            error(StatusCode::BAD_REQUEST, e.to_string())
        }
        other => {
            tracing::error!("agent run failed: {}", other);
            error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Vec<AgentInfo>> {
    Json(state.os.agents().iter().map(|a| a.info()).collect())
}

async fn create_run(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunOutput>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    let agent = state.os.get_agent(&name).map_err(os_error)?;
    let output = agent
        .run(request.session_id, &request.message)
        .await
        .map_err(agent_error)?;

    Ok(Json(output))
}

async fn list_tools(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ToolkitTools>>, ApiError> {
    let agent = state.os.get_agent(&name).map_err(os_error)?;

    let mut toolkits = Vec::new();
    for toolkit in agent.toolkits().toolkits() {
        match toolkit.tools().await {
            Ok(tools) => toolkits.push(ToolkitTools {
                toolkit: toolkit.name().to_string(),
                tools,
                error: None,
            }),
            Err(e) => toolkits.push(ToolkitTools {
                toolkit: toolkit.name().to_string(),
                tools: vec![],
                error: Some(e.to_string()),
            }),
        }
    }

    Ok(Json(toolkits))
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let agent = state.os.get_agent(&name).map_err(os_error)?;
    let sessions = agent.sessions().await.map_err(agent_error)?;

    Ok(Json(SessionListResponse { sessions }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path((name, session_id)): Path<(String, String)>,
) -> Result<Json<SessionHistoryResponse>, ApiError> {
    let agent = state.os.get_agent(&name).map_err(os_error)?;
    let runs = agent
        .session_history(&session_id)
        .await
        .map_err(agent_error)?;

    Ok(Json(SessionHistoryResponse { session_id, runs }))
}

async fn create_summary(
    State(state): State<Arc<AppState>>,
    Path((name, session_id)): Path<(String, String)>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let agent = state.os.get_agent(&name).map_err(os_error)?;
    let summary = agent
        .summarize_session(&session_id)
        .await
        .map_err(agent_error)?;

    Ok(Json(SummaryResponse {
        session_id,
        summary,
    }))
}
