//! The hosting object: owns the agents and exposes the servable app.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::agent::Agent;
use crate::api;

#[derive(Debug, Error)]
pub enum OsError {
    #[error("AgentOs requires at least one agent")]
    NoAgents,

    #[error("No agent named {0}")]
    UnknownAgent(String),
}

/// Composition root over one or more agents.
///
/// Owns its agents for the lifetime of the process; there is no teardown.
pub struct AgentOs {
    agents: Vec<Arc<Agent>>,
}

impl AgentOs {
    /// Create the hosting object. An empty agent collection is rejected:
    /// serving zero agents is always a configuration mistake.
    pub fn new(agents: Vec<Arc<Agent>>) -> Result<Self, OsError> {
        if agents.is_empty() {
            return Err(OsError::NoAgents);
        }
        Ok(Self { agents })
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    pub fn get_agent(&self, name: &str) -> Result<Arc<Agent>, OsError> {
        self.agents
            .iter()
            .find(|a| a.name() == name)
            .cloned()
            .ok_or_else(|| OsError::UnknownAgent(name.to_string()))
    }

    /// Build the servable application.
    pub fn get_app(self: Arc<Self>) -> Router {
        api::router(self)
    }

    /// Bind `addr` and serve the application until the process exits.
    pub async fn serve(self: Arc<Self>, addr: String) -> anyhow::Result<()> {
        let app = Arc::clone(&self).get_app();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
