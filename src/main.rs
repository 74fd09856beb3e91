//! agno-agent - HTTP Server Entry Point
//!
//! Composes the agent (model, database, toolkits) and serves it.

use std::sync::Arc;

use agno_agent::tools::{McpTools, TavilyTools};
use agno_agent::{Agent, AgentOs, Config, GeminiClient, SqliteDb};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present; deployments set environment variables directly
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agno_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration and set up storage
    let config = Config::from_env()?;
    let db_file = config.ensure_storage_dir()?;
    info!(
        "Loaded configuration: model={}, db={}",
        config.model_id,
        db_file.display()
    );

    let db = SqliteDb::open(db_file).await?;
    let model = Arc::new(GeminiClient::new(config.model_id.clone()));

    // Create the agent. TavilyTools reads TAVILY_API_KEY from the
    // environment; the MCP toolkit connects lazily on first use.
    let agent = Agent::builder("Agno Agent")
        .model(model)
        .db(db)
        .toolkit(Arc::new(McpTools::new("agno_docs", config.docs_mcp_url.clone())))
        .toolkit(Arc::new(TavilyTools::new()))
        .add_history_to_context(true)
        .markdown(true)
        .enable_session_summaries(true)
        .build()?;

    // Create the hosting object and serve
    let agent_os = Arc::new(AgentOs::new(vec![Arc::new(agent)])?);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    agent_os.serve(addr).await
}
