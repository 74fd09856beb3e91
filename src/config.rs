//! Configuration management for the Agno agent server.
//!
//! Configuration can be set via environment variables:
//! - `DB_DIR` - Optional. Storage directory for the SQLite database. Defaults to
//!   `/code/data` (Docker volume mount), so set it for local development.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `7777`.
//! - `AGENT_MODEL` - Optional. Gemini model identifier. Defaults to `gemini-2.5-flash-lite`.
//! - `DOCS_MCP_URL` - Optional. Endpoint of the Agno docs MCP server.
//! - `GOOGLE_API_KEY` - Read by the model client on the first request.
//! - `TAVILY_API_KEY` - Read by the Tavily toolkit on each search call.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed filename of the SQLite database inside the storage directory.
pub const DB_FILE_NAME: &str = "agno.db";

/// Default storage directory (container-oriented; mounted as a volume in Docker).
pub const DEFAULT_DB_DIR: &str = "/code/data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to create storage directory {0}: {1}")]
    StorageDir(PathBuf, std::io::Error),
}

/// Server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage directory for the SQLite database
    pub db_dir: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Gemini model identifier
    pub model_id: String,

    /// Endpoint of the Agno documentation MCP server
    pub docs_mcp_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_dir = resolve_db_dir(std::env::var("DB_DIR").ok().as_deref());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "7777".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let model_id =
            std::env::var("AGENT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash-lite".to_string());

        let docs_mcp_url = std::env::var("DOCS_MCP_URL")
            .unwrap_or_else(|_| "https://docs.agno.com/mcp".to_string());

        Ok(Self {
            db_dir,
            host,
            port,
            model_id,
            docs_mcp_url,
        })
    }

    /// Create the storage directory (idempotent) and return the database file path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::StorageDir` if the directory cannot be created
    /// (e.g., permission denied). This is fatal at startup.
    pub fn ensure_storage_dir(&self) -> Result<PathBuf, ConfigError> {
        ensure_storage_dir(&self.db_dir)
            .map_err(|e| ConfigError::StorageDir(self.db_dir.clone(), e))
    }
}

/// Resolve the storage directory from an optional `DB_DIR` value.
pub fn resolve_db_dir(var: Option<&str>) -> PathBuf {
    match var {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DB_DIR),
    }
}

/// Create `dir` (and parents) if missing and return the database file path inside it.
///
/// Repeated calls with the same path succeed.
pub fn ensure_storage_dir(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_dir_defaults_when_unset() {
        assert_eq!(resolve_db_dir(None), PathBuf::from(DEFAULT_DB_DIR));
        assert_eq!(resolve_db_dir(Some("")), PathBuf::from(DEFAULT_DB_DIR));
    }

    #[test]
    fn db_dir_uses_supplied_path() {
        assert_eq!(
            resolve_db_dir(Some("/tmp/agent")),
            PathBuf::from("/tmp/agent")
        );
    }

    #[test]
    fn storage_dir_created_and_path_is_deterministic() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("nested").join("data");

        let db_file = ensure_storage_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(db_file, dir.join(DB_FILE_NAME));
    }

    #[test]
    fn storage_dir_creation_is_idempotent() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("data");

        let first = ensure_storage_dir(&dir).unwrap();
        let second = ensure_storage_dir(&dir).unwrap();

        assert_eq!(first, second);
    }
}
