//! SQLite-backed session storage.
//!
//! A single database file (`agno.db` inside the storage directory) holds the
//! conversation history and session summaries for every agent served by this
//! process. The schema is created idempotently on open.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS session_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent TEXT NOT NULL,
    session_id TEXT NOT NULL,
    user_message TEXT NOT NULL,
    assistant_message TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_session ON session_runs(agent, session_id, id);

CREATE TABLE IF NOT EXISTS session_summaries (
    agent TEXT NOT NULL,
    session_id TEXT NOT NULL,
    summary TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (agent, session_id)
);
"#;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One user/assistant exchange inside a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRun {
    pub session_id: String,
    pub user_message: String,
    pub assistant_message: String,
    pub created_at: String,
}

/// Handle to the file-backed session store.
///
/// Cheap to clone; all clones share one connection. Queries run on the
/// blocking thread pool so the async runtime is never stalled by SQLite.
#[derive(Clone)]
pub struct SqliteDb {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDb {
    /// Open (or create) the database at `db_file` and apply the schema.
    pub async fn open(db_file: PathBuf) -> Result<Self, DbError> {
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_file)?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, rusqlite::Error>(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Record one completed exchange for a session.
    pub async fn append_run(
        &self,
        agent: &str,
        session_id: &str,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<(), DbError> {
        let conn = self.conn.clone();
        let (agent, session_id) = (agent.to_string(), session_id.to_string());
        let (user_message, assistant_message) =
            (user_message.to_string(), assistant_message.to_string());

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO session_runs (agent, session_id, user_message, assistant_message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    agent,
                    session_id,
                    user_message,
                    assistant_message,
                    Utc::now().to_rfc3339()
                ],
            )?;
            Ok::<_, rusqlite::Error>(())
        })
        .await??;

        Ok(())
    }

    /// Load the most recent exchanges for a session, oldest first.
    pub async fn history(
        &self,
        agent: &str,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionRun>, DbError> {
        let conn = self.conn.clone();
        let (agent, session_id) = (agent.to_string(), session_id.to_string());

        let runs = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT session_id, user_message, assistant_message, created_at
                 FROM (SELECT * FROM session_runs
                       WHERE agent = ?1 AND session_id = ?2
                       ORDER BY id DESC LIMIT ?3)
                 ORDER BY id ASC",
            )?;

            let rows = stmt
                .query_map(params![agent, session_id, limit as i64], |row| {
                    Ok(SessionRun {
                        session_id: row.get(0)?,
                        user_message: row.get(1)?,
                        assistant_message: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok::<_, rusqlite::Error>(rows)
        })
        .await??;

        Ok(runs)
    }

    /// List session ids for an agent, most recently active first.
    pub async fn list_sessions(&self, agent: &str) -> Result<Vec<String>, DbError> {
        let conn = self.conn.clone();
        let agent = agent.to_string();

        let sessions = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT session_id FROM session_runs
                 WHERE agent = ?1
                 GROUP BY session_id
                 ORDER BY MAX(id) DESC",
            )?;

            let rows = stmt
                .query_map(params![agent], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            Ok::<_, rusqlite::Error>(rows)
        })
        .await??;

        Ok(sessions)
    }

    /// Store (or replace) the summary for a session.
    pub async fn store_summary(
        &self,
        agent: &str,
        session_id: &str,
        summary: &str,
    ) -> Result<(), DbError> {
        let conn = self.conn.clone();
        let (agent, session_id, summary) =
            (agent.to_string(), session_id.to_string(), summary.to_string());

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO session_summaries (agent, session_id, summary, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![agent, session_id, summary, Utc::now().to_rfc3339()],
            )?;
            Ok::<_, rusqlite::Error>(())
        })
        .await??;

        Ok(())
    }

    /// Fetch the stored summary for a session, if any.
    pub async fn latest_summary(
        &self,
        agent: &str,
        session_id: &str,
    ) -> Result<Option<String>, DbError> {
        let conn = self.conn.clone();
        let (agent, session_id) = (agent.to_string(), session_id.to_string());

        let summary = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.query_row(
                "SELECT summary FROM session_summaries WHERE agent = ?1 AND session_id = ?2",
                params![agent, session_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
        })
        .await??;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_db() -> (tempfile::TempDir, SqliteDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDb::open(dir.path().join("agno.db")).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agno.db");
        let _db = SqliteDb::open(path.clone()).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn runs_round_trip_in_order() {
        let (_dir, db) = temp_db().await;

        db.append_run("agno", "s1", "hello", "hi there").await.unwrap();
        db.append_run("agno", "s1", "what's agno?", "a framework").await.unwrap();
        db.append_run("agno", "s2", "other session", "ok").await.unwrap();

        let history = db.history("agno", "s1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user_message, "hello");
        assert_eq!(history[1].assistant_message, "a framework");

        let sessions = db.list_sessions("agno").await.unwrap();
        assert_eq!(sessions, vec!["s2".to_string(), "s1".to_string()]);
    }

    #[tokio::test]
    async fn history_limit_keeps_most_recent() {
        let (_dir, db) = temp_db().await;

        for i in 0..5 {
            db.append_run("agno", "s1", &format!("q{}", i), &format!("a{}", i))
                .await
                .unwrap();
        }

        let history = db.history("agno", "s1", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user_message, "q3");
        assert_eq!(history[1].user_message, "q4");
    }

    #[tokio::test]
    async fn summary_is_replaced_on_update() {
        let (_dir, db) = temp_db().await;

        assert!(db.latest_summary("agno", "s1").await.unwrap().is_none());

        db.store_summary("agno", "s1", "first").await.unwrap();
        db.store_summary("agno", "s1", "second").await.unwrap();

        assert_eq!(
            db.latest_summary("agno", "s1").await.unwrap().as_deref(),
            Some("second")
        );
    }
}
