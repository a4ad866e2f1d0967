//! Connection lifecycle: one `rusqlite::Connection` behind a `Mutex`, wrapped
//! in `tokio::task::block_in_place` everywhere it's touched so the
//! synchronous sqlite calls never block the async executor's scheduling.
//! This is also what linearises writes per task (spec.md §5).

use crate::error::StoreError;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct Store {
    pub(crate) db: Arc<Mutex<rusqlite::Connection>>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id),
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    instructions TEXT NOT NULL,
    output_format TEXT NOT NULL,
    tool_servers_json TEXT NOT NULL DEFAULT '[]',
    env_variables_json TEXT NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_agents_project ON agents(project_id);

CREATE TABLE IF NOT EXISTS data_sources (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id),
    name TEXT NOT NULL,
    kind_json TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_data_sources_project ON data_sources(project_id);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    agent_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    metadata_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_agent_created ON tasks(agent_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_tasks_status_updated ON tasks(status, updated_at);
"#;

impl Store {
    /// Opens (or creates) the database at `path` and ensures the schema
    /// exists. Safe to call repeatedly against the same path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path.as_ref())?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, for tests that don't need to survive a restart.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Clones the connection handle for use inside a `block_in_place`
    /// closure, which cannot borrow `self`.
    pub(crate) fn conn(&self) -> Arc<Mutex<rusqlite::Connection>> {
        self.db.clone()
    }
}
