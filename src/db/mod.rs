mod schema;
pub mod lenses;
pub mod photos;
pub mod sessions;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

pub use lenses::LensRecord;
pub use schema::{MIGRATIONS, SCHEMA};
pub use sessions::{DatabaseOverview, DeleteCounts, SessionUpdate};

use crate::models::{PhotoRecord, Session};
use crate::stats::PhotoSource;

/// SQLite store for sessions, photos and the lens registry.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        for migration in MIGRATIONS {
            if let Err(e) = self.conn.execute(migration, []) {
                debug!("Migration skipped ({}): {}", e, migration);
            }
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl PhotoSource for Database {
    fn all_sessions(&self) -> Result<Vec<Session>> {
        self.list_sessions(None, None)
    }

    fn photos_for_sessions(&self, session_ids: &[i64]) -> Result<Vec<PhotoRecord>> {
        self.get_photos_for_sessions(session_ids)
    }
}

/// `?, ?, ?` for an `IN (...)` clause.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
