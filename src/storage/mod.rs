// src/storage/mod.rs - Database gateway

pub mod schema;
pub mod store;
pub mod store_server;
pub mod usage;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::infra::config::StorageConfig;
use crate::infra::errors::{StoreError, StoreResult};

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    InMemory,
}

/// Opens (or creates) the database and brings its schema up to date.
///
/// Cheap to construct; nothing touches the disk until [`Database::open`].
#[derive(Debug, Clone)]
pub struct Database {
    location: Location,
}

impl Database {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
        }
    }

    /// In-memory database (for testing).
    pub fn in_memory() -> Self {
        Self {
            location: Location::InMemory,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        if config.in_memory {
            Self::in_memory()
        } else {
            Self::at_path(config.resolved_path())
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Open a connection with both tables guaranteed to exist.
    pub fn open(&self) -> StoreResult<store::Store> {
        let conn = match &self.location {
            Location::File(path) => open_file(path)?,
            Location::InMemory => Connection::open_in_memory().map_err(|e| {
                StoreError::unavailable(format!("Failed to open in-memory database: {e}"))
            })?,
        };

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| StoreError::unavailable(format!("Failed to set pragmas: {e}")))?;

        schema::run_migrations(&conn).map_err(as_unavailable)?;
        schema::validate(&conn)?;

        Ok(store::Store::new(conn))
    }
}

fn open_file(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::unavailable(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let conn = Connection::open(path).map_err(|e| {
        StoreError::unavailable(format!("Failed to open database {}: {e}", path.display()))
    })?;

    // Enable WAL mode for better concurrent performance. This is also the
    // first statement that actually reads the file, so a non-database file
    // fails here.
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .map_err(|e| StoreError::unavailable(format!("Failed to set pragmas: {e}")))?;

    Ok(conn)
}

/// A schema that cannot be brought up is as good as no store at all.
fn as_unavailable(err: StoreError) -> StoreError {
    match err {
        StoreError::Transaction(e) => {
            StoreError::unavailable(format!("Schema migration failed: {e}"))
        }
        other => other,
    }
}
