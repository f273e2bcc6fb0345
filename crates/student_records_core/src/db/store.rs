//! Session provider over a configured SQLite store.
//!
//! # Responsibility
//! - Bootstrap the schema once when the store is opened.
//! - Hand out one scoped [`Session`] per gateway call.
//!
//! # Invariants
//! - A session is used by exactly one caller until it is dropped.
//! - File stores give every session its own connection; memory stores
//!   serialize sessions on the single connection that owns the data.

use super::open::{open_db_in_memory_with, open_db_with, open_session_connection};
use super::DbResult;
use crate::config::StoreConfig;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

enum Backend {
    File(PathBuf),
    Memory(Mutex<Connection>),
}

/// Opened store. Shareable across threads by reference.
pub struct Store {
    config: StoreConfig,
    backend: Backend,
}

/// Exclusive unit-of-work handle on the store.
///
/// Dereferences to a bootstrapped [`Connection`]; dropping it releases the
/// connection (file stores) or the shared lock (memory stores).
pub enum Session<'store> {
    Dedicated(Connection),
    Shared(MutexGuard<'store, Connection>),
}

impl Deref for Session<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            Self::Dedicated(conn) => conn,
            Self::Shared(guard) => guard,
        }
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        match self {
            Self::Dedicated(conn) => conn,
            Self::Shared(guard) => guard,
        }
    }
}

impl Store {
    /// Opens the store described by `config` and applies pending migrations.
    pub fn open(config: StoreConfig) -> DbResult<Self> {
        let backend = match config.db_path.clone() {
            Some(path) => {
                // Bootstrap connection only; sessions reopen the file.
                drop(open_db_with(&path, &config)?);
                Backend::File(path)
            }
            None => Backend::Memory(Mutex::new(open_db_in_memory_with(&config)?)),
        };
        Ok(Self { config, backend })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    pub fn open_file(path: impl Into<PathBuf>) -> DbResult<Self> {
        Self::open(StoreConfig::file(path))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Acquires a session for exclusive use by one gateway call.
    pub fn session(&self) -> DbResult<Session<'_>> {
        match &self.backend {
            Backend::File(path) => {
                open_session_connection(path, &self.config).map(Session::Dedicated)
            }
            Backend::Memory(conn) => Ok(Session::Shared(
                conn.lock().unwrap_or_else(PoisonError::into_inner),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::config::StoreConfig;

    #[test]
    fn memory_sessions_share_data() {
        let store = Store::open_in_memory().unwrap();
        store
            .session()
            .unwrap()
            .execute("INSERT INTO majors (major_name) VALUES ('Physics');", [])
            .unwrap();

        let count: i64 = store
            .session()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM majors;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn separate_memory_stores_are_isolated() {
        let first = Store::open_in_memory().unwrap();
        let second = Store::open_in_memory().unwrap();
        first
            .session()
            .unwrap()
            .execute("INSERT INTO majors (major_name) VALUES ('Physics');", [])
            .unwrap();

        let count: i64 = second
            .session()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM majors;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn file_sessions_see_committed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreConfig::file(dir.path().join("records.sqlite3"))).unwrap();

        store
            .session()
            .unwrap()
            .execute("INSERT INTO majors (major_name) VALUES ('Chemistry');", [])
            .unwrap();

        let name: String = store
            .session()
            .unwrap()
            .query_row("SELECT major_name FROM majors;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Chemistry");
    }
}
