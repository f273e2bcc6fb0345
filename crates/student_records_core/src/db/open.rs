//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by gateway behavior.
//! - Trigger schema migrations before returning a usable connection.
//! - Install the per-connection major-assignment policy.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::{MajorAssignment, StoreConfig};
use log::{debug, error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

// TEMP triggers live per connection, so the policy follows the config of
// whoever opened the connection rather than the database file.
const REQUIRE_MAJOR_SQL: &str = "
CREATE TEMP TRIGGER IF NOT EXISTS students_require_major_on_insert
BEFORE INSERT ON students
WHEN NEW.major_id IS NULL
BEGIN
    SELECT RAISE(ABORT, 'students.major_id is required');
END;
CREATE TEMP TRIGGER IF NOT EXISTS students_require_major_on_update
BEFORE UPDATE OF major_id ON students
WHEN NEW.major_id IS NULL
BEGIN
    SELECT RAISE(ABORT, 'students.major_id is required');
END;";

/// Opens a SQLite database file with default settings and applies all
/// pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with(path, &StoreConfig::default())
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Switches the file to WAL journal mode.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with(path: impl AsRef<Path>, config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let bootstrap = enable_wal(&conn).and_then(|()| bootstrap_connection(&mut conn, config));
    match bootstrap {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode=file duration_ms={} major_assignment={:?}",
                started_at.elapsed().as_millis(),
                config.major_assignment
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens an in-memory SQLite database with default settings.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_in_memory_with(&StoreConfig::default())
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory_with(config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, config) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode=memory duration_ms={} major_assignment={:?}",
                started_at.elapsed().as_millis(),
                config.major_assignment
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens one more connection to an already bootstrapped database file.
///
/// Used for per-call sessions, so it skips the WAL switch and logs at
/// `debug` only.
pub(crate) fn open_session_connection(path: &Path, config: &StoreConfig) -> DbResult<Connection> {
    let mut conn = Connection::open(path)?;
    if let Err(err) = bootstrap_connection(&mut conn, config) {
        error!(
            "event=session_open module=db status=error error_code=db_bootstrap_failed error={}",
            err
        );
        return Err(err);
    }
    debug!("event=session_open module=db status=ok mode=file");
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection, config: &StoreConfig) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(config.busy_timeout())?;
    apply_migrations(conn)?;
    install_major_assignment(conn, config.major_assignment)?;
    Ok(())
}

fn enable_wal(conn: &Connection) -> DbResult<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!("event=db_journal_mode module=db status=ok journal_mode={mode}");
    Ok(())
}

fn install_major_assignment(conn: &Connection, policy: MajorAssignment) -> DbResult<()> {
    match policy {
        MajorAssignment::Required => conn.execute_batch(REQUIRE_MAJOR_SQL)?,
        MajorAssignment::Optional => {}
    }
    Ok(())
}
