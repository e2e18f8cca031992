//! SQLite connection pooling for the paivand deployment.
//!
//! The whole server fronts a single conversation, so the pool stays small:
//! a few connections shared between request handlers and the voice
//! pipeline's background persistence. Every connection runs in WAL mode so
//! history reads never block the one write in flight.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Tunables applied to every pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a connection waits on a locked database before failing, in
    /// milliseconds. Request handlers and the voice pipeline can write at
    /// the same moment, so this is never zero.
    pub busy_timeout_ms: u64,

    /// Upper bound on pooled connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 4,
        }
    }
}

/// The SQLite connection pool shared across the workspace.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors raised while building the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// r2d2 could not produce an initial connection, most commonly because
    /// the database path is unwritable.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Puts a fresh connection into the state every paivand connection assumes:
/// WAL journaling, `synchronous = NORMAL` (safe under WAL), enforced foreign
/// keys so attachments and reactions cascade with their message, and the
/// configured busy timeout.
fn configure_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    // journal_mode is the one pragma that answers with the mode actually in
    // effect. In-memory databases stay in "memory" mode, which tests rely on.
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("unexpected journal mode: {journal_mode}")),
        ));
    }

    conn.execute_batch(&format!(
        "PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {busy_timeout_ms};"
    ))
}

/// Builds the pool for `db_path` (`:memory:` works for tests).
///
/// # Errors
///
/// Returns [`PoolError::PoolInit`] when the initial connection cannot be
/// established.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(move |conn| configure_connection(conn, settings.busy_timeout_ms));

    Ok(Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_checkout_carries_the_configured_pragmas() {
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 1_250,
            pool_max_size: 3,
        };
        let pool = create_pool(":memory:", settings).expect("pool should build");
        let conn = pool.get().expect("checkout should succeed");

        let journal: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("journal_mode should be queryable");
        assert!(
            journal == "wal" || journal == "memory",
            "unexpected journal mode: {journal}"
        );

        let synchronous: i64 = conn
            .query_row("PRAGMA synchronous;", [], |row| row.get(0))
            .expect("synchronous should be queryable");
        assert_eq!(synchronous, 1, "synchronous should be NORMAL");

        let foreign_keys: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("foreign_keys should be queryable");
        assert_eq!(foreign_keys, 1);

        let busy_timeout: i64 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("busy_timeout should be queryable");
        assert_eq!(busy_timeout, 1_250);

        assert_eq!(pool.max_size(), 3);
    }

    #[test]
    fn defaults_fit_a_single_conversation_server() {
        let settings = DbRuntimeSettings::default();
        assert_eq!(settings.busy_timeout_ms, 5_000);
        assert_eq!(settings.pool_max_size, 4);
    }

    #[test]
    fn single_connection_pool_reuses_its_checkout() {
        // With max_size 1 every `:memory:` checkout is the same connection,
        // the setup all in-memory test fixtures depend on.
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 500,
            pool_max_size: 1,
        };
        let pool = create_pool(":memory:", settings).expect("pool should build");

        pool.get()
            .expect("first checkout should succeed")
            .execute_batch("CREATE TABLE marker (id INTEGER PRIMARY KEY);")
            .expect("create should succeed");

        let count: i64 = pool
            .get()
            .expect("second checkout should succeed")
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'marker'",
                [],
                |row| row.get(0),
            )
            .expect("query should succeed");
        assert_eq!(count, 1, "state should survive across checkouts");
    }
}
