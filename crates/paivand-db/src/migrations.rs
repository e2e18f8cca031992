//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_paivand_migrations` table. Each migration
//! runs exactly once — if it has already been applied, it is skipped.

use rusqlite::Connection;
use thiserror::Error;

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_messages",
        sql: include_str!("migrations/000_messages.sql"),
    },
    Migration {
        name: "001_attachments",
        sql: include_str!("migrations/001_attachments.sql"),
    },
    Migration {
        name: "002_reactions",
        sql: include_str!("migrations/002_reactions.sql"),
    },
    Migration {
        name: "003_translation_provider_stats",
        sql: include_str!("migrations/003_translation_provider_stats.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending migrations against the given connection.
///
/// Migrations that have already been applied (tracked in
/// `_paivand_migrations`) are skipped. New migrations are applied in order
/// and recorded. Returns the number of migrations applied.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _paivand_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_paivand_migrations_bootstrap".to_string(),
        source: e,
    })?;

    let mut applied = 0;

    for migration in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _paivand_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| MigrationError::ExecutionFailed {
                name: migration.name.to_string(),
                source: e,
            })?;

        tx.execute_batch(migration.sql)
            .map_err(|e| MigrationError::ExecutionFailed {
                name: migration.name.to_string(),
                source: e,
            })?;

        tx.execute(
            "INSERT INTO _paivand_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(|e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        })?;

        tx.commit().map_err(|e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        })?;

        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn run_migrations_on_fresh_db() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, 4);

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM _paivand_migrations", [], |row| {
                row.get(0)
            })
            .expect("should query migration count");
        assert_eq!(count, 4);
    }

    #[test]
    fn run_migrations_idempotent() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        let first = run_migrations(&conn).expect("first run should succeed");
        assert_eq!(first, 4);

        let second = run_migrations(&conn).expect("second run should succeed");
        assert_eq!(second, 0, "no new migrations to apply");
    }

    #[test]
    fn all_tables_exist_after_migrating() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        run_migrations(&conn).expect("migrations should succeed");

        for table in [
            "messages",
            "attachments",
            "reactions",
            "translation_provider_stats",
        ] {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                    [table],
                    |row| row.get(0),
                )
                .expect("should query sqlite_master");
            assert!(exists, "table {table} should exist");
        }
    }
}
