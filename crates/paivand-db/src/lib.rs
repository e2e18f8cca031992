//! Database layer for the paivand chat server.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table the server touches is created
//! through versioned migrations managed by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the whole deployment is a single small server
//!   for two people; WAL gives concurrent readers with a single writer,
//!   which matches the access pattern (one chat history, many list reads).
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management. Background pipeline tasks and request handlers
//!   each check out their own connection.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` so the schema ships with the code that depends on it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
