//! Database layer for the call center.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations for the customer, ticket, conversation and
//! knowledge tables. Every table is created through versioned migrations
//! managed by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a single process owns the data and WAL mode
//!   lets concurrent calls read history while another call writes.
//! - **`r2d2` connection pool**: bounded connection reuse across calls.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` and ship with the code that depends on them.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
