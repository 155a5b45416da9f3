//! # SQLite database methods
//!
//! "Low-level" SQLite interactions, maintained as simple functions (rather than stateful structs)
//! that accept a `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or
//! open a transaction and pass `&mut *tx` so that several calls commit or roll back together.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod customers;
pub mod drivers;
pub mod orders;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/icebox.db";

pub fn db_url() -> String {
    let result = env::var("ICEBOX_DATABASE_URL").unwrap_or_else(|_| {
        info!("ICEBOX_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Opens a connection pool with explicit connect options. The journal mode is pinned to `DELETE`
/// so that a write committed on one pooled connection is visible to the next read on any other
/// connection; with WAL snapshots, pooled readers can serve stale rows for several calls after a
/// commit.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
