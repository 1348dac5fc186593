//! # Low-level SQLite queries.
//!
//! Plain functions over a `&mut SqliteConnection` rather than stateful structs. Callers acquire a connection from the
//! pool (or open a transaction and pass `&mut *tx`) and call straight through.

use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod audit;
pub mod counterparties;
pub mod customers;
pub mod ledger;
pub mod transactions;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
