use sqlx::SqliteConnection;

use crate::{db_types::LedgerEntry, traits::ReconError};

pub async fn key_exists(key: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM idempotency_ledger WHERE idempotency_key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Records the key. `ON CONFLICT DO NOTHING` makes a lost race against a concurrent delivery of the same key a
/// silent no-op, which is exactly the semantics the ledger promises.
pub async fn insert_key(
    key: &str,
    event_type: &str,
    entity_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), ReconError> {
    sqlx::query(
        r#"
            INSERT INTO idempotency_ledger (idempotency_key, event_type, entity_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (idempotency_key) DO NOTHING;
        "#,
    )
    .bind(key)
    .bind(event_type)
    .bind(entity_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_entry(key: &str, conn: &mut SqliteConnection) -> Result<Option<LedgerEntry>, sqlx::Error> {
    let entry = sqlx::query_as("SELECT * FROM idempotency_ledger WHERE idempotency_key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}
