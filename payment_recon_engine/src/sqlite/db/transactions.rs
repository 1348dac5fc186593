use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewTransaction, TransactionId, TransactionRecord, TransactionUpdate},
    traits::ReconError,
};

pub async fn fetch_transaction(
    tx_id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<TransactionRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM transactions WHERE tx_id = $1")
        .bind(tx_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Inserts the transaction, returning `None` if a row for the id already exists. Lazy creation races with the
/// order-placement write path and with concurrent duplicate deliveries, so the uniqueness conflict is absorbed here
/// rather than surfaced.
pub async fn insert_if_absent(
    tx: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Option<TransactionRecord>, ReconError> {
    let record: Option<TransactionRecord> = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                tx_id,
                movement_type,
                status,
                status_rank,
                is_terminal,
                source,
                destination,
                quote_id,
                reference,
                created_at,
                completed_at,
                payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (tx_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(tx.tx_id)
    .bind(tx.movement_type)
    .bind(tx.status)
    .bind(tx.status_rank)
    .bind(tx.is_terminal)
    .bind(Json(tx.source))
    .bind(Json(tx.destination))
    .bind(tx.quote_id)
    .bind(tx.reference)
    .bind(tx.created_at)
    .bind(tx.completed_at)
    .bind(Json(tx.payload))
    .fetch_optional(conn)
    .await?;
    if let Some(rec) = &record {
        debug!("🗃️ Transaction [{}] created at status {} with id {}", rec.tx_id, rec.status, rec.id);
    }
    Ok(record)
}

/// Applies the status transition as a single conditional statement. The rank guard holds at write time, not merely at
/// read time: a row that a concurrent worker has already advanced past the update's rank is left untouched and `None`
/// is returned. `completed_at` is only ever set once; a set value is never overwritten.
pub async fn apply_status_update(
    update: TransactionUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<TransactionRecord>, ReconError> {
    let record = sqlx::query_as(
        r#"
            UPDATE transactions SET
                status = $1,
                status_rank = $2,
                is_terminal = $3,
                completed_at = COALESCE(completed_at, $4),
                payload = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE tx_id = $6 AND is_terminal = 0 AND status_rank < $2
            RETURNING *;
        "#,
    )
    .bind(update.status)
    .bind(update.status_rank)
    .bind(update.is_terminal)
    .bind(update.completed_at)
    .bind(Json(update.payload))
    .bind(update.tx_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
