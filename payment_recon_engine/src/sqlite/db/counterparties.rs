use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{CounterpartyId, CounterpartyRecord, CounterpartyUpdate, NewCounterparty},
    traits::ReconError,
};

pub async fn fetch_counterparty(
    id: &CounterpartyId,
    conn: &mut SqliteConnection,
) -> Result<Option<CounterpartyRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM counterparties WHERE counterparty_id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Inserts the counterparty, returning `None` if a row for the id already exists.
pub async fn insert_if_absent(
    cp: NewCounterparty,
    conn: &mut SqliteConnection,
) -> Result<Option<CounterpartyRecord>, ReconError> {
    let record: Option<CounterpartyRecord> = sqlx::query_as(
        r#"
            INSERT INTO counterparties (
                counterparty_id,
                kind,
                status,
                status_rank,
                is_terminal,
                payment_methods,
                payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (counterparty_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(cp.counterparty_id)
    .bind(cp.kind)
    .bind(cp.status)
    .bind(cp.status_rank)
    .bind(cp.is_terminal)
    .bind(Json(cp.payment_methods))
    .bind(Json(cp.payload))
    .fetch_optional(conn)
    .await?;
    if let Some(rec) = &record {
        debug!("🗃️ Counterparty [{}] created at status {} with id {}", rec.counterparty_id, rec.status, rec.id);
    }
    Ok(record)
}

/// Conditional status transition. Same write-time rank guard as for transactions; the associated payment-method list
/// is replaced wholesale since the processor always sends the complete ordered list.
pub async fn apply_status_update(
    update: CounterpartyUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<CounterpartyRecord>, ReconError> {
    let record = sqlx::query_as(
        r#"
            UPDATE counterparties SET
                status = $1,
                status_rank = $2,
                is_terminal = $3,
                payment_methods = $4,
                payload = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE counterparty_id = $6 AND is_terminal = 0 AND status_rank < $2
            RETURNING *;
        "#,
    )
    .bind(update.status)
    .bind(update.status_rank)
    .bind(update.is_terminal)
    .bind(Json(update.payment_methods))
    .bind(Json(update.payload))
    .bind(update.counterparty_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
