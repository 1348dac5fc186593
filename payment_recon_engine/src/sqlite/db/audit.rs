use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{AuditEntry, NewAuditEntry};

pub async fn append(entry: NewAuditEntry, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO audit_log (event_type, entity_id, idempotency_key, payload)
            VALUES ($1, $2, $3, $4);
        "#,
    )
    .bind(entry.event_type)
    .bind(entry.entity_id)
    .bind(entry.idempotency_key)
    .bind(Json(entry.payload))
    .execute(conn)
    .await?;
    Ok(())
}

/// Debugging/dispute-resolution read. The engine itself never calls this.
pub async fn fetch_for_entity(entity_id: &str, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM audit_log WHERE entity_id = $1 ORDER BY id ASC")
        .bind(entity_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
