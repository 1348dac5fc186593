use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{CustomerId, CustomerRecord, CustomerUpdate, NewCustomer},
    traits::ReconError,
};

pub async fn fetch_customer(
    id: &CustomerId,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM customers WHERE customer_id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn insert_if_absent(
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerRecord>, ReconError> {
    let record: Option<CustomerRecord> = sqlx::query_as(
        r#"
            INSERT INTO customers (customer_id, status, status_rank, is_terminal, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(customer.customer_id)
    .bind(customer.status)
    .bind(customer.status_rank)
    .bind(customer.is_terminal)
    .bind(Json(customer.payload))
    .fetch_optional(conn)
    .await?;
    if let Some(rec) = &record {
        debug!("🗃️ Customer [{}] created at status {} with id {}", rec.customer_id, rec.status, rec.id);
    }
    Ok(record)
}

pub async fn apply_status_update(
    update: CustomerUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerRecord>, ReconError> {
    let record = sqlx::query_as(
        r#"
            UPDATE customers SET
                status = $1,
                status_rank = $2,
                is_terminal = $3,
                payload = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE customer_id = $5 AND is_terminal = 0 AND status_rank < $2
            RETURNING *;
        "#,
    )
    .bind(update.status)
    .bind(update.status_rank)
    .bind(update.is_terminal)
    .bind(Json(update.payload))
    .bind(update.customer_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
