use thiserror::Error;

use crate::db_types::{
    CounterpartyId,
    CounterpartyRecord,
    CounterpartyUpdate,
    CustomerId,
    CustomerRecord,
    CustomerUpdate,
    NewCounterparty,
    NewCustomer,
    NewTransaction,
    TransactionId,
    TransactionRecord,
    TransactionUpdate,
};

/// Entity-store contract for reconciliation backends.
///
/// Every operation is a single-entity, single-statement-scope mutation; no call here spans more than one entity and
/// the backend needs no application-level locking. Insert-if-absent calls return the created record, or `None` when
/// the row already existed (a concurrent lazy-create won the race). Conditional updates return the updated record, or
/// `None` when the write-time rank guard did not hold.
#[allow(async_fn_in_trait)]
pub trait ReconciliationBackend: Clone {
    /// The URL of the backing store.
    fn url(&self) -> &str;

    async fn fetch_transaction(&self, tx_id: &TransactionId) -> Result<Option<TransactionRecord>, ReconError>;

    /// Inserts the transaction unless a row for its id already exists.
    async fn insert_transaction(&self, tx: NewTransaction) -> Result<Option<TransactionRecord>, ReconError>;

    /// Applies a status transition as one conditional statement: the row is written only while its stored rank is
    /// strictly below the update's rank and its stored status is not terminal.
    async fn apply_transaction_update(
        &self,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionRecord>, ReconError>;

    async fn fetch_counterparty(&self, id: &CounterpartyId) -> Result<Option<CounterpartyRecord>, ReconError>;

    async fn insert_counterparty(&self, cp: NewCounterparty) -> Result<Option<CounterpartyRecord>, ReconError>;

    async fn apply_counterparty_update(
        &self,
        update: CounterpartyUpdate,
    ) -> Result<Option<CounterpartyRecord>, ReconError>;

    async fn fetch_customer(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, ReconError>;

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Option<CustomerRecord>, ReconError>;

    async fn apply_customer_update(&self, update: CustomerUpdate) -> Result<Option<CustomerRecord>, ReconError>;

    /// Closes the backing store.
    async fn close(&mut self) -> Result<(), ReconError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Malformed webhook payload. {0}")]
    MalformedPayload(String),
}

impl From<sqlx::Error> for ReconError {
    fn from(e: sqlx::Error) -> Self {
        ReconError::DatabaseError(e.to_string())
    }
}
