//! `SqliteDatabase` is the concrete SQLite backend for the reconciliation engine.
//!
//! It implements all three backend traits ([`ReconciliationBackend`], [`IdempotencyLedger`], [`AuditLog`]) on top of
//! a connection pool, delegating the SQL to the functions in [`super::db`].
use std::fmt::Debug;

use sqlx::SqlitePool;

use super::db::{audit, counterparties, customers, ledger, new_pool, transactions};
use crate::{
    db_types::{
        AuditEntry,
        CounterpartyId,
        CounterpartyRecord,
        CounterpartyUpdate,
        CustomerId,
        CustomerRecord,
        CustomerUpdate,
        LedgerEntry,
        NewAuditEntry,
        NewCounterparty,
        NewCustomer,
        NewTransaction,
        TransactionId,
        TransactionRecord,
        TransactionUpdate,
    },
    traits::{AuditLog, IdempotencyLedger, ReconError, ReconciliationBackend},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, ReconError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Audit entries for one entity, oldest first. Debugging aid only.
    pub async fn audit_entries_for(&self, entity_id: &str) -> Result<Vec<AuditEntry>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit::fetch_for_entity(entity_id, &mut conn).await?;
        Ok(entries)
    }

    pub async fn ledger_entry(&self, key: &str) -> Result<Option<LedgerEntry>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        let entry = ledger::fetch_entry(key, &mut conn).await?;
        Ok(entry)
    }
}

impl ReconciliationBackend for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_transaction(&self, tx_id: &TransactionId) -> Result<Option<TransactionRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        let record = transactions::fetch_transaction(tx_id, &mut conn).await?;
        Ok(record)
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> Result<Option<TransactionRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert_if_absent(tx, &mut conn).await
    }

    async fn apply_transaction_update(
        &self,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        transactions::apply_status_update(update, &mut conn).await
    }

    async fn fetch_counterparty(&self, id: &CounterpartyId) -> Result<Option<CounterpartyRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        let record = counterparties::fetch_counterparty(id, &mut conn).await?;
        Ok(record)
    }

    async fn insert_counterparty(&self, cp: NewCounterparty) -> Result<Option<CounterpartyRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        counterparties::insert_if_absent(cp, &mut conn).await
    }

    async fn apply_counterparty_update(
        &self,
        update: CounterpartyUpdate,
    ) -> Result<Option<CounterpartyRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        counterparties::apply_status_update(update, &mut conn).await
    }

    async fn fetch_customer(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        let record = customers::fetch_customer(id, &mut conn).await?;
        Ok(record)
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Option<CustomerRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        customers::insert_if_absent(customer, &mut conn).await
    }

    async fn apply_customer_update(&self, update: CustomerUpdate) -> Result<Option<CustomerRecord>, ReconError> {
        let mut conn = self.pool.acquire().await?;
        customers::apply_status_update(update, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), ReconError> {
        self.pool.close().await;
        Ok(())
    }
}

impl IdempotencyLedger for SqliteDatabase {
    async fn has_processed(&self, idempotency_key: &str) -> Result<bool, ReconError> {
        let mut conn = self.pool.acquire().await?;
        let seen = ledger::key_exists(idempotency_key, &mut conn).await?;
        Ok(seen)
    }

    async fn record_processed(
        &self,
        idempotency_key: &str,
        event_type: &str,
        entity_id: &str,
    ) -> Result<(), ReconError> {
        let mut conn = self.pool.acquire().await?;
        ledger::insert_key(idempotency_key, event_type, entity_id, &mut conn).await
    }
}

impl AuditLog for SqliteDatabase {
    async fn append_event(&self, entry: NewAuditEntry) -> Result<(), ReconError> {
        let mut conn = self.pool.acquire().await?;
        audit::append(entry, &mut conn).await?;
        Ok(())
    }
}
