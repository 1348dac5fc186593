use std::fmt::{Debug, Display};

use log::*;
use serde::Serialize;

use crate::{
    db_types::{
        CounterpartyUpdate,
        CustomerUpdate,
        NewCounterparty,
        NewCustomer,
        NewTransaction,
        TransactionRecord,
        TransactionStatus,
        TransactionUpdate,
    },
    events::{EventProducers, TransactionCompletedEvent},
    priority::StatusPriorities,
    traits::{AuditLog, IdempotencyLedger, ReconError, ReconciliationBackend},
    webhook::{CounterpartyEventPayload, CustomerEventPayload, TransactionEventPayload, WebhookEnvelope, WebhookEvent},
};

//--------------------------------------     ReconOutcome     ---------------------------------------------------------
/// What one delivery did to local state. Skips are normal outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconOutcome {
    /// No local record existed; one was created at the reported status.
    Created,
    /// The record advanced to the reported status.
    Updated,
    /// The reported status does not outrank the stored one. Stale or duplicate-in-effect delivery.
    SkippedStale,
    /// The stored status is terminal; nothing ever moves it again.
    SkippedTerminal,
    /// The idempotency ledger has already seen this delivery's key.
    DuplicateDelivery,
    /// The event namespace is not one this engine handles.
    Unrecognized,
}

impl Display for ReconOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconOutcome::Created => write!(f, "Record created"),
            ReconOutcome::Updated => write!(f, "Record updated"),
            ReconOutcome::SkippedStale => write!(f, "Stale delivery skipped"),
            ReconOutcome::SkippedTerminal => write!(f, "Record is terminal; delivery skipped"),
            ReconOutcome::DuplicateDelivery => write!(f, "Duplicate delivery; already processed"),
            ReconOutcome::Unrecognized => write!(f, "Unrecognized event type; dropped"),
        }
    }
}

//--------------------------------------  ReconciliationApi   ---------------------------------------------------------
/// The webhook reconciliation engine.
///
/// For every inbound event: dedupe against the idempotency ledger, append to the audit log, classify, then run the
/// create-if-missing / update-if-newer / skip-if-stale decision against the entity store. The priority tables are
/// injected at construction and never change afterwards.
///
/// Nothing here takes a lock. Correctness under concurrent deliveries for the same entity comes from the backend's
/// conditional update (the rank guard holds at write time) and from insert-if-absent semantics on lazy creation.
pub struct ReconciliationApi<B> {
    db: B,
    priorities: StatusPriorities,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, priorities: StatusPriorities, producers: EventProducers) -> Self {
        Self { db, priorities, producers }
    }

    pub fn priorities(&self) -> &StatusPriorities {
        &self.priorities
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> ReconciliationApi<B>
where B: ReconciliationBackend + IdempotencyLedger + AuditLog
{
    /// Processes one authenticated webhook delivery.
    ///
    /// Errors returned here (malformed payload, storage failure) are for the caller's logs only; the HTTP layer
    /// acknowledges the delivery regardless, and correctness is recovered on the processor's next resend.
    pub async fn process_event(
        &self,
        envelope: WebhookEnvelope,
        idempotency_key: Option<&str>,
    ) -> Result<ReconOutcome, ReconError> {
        let key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());
        if let Some(k) = key {
            if self.already_processed(k).await {
                debug!("♻️ Delivery with idempotency key [{k}] has already been processed. Skipping.");
                return Ok(ReconOutcome::DuplicateDelivery);
            }
        }
        self.append_audit(&envelope, key).await;
        let event = match WebhookEvent::classify(&envelope)? {
            Some(event) => event,
            None => {
                warn!("🔀️ Unrecognized event namespace for event type [{}]. Dropping.", envelope.event);
                return Ok(ReconOutcome::Unrecognized);
            },
        };
        let outcome = match &event {
            WebhookEvent::Transaction(payload) => self.reconcile_transaction(payload, &envelope).await?,
            WebhookEvent::Counterparty(payload) => self.reconcile_counterparty(payload, &envelope).await?,
            WebhookEvent::Customer(payload) => self.reconcile_customer(payload, &envelope).await?,
        };
        if let Some(k) = key {
            self.mark_processed(k, &envelope.event, event.entity_id()).await;
        }
        info!("🔀️ Event [{}] for [{}] processed: {outcome}", envelope.event, event.entity_id());
        Ok(outcome)
    }

    async fn reconcile_transaction(
        &self,
        payload: &TransactionEventPayload,
        envelope: &WebhookEnvelope,
    ) -> Result<ReconOutcome, ReconError> {
        let table = &self.priorities.transactions;
        let status = payload.status.as_str();
        let new_rank = table.rank(status);
        let terminal = table.is_terminal(status);
        let completed_at = completion_timestamp(payload);
        let raw = envelope_snapshot(envelope);

        let mut current = self.db.fetch_transaction(&payload.id).await?;
        if current.is_none() {
            // Lazy create: the webhook can outrun the order-placement write path.
            let tx = NewTransaction {
                tx_id: payload.id.clone(),
                movement_type: payload.movement_type,
                status: payload.status.clone(),
                status_rank: new_rank,
                is_terminal: terminal,
                source: payload.source.clone(),
                destination: payload.destination.clone(),
                quote_id: payload.quote_id.clone(),
                reference: payload.reference.clone(),
                created_at: payload.created_at,
                completed_at,
                payload: raw.clone(),
            };
            if let Some(record) = self.db.insert_transaction(tx).await? {
                self.call_transaction_completed_hook(&record).await;
                return Ok(ReconOutcome::Created);
            }
            // A concurrent delivery created the row between our read and write. Re-read so the comparison below
            // runs against the winner's row and the skip reason reflects what is actually stored.
            trace!("🔀️ Lost the lazy-create race for transaction [{}]", payload.id);
            current = self.db.fetch_transaction(&payload.id).await?;
        }
        if let Some(cur) = &current {
            if cur.is_terminal {
                debug!("🔀️ Transaction [{}] is terminal at {}. Skipping delivery of {status}.", cur.tx_id, cur.status);
                return Ok(ReconOutcome::SkippedTerminal);
            }
            if new_rank <= cur.status_rank {
                debug!(
                    "🔀️ Stale delivery for transaction [{}]: {status} (rank {new_rank}) does not outrank {} (rank \
                     {}). Skipping.",
                    cur.tx_id, cur.status, cur.status_rank
                );
                return Ok(ReconOutcome::SkippedStale);
            }
        }
        let update = TransactionUpdate {
            tx_id: payload.id.clone(),
            status: payload.status.clone(),
            status_rank: new_rank,
            is_terminal: terminal,
            completed_at,
            payload: raw,
        };
        match self.db.apply_transaction_update(update).await? {
            Some(record) => {
                self.call_transaction_completed_hook(&record).await;
                Ok(ReconOutcome::Updated)
            },
            // The write-time guard did not hold: another worker advanced the record after our read.
            None => Ok(ReconOutcome::SkippedStale),
        }
    }

    async fn reconcile_counterparty(
        &self,
        payload: &CounterpartyEventPayload,
        envelope: &WebhookEnvelope,
    ) -> Result<ReconOutcome, ReconError> {
        let table = &self.priorities.counterparties;
        let status = payload.status.as_str();
        let new_rank = table.rank(status);
        let terminal = table.is_terminal(status);
        let raw = envelope_snapshot(envelope);

        let mut current = self.db.fetch_counterparty(&payload.id).await?;
        if current.is_none() {
            let cp = NewCounterparty {
                counterparty_id: payload.id.clone(),
                kind: payload.kind,
                status: payload.status.clone(),
                status_rank: new_rank,
                is_terminal: terminal,
                payment_methods: payload.payment_methods.clone(),
                payload: raw.clone(),
            };
            if self.db.insert_counterparty(cp).await?.is_some() {
                return Ok(ReconOutcome::Created);
            }
            current = self.db.fetch_counterparty(&payload.id).await?;
        }
        if let Some(cur) = &current {
            if cur.is_terminal {
                debug!(
                    "🔀️ Counterparty [{}] is terminal at {}. Skipping delivery of {status}.",
                    cur.counterparty_id, cur.status
                );
                return Ok(ReconOutcome::SkippedTerminal);
            }
            if new_rank <= cur.status_rank {
                debug!("🔀️ Stale delivery for counterparty [{}]: {status} does not outrank {}.", cur.counterparty_id, cur.status);
                return Ok(ReconOutcome::SkippedStale);
            }
        }
        let update = CounterpartyUpdate {
            counterparty_id: payload.id.clone(),
            status: payload.status.clone(),
            status_rank: new_rank,
            is_terminal: terminal,
            payment_methods: payload.payment_methods.clone(),
            payload: raw,
        };
        match self.db.apply_counterparty_update(update).await? {
            Some(_) => Ok(ReconOutcome::Updated),
            None => Ok(ReconOutcome::SkippedStale),
        }
    }

    async fn reconcile_customer(
        &self,
        payload: &CustomerEventPayload,
        envelope: &WebhookEnvelope,
    ) -> Result<ReconOutcome, ReconError> {
        let table = &self.priorities.customers;
        let status = payload.status.as_str();
        let new_rank = table.rank(status);
        let terminal = table.is_terminal(status);
        let raw = envelope_snapshot(envelope);

        let mut current = self.db.fetch_customer(&payload.id).await?;
        if current.is_none() {
            let customer = NewCustomer {
                customer_id: payload.id.clone(),
                status: payload.status.clone(),
                status_rank: new_rank,
                is_terminal: terminal,
                payload: raw.clone(),
            };
            if self.db.insert_customer(customer).await?.is_some() {
                return Ok(ReconOutcome::Created);
            }
            current = self.db.fetch_customer(&payload.id).await?;
        }
        if let Some(cur) = &current {
            if cur.is_terminal {
                debug!("🔀️ Customer [{}] is terminal at {}. Skipping delivery of {status}.", cur.customer_id, cur.status);
                return Ok(ReconOutcome::SkippedTerminal);
            }
            if new_rank <= cur.status_rank {
                debug!("🔀️ Stale delivery for customer [{}]: {status} does not outrank {}.", cur.customer_id, cur.status);
                return Ok(ReconOutcome::SkippedStale);
            }
        }
        let update = CustomerUpdate {
            customer_id: payload.id.clone(),
            status: payload.status.clone(),
            status_rank: new_rank,
            is_terminal: terminal,
            payload: raw,
        };
        match self.db.apply_customer_update(update).await? {
            Some(_) => Ok(ReconOutcome::Updated),
            None => Ok(ReconOutcome::SkippedStale),
        }
    }

    /// Ledger lookups fail open: a transient storage error must not drop a legitimate state update. The worst case is
    /// one duplicate pass through the rank comparison, which is a no-op.
    async fn already_processed(&self, key: &str) -> bool {
        match self.db.has_processed(key).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!("📒️ Idempotency ledger lookup failed for key [{key}]: {e}. Treating as not yet processed.");
                false
            },
        }
    }

    async fn mark_processed(&self, key: &str, event_type: &str, entity_id: &str) {
        if let Err(e) = self.db.record_processed(key, event_type, entity_id).await {
            warn!("📒️ Could not record idempotency key [{key}]: {e}. A redelivery will be reprocessed.");
        }
    }

    async fn append_audit(&self, envelope: &WebhookEnvelope, key: Option<&str>) {
        let entry = crate::db_types::NewAuditEntry {
            event_type: envelope.event.clone(),
            entity_id: envelope.entity_id_hint(),
            idempotency_key: key.map(String::from),
            payload: envelope_snapshot(envelope),
        };
        if let Err(e) = self.db.append_event(entry).await {
            warn!("🧾️ Audit log append failed for event [{}]: {e}. Continuing.", envelope.event);
        }
    }

    async fn call_transaction_completed_hook(&self, record: &TransactionRecord) {
        if !record.status.is_completed() {
            return;
        }
        for producer in &self.producers.transaction_completed_producer {
            debug!("🔀️🪝️ Notifying transaction completed hook subscribers for [{}]", record.tx_id);
            let event = TransactionCompletedEvent::new(record.clone());
            producer.publish_event(event).await;
        }
    }
}

/// The completion timestamp comes from the event payload, never the local clock, so the source of truth for "when did
/// this finish" stays with the processor.
fn completion_timestamp(payload: &TransactionEventPayload) -> Option<chrono::DateTime<chrono::Utc>> {
    if !payload.status.is_completed() {
        return None;
    }
    if payload.completed_at.is_none() {
        warn!("🔀️ Transaction [{}] reported {} without a completion timestamp.", payload.id, TransactionStatus::COMPLETED);
    }
    payload.completed_at
}

fn envelope_snapshot(envelope: &WebhookEnvelope) -> serde_json::Value {
    serde_json::to_value(envelope).unwrap_or_default()
}
