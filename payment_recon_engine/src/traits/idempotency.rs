use crate::traits::ReconError;

/// The idempotency ledger: one row per distinct idempotency key ever observed.
///
/// Callers decide the failure policy. The engine treats lookup errors as "not yet processed" (fail open): a transient
/// ledger outage must not silently drop a legitimate state update, and the worst case (processing a duplicate) is
/// already absorbed by the rank comparison.
#[allow(async_fn_in_trait)]
pub trait IdempotencyLedger: Clone {
    /// Whether a ledger row exists for this key.
    async fn has_processed(&self, idempotency_key: &str) -> Result<bool, ReconError>;

    /// Records the key. A uniqueness conflict is "already recorded", not an error; two concurrent deliveries of the
    /// same key may both land here.
    async fn record_processed(
        &self,
        idempotency_key: &str,
        event_type: &str,
        entity_id: &str,
    ) -> Result<(), ReconError>;
}
