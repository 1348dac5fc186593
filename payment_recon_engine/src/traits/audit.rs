use crate::{db_types::NewAuditEntry, traits::ReconError};

/// Append-only record of every received event, kept for replay and dispute resolution.
///
/// There is no read path here on purpose; nothing in the engine depends on audit contents, and an append failure must
/// never fail the delivery it belongs to.
#[allow(async_fn_in_trait)]
pub trait AuditLog: Clone {
    async fn append_event(&self, entry: NewAuditEntry) -> Result<(), ReconError>;
}
