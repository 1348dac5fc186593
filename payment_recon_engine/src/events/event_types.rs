use crate::db_types::TransactionRecord;

/// Emitted when a transaction record reaches the `COMPLETED` status, whether by update or by lazy creation directly
/// at the terminal status. The rest of the orchestration backend subscribes to this to kick off downstream side
/// effects (notifications, settlement bookkeeping).
#[derive(Debug, Clone)]
pub struct TransactionCompletedEvent {
    pub transaction: TransactionRecord,
}

impl TransactionCompletedEvent {
    pub fn new(transaction: TransactionRecord) -> Self {
        Self { transaction }
    }
}
