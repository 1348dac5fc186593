//! # Backend contracts for the reconciliation engine.
//!
//! These traits define what a storage backend must provide to host the engine. The engine itself never issues SQL;
//! it works entirely through:
//!
//! * [`ReconciliationBackend`]: point reads, insert-if-absent, and conditional status updates for the three entity
//!   kinds. The conditional update is the load-bearing operation: the rank guard is re-evaluated at write time by the
//!   backend, not just at read time by the engine.
//! * [`IdempotencyLedger`]: the has-this-key-been-seen record. Unique-key conflicts on insert mean "already
//!   recorded", not failure.
//! * [`AuditLog`]: an append-only sink for every received event.
//!
//! [`crate::SqliteDatabase`] implements all three.

mod audit;
mod idempotency;
mod reconciliation_backend;

pub use audit::AuditLog;
pub use idempotency::IdempotencyLedger;
pub use reconciliation_backend::{ReconError, ReconciliationBackend};
