//! Payment Reconciliation Engine
//!
//! The reconciliation engine keeps local authoritative state in sync with an external payment processor that
//! delivers status notifications asynchronously, at-least-once, out of order, and with duplicates. The engine's one
//! invariant: a local status never regresses. It gets there without locks, by ranking every status value and applying
//! updates as conditional writes.
//!
//! The library is split into:
//! 1. Backend contracts and the SQLite implementation ([`mod@traits`], [`SqliteDatabase`]). Callers should never
//!    touch SQL directly; the data types in [`mod@db_types`] are the public surface.
//! 2. The engine API ([`ReconciliationApi`]): one entry point, [`ReconciliationApi::process_event`], which runs the
//!    dedupe / audit / classify / reconcile pipeline for a single delivery.
//!
//! Consumers can subscribe to engine events (currently transaction completion) through the hook system in
//! [`mod@events`].
mod api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod priority;
pub mod traits;
pub mod webhook;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{ReconOutcome, ReconciliationApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
