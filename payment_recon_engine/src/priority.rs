//! Status priority tables.
//!
//! The external processor delivers status notifications at-least-once, unordered. The engine recovers an effective
//! ordering from that stream by ranking every status value: a delivery is applied only when its rank is strictly
//! higher than the stored one. The tables here are the single source of truth for that rule.
//!
//! Tables are plain immutable values handed to [`crate::ReconciliationApi`] at construction, so tests can supply their
//! own rankings. A status value that is missing from the table ranks 0, which means it can only ever be accepted on a
//! record that does not exist yet (or that is itself unranked). An unknown status never overrides known state.

use std::collections::HashMap;

/// The rank at and above which a transaction status is terminal.
pub const TERMINAL_RANK: i64 = 10;

//--------------------------------------    PriorityTable     ---------------------------------------------------------
/// An immutable ranking of status values for one entity kind.
#[derive(Debug, Clone, Default)]
pub struct PriorityTable {
    ranks: HashMap<String, StatusRank>,
}

#[derive(Debug, Clone, Copy)]
struct StatusRank {
    rank: i64,
    terminal: bool,
}

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a status value to the table. Builder-style, since tables are only ever constructed whole.
    pub fn with_status<S: Into<String>>(mut self, status: S, rank: i64, terminal: bool) -> Self {
        self.ranks.insert(status.into(), StatusRank { rank, terminal });
        self
    }

    /// The rank for the given status value. Unseen values rank 0 (lowest).
    pub fn rank(&self, status: &str) -> i64 {
        self.ranks.get(status).map(|r| r.rank).unwrap_or(0)
    }

    /// Whether the given status value is terminal. Unseen values are not.
    pub fn is_terminal(&self, status: &str) -> bool {
        self.ranks.get(status).map(|r| r.terminal).unwrap_or(false)
    }
}

//--------------------------------------  StatusPriorities    ---------------------------------------------------------
/// The per-entity-kind priority tables injected into the reconciliation engine.
///
/// The `Default` impl carries the processor's full status vocabulary and must be kept in sync with it as the processor
/// adds states.
#[derive(Debug, Clone)]
pub struct StatusPriorities {
    pub transactions: PriorityTable,
    pub counterparties: PriorityTable,
    pub customers: PriorityTable,
}

impl Default for StatusPriorities {
    fn default() -> Self {
        let transactions = PriorityTable::new()
            .with_status("CREATED", 1, false)
            .with_status("IN_COMPLIANCE_REVIEW", 2, false)
            .with_status("COMPLIANCE_APPROVED", 3, false)
            .with_status("AWAITING_FUNDS", 4, false)
            .with_status("FUNDS_RECEIVED", 5, false)
            .with_status("PROCESSING_WITHDRAWAL", 6, false)
            .with_status("WITHDRAWAL_PROCESSED", 7, false)
            .with_status("PROCESSING_SETTLEMENT", 8, false)
            .with_status("SETTLEMENT_PROCESSED", 9, false)
            .with_status("COMPLETED", TERMINAL_RANK, true)
            .with_status("CANCELLED", TERMINAL_RANK, true)
            .with_status("COMPLIANCE_REJECTED", TERMINAL_RANK, true);
        let counterparties = PriorityTable::new()
            .with_status("in_compliance_review", 1, false)
            .with_status("active", 3, false)
            .with_status("compliance_rejected", 4, true)
            .with_status("deleted", 5, true);
        let customers = PriorityTable::new()
            .with_status("kyc_pending", 1, false)
            .with_status("in_review", 2, false)
            .with_status("active", 3, false)
            .with_status("rejected", 4, true);
        Self { transactions, counterparties, customers }
    }
}
