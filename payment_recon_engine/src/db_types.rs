use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------    TransactionId     ---------------------------------------------------------
/// The transaction identifier assigned by the external payment processor. Unique and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TransactionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl<S: Into<String>> From<S> for TransactionId {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   CounterpartyId     ---------------------------------------------------------
/// The counterparty identifier assigned by the external payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct CounterpartyId(pub String);

impl CounterpartyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for CounterpartyId {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl Display for CounterpartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     CustomerId       ---------------------------------------------------------
/// The customer identifier assigned by the external payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for CustomerId {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
/// A transaction status value, stored verbatim as reported by the processor.
///
/// The status vocabulary is open on purpose: the processor can introduce values this build has never seen, and those
/// must still round-trip through storage. How a value ranks against the current local state is decided by the
/// [`crate::priority::PriorityTable`], not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TransactionStatus(String);

impl TransactionStatus {
    /// The terminal-success status. The only status value the engine matches on by name, because it controls the
    /// completion timestamp.
    pub const COMPLETED: &'static str = "COMPLETED";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_completed(&self) -> bool {
        self.0 == Self::COMPLETED
    }
}

impl<S: Into<String>> From<S> for TransactionStatus {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//-------------------------------------- CounterpartyStatus   ---------------------------------------------------------
/// A counterparty status value. Same open-vocabulary treatment as [`TransactionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct CounterpartyStatus(String);

impl CounterpartyStatus {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for CounterpartyStatus {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl Display for CounterpartyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   CustomerStatus     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct CustomerStatus(String);

impl CustomerStatus {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for CustomerStatus {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    MovementType      ---------------------------------------------------------
/// The kind of money movement a transaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Deposit,
    Withdrawal,
    Onramp,
    Offramp,
    Conversion,
    Transfer,
}

impl Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MovementType::Deposit => "deposit",
            MovementType::Withdrawal => "withdrawal",
            MovementType::Onramp => "onramp",
            MovementType::Offramp => "offramp",
            MovementType::Conversion => "conversion",
            MovementType::Transfer => "transfer",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid movement type: {0}")]
pub struct MovementTypeConversionError(String);

impl FromStr for MovementType {
    type Err = MovementTypeConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "onramp" => Ok(Self::Onramp),
            "offramp" => Ok(Self::Offramp),
            "conversion" => Ok(Self::Conversion),
            "transfer" => Ok(Self::Transfer),
            s => Err(MovementTypeConversionError(s.to_string())),
        }
    }
}

//--------------------------------------  CounterpartyKind    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyKind {
    Business,
    Individual,
}

impl Display for CounterpartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterpartyKind::Business => write!(f, "business"),
            CounterpartyKind::Individual => write!(f, "individual"),
        }
    }
}

//--------------------------------------   PaymentEndpoint    ---------------------------------------------------------
/// One leg of a money movement: the asset and rail, plus either an external address or an internal account reference.
///
/// Amounts are kept as the processor's decimal strings. This engine never does arithmetic on them, and re-encoding
/// through a numeric type would destroy the source representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEndpoint {
    pub asset: String,
    pub network: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

//--------------------------------------  TransactionRecord   ---------------------------------------------------------
/// The local authoritative record for one money-movement instruction.
///
/// `status_rank` and `is_terminal` are denormalised from the priority table at every write so that the stale-update
/// guard can live inside a single conditional SQL statement.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub tx_id: TransactionId,
    pub movement_type: MovementType,
    pub status: TransactionStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub source: Json<PaymentEndpoint>,
    pub destination: Json<PaymentEndpoint>,
    pub quote_id: Option<String>,
    pub reference: Option<String>,
    /// Creation time as reported by the event source. Immutable.
    pub created_at: DateTime<Utc>,
    /// Set once, from the event payload, when the transaction reaches `COMPLETED`.
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// The full raw envelope of the last event that changed this record.
    pub payload: Json<serde_json::Value>,
}

//--------------------------------------    NewTransaction    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub tx_id: TransactionId,
    pub movement_type: MovementType,
    pub status: TransactionStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub source: PaymentEndpoint,
    pub destination: PaymentEndpoint,
    pub quote_id: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}

//--------------------------------------  TransactionUpdate   ---------------------------------------------------------
/// A candidate status transition for an existing transaction. Applied as a single conditional statement: the write
/// succeeds only if the stored rank is still below `status_rank` and the stored status is not terminal.
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    pub tx_id: TransactionId,
    pub status: TransactionStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}

//-------------------------------------- CounterpartyRecord   ---------------------------------------------------------
/// The local record for one external party eligible to send or receive funds. "Deleted" is a status value here, not a
/// row deletion.
#[derive(Debug, Clone, FromRow)]
pub struct CounterpartyRecord {
    pub id: i64,
    pub counterparty_id: CounterpartyId,
    pub kind: CounterpartyKind,
    pub status: CounterpartyStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub payment_methods: Json<Vec<String>>,
    pub updated_at: DateTime<Utc>,
    pub payload: Json<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewCounterparty {
    pub counterparty_id: CounterpartyId,
    pub kind: CounterpartyKind,
    pub status: CounterpartyStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub payment_methods: Vec<String>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CounterpartyUpdate {
    pub counterparty_id: CounterpartyId,
    pub status: CounterpartyStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub payment_methods: Vec<String>,
    pub payload: serde_json::Value,
}

//--------------------------------------   CustomerRecord     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct CustomerRecord {
    pub id: i64,
    pub customer_id: CustomerId,
    pub status: CustomerStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub updated_at: DateTime<Utc>,
    pub payload: Json<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub customer_id: CustomerId,
    pub status: CustomerStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    pub customer_id: CustomerId,
    pub status: CustomerStatus,
    pub status_rank: i64,
    pub is_terminal: bool,
    pub payload: serde_json::Value,
}

//--------------------------------------     AuditEntry       ---------------------------------------------------------
/// One append-only row per received event. Pure side-effect sink; nothing in the engine reads it back.
#[derive(Debug, Clone, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub event_type: String,
    pub entity_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub payload: Json<serde_json::Value>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub event_type: String,
    pub entity_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub payload: serde_json::Value,
}

//--------------------------------------    LedgerEntry       ---------------------------------------------------------
/// One row per distinct idempotency key observed on the wire. Existence alone short-circuits reprocessing.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub idempotency_key: String,
    pub event_type: String,
    pub entity_id: String,
    pub first_seen_at: DateTime<Utc>,
}
