//! Inbound webhook envelope and event classification.
//!
//! The transport (and its signature check) is a collaborator; by the time an envelope reaches this module it is
//! already authenticated. Classification is a closed, tagged dispatch over the event namespace: adding a new entity
//! kind means adding a variant here, and the compiler will point at every match that needs to learn about it.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        CounterpartyId,
        CounterpartyKind,
        CounterpartyStatus,
        CustomerId,
        CustomerStatus,
        MovementType,
        PaymentEndpoint,
        TransactionId,
        TransactionStatus,
    },
    traits::ReconError,
};

//--------------------------------------   WebhookEnvelope    ---------------------------------------------------------
/// The wire shape of a webhook delivery: `{ event, version, data }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Dotted event type, e.g. `transaction.status.updated`. The namespace is the segment before the first dot.
    pub event: String,
    #[serde(default)]
    pub version: String,
    /// The entity payload, keyed by entity kind (`data.transaction`, `data.counterparty`, `data.customer`).
    pub data: serde_json::Value,
}

impl WebhookEnvelope {
    pub fn namespace(&self) -> &str {
        self.event.split('.').next().unwrap_or_default()
    }

    /// Best-effort entity id for the audit log, usable even when the payload fails typed extraction.
    pub fn entity_id_hint(&self) -> Option<String> {
        ["transaction", "counterparty", "customer"]
            .iter()
            .find_map(|key| self.data.get(key))
            .and_then(|entity| entity.get("id"))
            .and_then(|id| id.as_str())
            .map(String::from)
    }
}

//--------------------------------------   EventNamespace     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventNamespace {
    Transaction,
    Counterparty,
    Customer,
}

/// Not an error in the usual sense: unrecognized namespaces are logged and dropped, never failed.
#[derive(Debug, Clone)]
pub struct UnrecognizedNamespace(pub String);

impl FromStr for EventNamespace {
    type Err = UnrecognizedNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(Self::Transaction),
            "counterparty" => Ok(Self::Counterparty),
            "customer" => Ok(Self::Customer),
            s => Err(UnrecognizedNamespace(s.to_string())),
        }
    }
}

impl Display for EventNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventNamespace::Transaction => write!(f, "transaction"),
            EventNamespace::Counterparty => write!(f, "counterparty"),
            EventNamespace::Customer => write!(f, "customer"),
        }
    }
}

//--------------------------------------    Event payloads    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEventPayload {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub status: TransactionStatus,
    pub source: PaymentEndpoint,
    pub destination: PaymentEndpoint,
    #[serde(default)]
    pub quote_id: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    /// Creation time at the event source, not locally.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyEventPayload {
    pub id: CounterpartyId,
    #[serde(rename = "type")]
    pub kind: CounterpartyKind,
    pub status: CounterpartyStatus,
    #[serde(default)]
    pub payment_methods: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerEventPayload {
    pub id: CustomerId,
    pub status: CustomerStatus,
}

//--------------------------------------    WebhookEvent      ---------------------------------------------------------
/// A classified webhook event, one variant per entity namespace.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Transaction(TransactionEventPayload),
    Counterparty(CounterpartyEventPayload),
    Customer(CustomerEventPayload),
}

impl WebhookEvent {
    /// Classifies an envelope by namespace and extracts the typed entity payload.
    ///
    /// `Ok(None)` means the namespace is not one this engine handles (dropped upstream with a success ack).
    /// `Err` means the namespace is ours but the payload is malformed: missing entity object, missing id or status.
    pub fn classify(envelope: &WebhookEnvelope) -> Result<Option<Self>, ReconError> {
        let namespace = match envelope.namespace().parse::<EventNamespace>() {
            Ok(ns) => ns,
            Err(UnrecognizedNamespace(_)) => return Ok(None),
        };
        let entity = envelope.data.get(namespace.to_string().as_str()).ok_or_else(|| {
            ReconError::MalformedPayload(format!(
                "event {} is missing the data.{namespace} object",
                envelope.event
            ))
        })?;
        let event = match namespace {
            EventNamespace::Transaction => Self::Transaction(extract(entity, &envelope.event)?),
            EventNamespace::Counterparty => Self::Counterparty(extract(entity, &envelope.event)?),
            EventNamespace::Customer => Self::Customer(extract(entity, &envelope.event)?),
        };
        Ok(Some(event))
    }

    /// The external id of the entity this event is about.
    pub fn entity_id(&self) -> &str {
        match self {
            WebhookEvent::Transaction(p) => p.id.as_str(),
            WebhookEvent::Counterparty(p) => p.id.as_str(),
            WebhookEvent::Customer(p) => p.id.as_str(),
        }
    }
}

fn extract<T: serde::de::DeserializeOwned>(entity: &serde_json::Value, event: &str) -> Result<T, ReconError> {
    serde_json::from_value(entity.clone())
        .map_err(|e| ReconError::MalformedPayload(format!("event {event}: {e}")))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn envelope(event: &str, data: serde_json::Value) -> WebhookEnvelope {
        WebhookEnvelope { event: event.to_string(), version: "2024-01".to_string(), data }
    }

    #[test]
    fn classifies_transaction_events() {
        let data = json!({ "transaction": {
            "id": "txn_01",
            "type": "deposit",
            "status": "AWAITING_FUNDS",
            "source": { "asset": "USD", "network": "wire", "amount": "250.00" },
            "destination": { "asset": "USDC", "network": "ethereum", "amount": "250.00", "address": "0xabc" },
            "created_at": "2024-05-01T10:00:00Z"
        }});
        let event = WebhookEvent::classify(&envelope("transaction.status.updated", data)).unwrap().unwrap();
        match event {
            WebhookEvent::Transaction(p) => {
                assert_eq!(p.id.as_str(), "txn_01");
                assert_eq!(p.status.as_str(), "AWAITING_FUNDS");
                assert_eq!(p.movement_type, MovementType::Deposit);
            },
            other => panic!("Wrong classification: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_namespace_is_dropped_not_failed() {
        let data = json!({ "quote": { "id": "q_1" } });
        let result = WebhookEvent::classify(&envelope("quote.expired", data)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn missing_entity_object_is_malformed() {
        let result = WebhookEvent::classify(&envelope("transaction.created", json!({})));
        assert!(matches!(result, Err(ReconError::MalformedPayload(_))));
    }

    #[test]
    fn missing_status_is_malformed() {
        let data = json!({ "counterparty": { "id": "cp_1", "type": "business" } });
        let result = WebhookEvent::classify(&envelope("counterparty.updated", data));
        assert!(matches!(result, Err(ReconError::MalformedPayload(_))));
    }

    #[test]
    fn entity_id_hint_survives_malformed_payloads() {
        let data = json!({ "transaction": { "id": "txn_02" } });
        let env = envelope("transaction.status.updated", data);
        assert_eq!(env.entity_id_hint().as_deref(), Some("txn_02"));
        assert!(WebhookEvent::classify(&env).is_err());
    }
}
