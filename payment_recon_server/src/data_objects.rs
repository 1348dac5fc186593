use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The acknowledgement body returned for every webhook delivery.
///
/// Deliveries are always acknowledged with an HTTP 200, regardless of what happened during reconciliation, so that
/// the payment processor does not retry them. `success` means the delivery was handled without an internal error;
/// stale, terminal and duplicate deliveries are skips, not failures, and still acknowledge with `success: true`.
/// `message` carries the reconciliation outcome or the error description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
