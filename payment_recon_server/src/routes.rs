//! Request handlers for the server.
//!
//! The webhook route lives under `/webhook` so that the whole scope can be wrapped with the HMAC middleware. The
//! handler upholds the acknowledgement contract: once a delivery is authenticated, the response status is always
//! 200, whatever happened during reconciliation, so that the payment processor never goes into a retry loop over a
//! payload this server cannot use. The outcome travels in the [`JsonResponse`] body instead.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use payment_recon_engine::{
    traits::{AuditLog, IdempotencyLedger, ReconError, ReconciliationBackend},
    webhook::WebhookEnvelope,
    ReconciliationApi,
};
use tokio::time::timeout;

use crate::{
    config::{ServerConfig, IDEMPOTENCY_KEY_HEADER},
    data_objects::JsonResponse,
};

/// A simple health check route that returns a 200 OK response.
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💓️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Receives a webhook delivery from the payment processor and hands it to the reconciliation engine.
///
/// The body is deserialized by hand rather than via an extractor so that an unparseable body still produces a 200
/// acknowledgement instead of a 400. Processing is bounded by the configured event deadline; a delivery that blows
/// the deadline is acknowledged as a failure and left to converge on the processor's next resend.
pub async fn incoming_event<B>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
    config: web::Data<ServerConfig>,
) -> HttpResponse
where
    B: ReconciliationBackend + IdempotencyLedger + AuditLog,
{
    trace!("🪝️ Received webhook delivery: {}", req.uri());
    let envelope = match serde_json::from_slice::<WebhookEnvelope>(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("🪝️ Could not parse the event envelope. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not parse the event envelope."));
        },
    };
    let idempotency_key =
        req.headers().get(IDEMPOTENCY_KEY_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
    let event = envelope.event.clone();
    let result = match timeout(config.event_deadline, api.process_event(envelope, idempotency_key.as_deref())).await {
        Ok(Ok(outcome)) => JsonResponse::success(outcome),
        Ok(Err(ReconError::MalformedPayload(msg))) => {
            warn!("🪝️ Malformed payload for [{event}]. {msg}");
            JsonResponse::failure(msg)
        },
        Ok(Err(ReconError::DatabaseError(e))) => {
            warn!("🪝️ Storage error while handling [{event}]. {e}");
            JsonResponse::failure("Storage error while handling event.")
        },
        Err(_) => {
            warn!(
                "🪝️ [{event}] did not complete within {}s. Acknowledging without a result.",
                config.event_deadline.as_secs()
            );
            JsonResponse::failure("Event processing timed out.")
        },
    };
    HttpResponse::Ok().json(result)
}
