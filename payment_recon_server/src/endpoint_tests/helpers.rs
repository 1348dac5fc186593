use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use payment_recon_engine::{
    db_types::{
        CounterpartyId,
        CounterpartyRecord,
        CounterpartyUpdate,
        CustomerId,
        CustomerRecord,
        CustomerUpdate,
        NewAuditEntry,
        NewCounterparty,
        NewCustomer,
        NewTransaction,
        TransactionId,
        TransactionRecord,
        TransactionUpdate,
    },
    events::EventProducers,
    priority::StatusPriorities,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{AuditLog, IdempotencyLedger, ReconError, ReconciliationBackend},
    ReconciliationApi,
    SqliteDatabase,
};
use serde_json::json;

use crate::{
    config::{ServerConfig, WebhookAuthConfig, IDEMPOTENCY_KEY_HEADER},
    data_objects::JsonResponse,
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    routes::incoming_event,
    secret::Secret,
};

pub const TEST_SECRET: &str = "test-webhook-secret";

/// Spins up a fresh, migrated sqlite database and signature config for one test.
pub async fn setup() -> (SqliteDatabase, WebhookAuthConfig) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    let auth = WebhookAuthConfig { hmac_secret: Secret::new(TEST_SECRET.to_string()), ..Default::default() };
    (db, auth)
}

pub fn sign(auth: &WebhookAuthConfig, body: &str) -> String {
    calculate_hmac(auth.hmac_secret.reveal(), body.as_bytes())
}

/// Posts a delivery to `/webhook/event` against a throwaway app instance backed by `db`.
///
/// Returns the status and acknowledgement body, or the middleware's error string if the delivery was rejected
/// before reaching the handler.
pub async fn post_event(
    db: &SqliteDatabase,
    auth: &WebhookAuthConfig,
    body: &str,
    signature: Option<&str>,
    idempotency_key: Option<&str>,
) -> Result<(StatusCode, JsonResponse), String> {
    let api = ReconciliationApi::new(db.clone(), StatusPriorities::default(), EventProducers::default());
    let config = ServerConfig { webhook: auth.clone(), ..Default::default() };
    let app = test::init_service(
        App::new().app_data(web::Data::new(api)).app_data(web::Data::new(config)).service(
            web::scope("/webhook")
                .wrap(HmacMiddlewareFactory::new(&auth.signature_header, auth.hmac_secret.clone(), auth.hmac_checks))
                .route("/event", web::post().to(incoming_event::<SqliteDatabase>)),
        ),
    )
    .await;
    let mut req = test::TestRequest::post().uri("/webhook/event").set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((auth.signature_header.as_str(), sig));
    }
    if let Some(key) = idempotency_key {
        req = req.insert_header((IDEMPOTENCY_KEY_HEADER, key));
    }
    match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body_json::<JsonResponse, _>(res).await;
            Ok((status, body))
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Wraps a real database and stalls entity reads, so a test can blow the per-delivery deadline reliably.
#[derive(Clone)]
pub struct SlowBackend {
    inner: SqliteDatabase,
    delay: Duration,
}

impl SlowBackend {
    pub fn new(inner: SqliteDatabase, delay: Duration) -> Self {
        Self { inner, delay }
    }

    async fn stall(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

impl ReconciliationBackend for SlowBackend {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn fetch_transaction(&self, tx_id: &TransactionId) -> Result<Option<TransactionRecord>, ReconError> {
        self.stall().await;
        self.inner.fetch_transaction(tx_id).await
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> Result<Option<TransactionRecord>, ReconError> {
        self.inner.insert_transaction(tx).await
    }

    async fn apply_transaction_update(
        &self,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionRecord>, ReconError> {
        self.inner.apply_transaction_update(update).await
    }

    async fn fetch_counterparty(&self, id: &CounterpartyId) -> Result<Option<CounterpartyRecord>, ReconError> {
        self.stall().await;
        self.inner.fetch_counterparty(id).await
    }

    async fn insert_counterparty(&self, cp: NewCounterparty) -> Result<Option<CounterpartyRecord>, ReconError> {
        self.inner.insert_counterparty(cp).await
    }

    async fn apply_counterparty_update(
        &self,
        update: CounterpartyUpdate,
    ) -> Result<Option<CounterpartyRecord>, ReconError> {
        self.inner.apply_counterparty_update(update).await
    }

    async fn fetch_customer(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, ReconError> {
        self.stall().await;
        self.inner.fetch_customer(id).await
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Option<CustomerRecord>, ReconError> {
        self.inner.insert_customer(customer).await
    }

    async fn apply_customer_update(&self, update: CustomerUpdate) -> Result<Option<CustomerRecord>, ReconError> {
        self.inner.apply_customer_update(update).await
    }
}

impl IdempotencyLedger for SlowBackend {
    async fn has_processed(&self, idempotency_key: &str) -> Result<bool, ReconError> {
        self.inner.has_processed(idempotency_key).await
    }

    async fn record_processed(
        &self,
        idempotency_key: &str,
        event_type: &str,
        entity_id: &str,
    ) -> Result<(), ReconError> {
        self.inner.record_processed(idempotency_key, event_type, entity_id).await
    }
}

impl AuditLog for SlowBackend {
    async fn append_event(&self, entry: NewAuditEntry) -> Result<(), ReconError> {
        self.inner.append_event(entry).await
    }
}

pub fn transaction_body(tx_id: &str, status: &str) -> String {
    json!({
        "event": "transaction.status.updated",
        "version": "2024-01",
        "data": { "transaction": {
            "id": tx_id,
            "type": "deposit",
            "status": status,
            "source": { "asset": "USD", "network": "wire", "amount": "100.00" },
            "destination": { "asset": "USDC", "network": "ethereum", "amount": "100.00", "address": "0xabc" },
            "created_at": "2024-05-01T12:00:00Z"
        }}
    })
    .to_string()
}
