pub mod prepare_env;

use payment_recon_engine::{
    events::EventProducers,
    priority::StatusPriorities,
    traits::ReconciliationBackend,
    webhook::WebhookEnvelope,
    ReconciliationApi,
    SqliteDatabase,
};
use serde_json::json;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use self::prepare_env::{prepare_test_env, random_db_path};

pub async fn setup() -> ReconciliationApi<SqliteDatabase> {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> ReconciliationApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    ReconciliationApi::new(db, StatusPriorities::default(), producers)
}

pub async fn tear_down(mut api: ReconciliationApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        log::error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

pub fn transaction_envelope(tx_id: &str, status: &str) -> WebhookEnvelope {
    transaction_envelope_with(tx_id, status, None)
}

pub fn transaction_envelope_with(tx_id: &str, status: &str, completed_at: Option<&str>) -> WebhookEnvelope {
    let mut transaction = json!({
        "id": tx_id,
        "type": "onramp",
        "status": status,
        "source": { "asset": "USD", "network": "wire", "amount": "1500.00" },
        "destination": { "asset": "USDC", "network": "polygon", "amount": "1500.00", "address": "0xfeed" },
        "quote_id": "quote_7",
        "reference": "invoice 42",
        "created_at": "2024-05-01T09:00:00Z"
    });
    if let Some(ts) = completed_at {
        transaction["completed_at"] = json!(ts);
    }
    WebhookEnvelope {
        event: "transaction.status.updated".to_string(),
        version: "2024-01".to_string(),
        data: json!({ "transaction": transaction }),
    }
}

pub fn counterparty_envelope(id: &str, status: &str, payment_methods: &[&str]) -> WebhookEnvelope {
    WebhookEnvelope {
        event: "counterparty.updated".to_string(),
        version: "2024-01".to_string(),
        data: json!({ "counterparty": {
            "id": id,
            "type": "business",
            "status": status,
            "payment_methods": payment_methods,
        }}),
    }
}

pub fn customer_envelope(id: &str, status: &str) -> WebhookEnvelope {
    WebhookEnvelope {
        event: "customer.status.updated".to_string(),
        version: "2024-01".to_string(),
        data: json!({ "customer": { "id": id, "status": status } }),
    }
}
