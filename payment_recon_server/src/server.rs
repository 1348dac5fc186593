use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use payment_recon_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    priority::StatusPriorities,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::HmacMiddlewareFactory,
    routes::{health, incoming_event},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig, hooks: EventHooks) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(db.clone(), StatusPriorities::default(), producers.clone());
        let auth = &config.webhook;
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(&auth.signature_header, auth.hmac_secret.clone(), auth.hmac_checks))
            .route("/event", web::post().to(incoming_event::<SqliteDatabase>));
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("prs::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Reconciliation server listening on {host}:{port}");
    Ok(srv)
}
