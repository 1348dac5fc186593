use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use payment_recon_engine::{events::EventProducers, priority::StatusPriorities, ReconciliationApi};

use super::helpers::{post_event, setup, sign, transaction_body, SlowBackend};
use crate::{
    config::ServerConfig,
    data_objects::JsonResponse,
    routes::{health, incoming_event},
};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn unsigned_delivery_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, auth) = setup().await;
    let body = transaction_body("txn_sig_1", "CREATED");
    let err = post_event(&db, &auth, &body, None, None).await.expect_err("Request should have been rejected");
    assert_eq!(err, "No webhook signature was provided");
}

#[actix_web::test]
async fn tampered_delivery_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (db, auth) = setup().await;
    let body = transaction_body("txn_sig_2", "CREATED");
    let sig = sign(&auth, &body);
    // Signature was computed over a different body
    let tampered = transaction_body("txn_sig_2", "COMPLETED");
    let err =
        post_event(&db, &auth, &tampered, Some(&sig), None).await.expect_err("Request should have been rejected");
    assert_eq!(err, "The webhook signature does not match the request body");
}

#[actix_web::test]
async fn signed_delivery_is_processed() {
    let _ = env_logger::try_init().ok();
    let (db, auth) = setup().await;
    let body = transaction_body("txn_ok_1", "CREATED");
    let sig = sign(&auth, &body);
    let (status, ack) = post_event(&db, &auth, &body, Some(&sig), None).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
    assert_eq!(ack.message, "Record created");
}

#[actix_web::test]
async fn disabled_hmac_checks_allow_unsigned_deliveries() {
    let _ = env_logger::try_init().ok();
    let (db, mut auth) = setup().await;
    auth.hmac_checks = false;
    let body = transaction_body("txn_nosig_1", "CREATED");
    let (status, ack) = post_event(&db, &auth, &body, None, None).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
}

#[actix_web::test]
async fn unparseable_body_is_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (db, auth) = setup().await;
    let body = "this is not an event envelope";
    let sig = sign(&auth, body);
    let (status, ack) = post_event(&db, &auth, body, Some(&sig), None).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(!ack.success);
    assert_eq!(ack.message, "Could not parse the event envelope.");
}

#[actix_web::test]
async fn idempotency_key_header_deduplicates_deliveries() {
    let _ = env_logger::try_init().ok();
    let (db, auth) = setup().await;
    let body = transaction_body("txn_dup_1", "CREATED");
    let sig = sign(&auth, &body);
    let (_, first) = post_event(&db, &auth, &body, Some(&sig), Some("delivery-1")).await.expect("Request failed");
    assert_eq!(first.message, "Record created");
    let (status, second) =
        post_event(&db, &auth, &body, Some(&sig), Some("delivery-1")).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(second.success);
    assert_eq!(second.message, "Duplicate delivery; already processed");
}

#[actix_web::test]
async fn blown_deadline_is_acknowledged_as_a_failure() {
    let _ = env_logger::try_init().ok();
    let (db, mut auth) = setup().await;
    auth.hmac_checks = false;
    let backend = SlowBackend::new(db, Duration::from_millis(250));
    let api = ReconciliationApi::new(backend, StatusPriorities::default(), EventProducers::default());
    let config =
        ServerConfig { event_deadline: Duration::from_millis(10), webhook: auth, ..Default::default() };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(config))
            .route("/webhook/event", web::post().to(incoming_event::<SlowBackend>)),
    )
    .await;
    let body = transaction_body("txn_slow_1", "CREATED");
    let req = test::TestRequest::post().uri("/webhook/event").set_payload(body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack = test::read_body_json::<JsonResponse, _>(res).await;
    assert!(!ack.success);
    assert_eq!(ack.message, "Event processing timed out.");
}

#[actix_web::test]
async fn terminal_records_acknowledge_stale_deliveries() {
    let _ = env_logger::try_init().ok();
    let (db, auth) = setup().await;
    let done = transaction_body("txn_term_1", "COMPLETED");
    let sig = sign(&auth, &done);
    let (_, ack) = post_event(&db, &auth, &done, Some(&sig), None).await.expect("Request failed");
    assert!(ack.success);
    let stale = transaction_body("txn_term_1", "AWAITING_FUNDS");
    let sig = sign(&auth, &stale);
    let (status, ack) = post_event(&db, &auth, &stale, Some(&sig), None).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
    assert_eq!(ack.message, "Record is terminal; delivery skipped");
}
