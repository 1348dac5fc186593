//! Transaction-completion hook wiring.
#![allow(dead_code)]

mod support;

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use futures_util::FutureExt;
use log::*;
use payment_recon_engine::events::{EventHandlers, EventHooks};
use support::{setup_with_producers, tear_down, transaction_envelope_with};

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

#[tokio::test]
async fn completion_hook_fires_once_per_completed_transaction() {
    let event = HookCalled::default();
    let event_copy = event.clone();
    let mut hooks = EventHooks::default();
    hooks.on_transaction_completed(move |ev| {
        info!("🪝️ Transaction [{}] completed", ev.transaction.tx_id);
        event_copy.called();
        async {}.boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    let dispatch = tokio::spawn(handlers.on_transaction_completed.unwrap().start_handler());

    let api = setup_with_producers(producers).await;
    api.process_event(transaction_envelope_with("txn_hook_1", "AWAITING_FUNDS", None), None).await.unwrap();
    api.process_event(transaction_envelope_with("txn_hook_1", "COMPLETED", Some("2024-06-01T12:00:00Z")), None)
        .await
        .unwrap();
    // A post-terminal resend must not re-fire the hook.
    api.process_event(transaction_envelope_with("txn_hook_1", "COMPLETED", Some("2024-06-01T12:00:00Z")), None)
        .await
        .unwrap();
    // Lazy creation directly at COMPLETED fires as well.
    api.process_event(transaction_envelope_with("txn_hook_2", "COMPLETED", Some("2024-06-02T12:00:00Z")), None)
        .await
        .unwrap();

    // Dropping the api releases the producers; the dispatch loop then drains its in-flight invocations and exits.
    tear_down(api).await;
    dispatch.await.unwrap();
    assert_eq!(event.count(), 2);
}
