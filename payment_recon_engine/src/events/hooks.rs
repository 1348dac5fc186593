use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, TransactionCompletedEvent};

/// The producer side handed to the reconciliation engine.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_completed_producer: Vec<EventProducer<TransactionCompletedEvent>>,
}

/// The consumer side. Build from [`EventHooks`], hand [`EventProducers`] to the engine, then spawn
/// [`Self::start_handlers`].
pub struct EventHandlers {
    pub on_transaction_completed: Option<EventHandler<TransactionCompletedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_completed = hooks.on_transaction_completed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_transaction_completed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_completed {
            result.transaction_completed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_completed: Option<Handler<TransactionCompletedEvent>>,
}

impl EventHooks {
    pub fn on_transaction_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_completed = Some(Arc::new(f));
        self
    }
}
