//! Worker-pool consumer for inbound order messages.

use std::sync::Arc;

use domain::{ProcessOrder, ProcessOrderError, ProcessOutcome};
use tokio::sync::{Mutex, mpsc};

use crate::message::{OrderMessage, order_from_message};

/// What handling one delivery amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A new order was persisted.
    Processed,
    /// The order already existed; acknowledged without side effects.
    Duplicate,
    /// The payload could not be parsed or failed validation. Not
    /// retryable; dead-lettered.
    Rejected,
    /// A store failure. The delivery collaborator owns redelivery; here
    /// the payload goes to the dead-letter seam with its reason.
    Failed,
}

/// A delivery the pipeline could not process, with the reason.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub payload: Vec<u8>,
    pub reason: String,
}

/// Processes raw order payloads from a bounded channel with a pool of
/// independent workers.
///
/// Workers share nothing but the stores behind the use case; ordering is
/// guaranteed only within a single delivery. Redelivered duplicates are
/// acknowledged as successes by the idempotent pipeline underneath.
pub struct Consumer {
    process: ProcessOrder,
    dead_letters: mpsc::Sender<DeadLetter>,
}

impl Consumer {
    pub fn new(process: ProcessOrder, dead_letters: mpsc::Sender<DeadLetter>) -> Self {
        Self {
            process,
            dead_letters,
        }
    }

    /// Handles one delivery end to end: parse, translate, process.
    #[tracing::instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn handle_delivery(&self, payload: &[u8]) -> DeliveryOutcome {
        metrics::counter!("ingest_messages_total").increment(1);

        let message: OrderMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(error = %err, "unparseable order message");
                self.dead_letter(payload, format!("unparseable message: {err}"))
                    .await;
                return DeliveryOutcome::Rejected;
            }
        };

        tracing::info!(
            order_id = ?message.order_id,
            customer_id = ?message.customer_id,
            "received order message"
        );

        let order = order_from_message(message);

        match self.process.execute(order).await {
            Ok(ProcessOutcome::Created(_)) => DeliveryOutcome::Processed,
            Ok(ProcessOutcome::Duplicate) => DeliveryOutcome::Duplicate,
            Err(ProcessOrderError::Invalid(reason)) => {
                self.dead_letter(payload, reason.to_string()).await;
                DeliveryOutcome::Rejected
            }
            Err(ProcessOrderError::Store(err)) => {
                tracing::error!(error = %err, "store failure while processing order");
                self.dead_letter(payload, err.to_string()).await;
                DeliveryOutcome::Failed
            }
        }
    }

    /// Runs `workers` tasks draining the channel until it closes.
    pub async fn run(self: Arc<Self>, receiver: mpsc::Receiver<Vec<u8>>, workers: usize) {
        let receiver = Arc::new(Mutex::new(receiver));

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let consumer = Arc::clone(&self);
            let receiver = Arc::clone(&receiver);
            handles.push(tokio::spawn(async move {
                loop {
                    let payload = { receiver.lock().await.recv().await };
                    match payload {
                        Some(payload) => {
                            let outcome = consumer.handle_delivery(&payload).await;
                            tracing::debug!(worker, ?outcome, "delivery handled");
                        }
                        None => break,
                    }
                }
            }));
        }

        for handle in handles {
            // A worker only panics if a handler panicked; surface nothing
            // and keep draining with the remaining workers.
            let _ = handle.await;
        }
    }

    async fn dead_letter(&self, payload: &[u8], reason: String) {
        metrics::counter!("ingest_dead_letter_total").increment(1);
        tracing::warn!(%reason, "dead-lettering message");

        let letter = DeadLetter {
            payload: payload.to_vec(),
            reason,
        };
        if self.dead_letters.send(letter).await.is_err() {
            tracing::error!("dead-letter receiver dropped, discarding message");
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, OrderId};
    use domain::{CustomerStore, Money, Order, OrderItem, OrderStore};
    use rust_decimal::Decimal;
    use store::InMemoryStore;

    use super::*;

    fn setup(store: &InMemoryStore) -> (Consumer, mpsc::Receiver<DeadLetter>) {
        let process = ProcessOrder::new(
            Arc::new(store.clone()) as Arc<dyn OrderStore>,
            Arc::new(store.clone()) as Arc<dyn CustomerStore>,
        );
        let (dlq_tx, dlq_rx) = mpsc::channel(16);
        (Consumer::new(process, dlq_tx), dlq_rx)
    }

    const SCENARIO_A: &str = r#"{
        "orderId": 1001,
        "customerId": 1,
        "items": [
            {"product": "pencil", "quantity": 100, "price": 1.10},
            {"product": "notebook", "quantity": 10, "price": 1.00}
        ]
    }"#;

    #[tokio::test]
    async fn a_valid_message_is_persisted_with_its_totals() {
        let store = InMemoryStore::new();
        let (consumer, _dlq) = setup(&store);

        let outcome = consumer.handle_delivery(SCENARIO_A.as_bytes()).await;

        assert_eq!(outcome, DeliveryOutcome::Processed);
        let saved = store
            .find_by_id_with_items(OrderId::new(1001))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.items_count(), 2);
        assert_eq!(saved.total_amount(), Money::from(120));
    }

    #[tokio::test]
    async fn an_order_without_items_is_rejected_and_dead_lettered() {
        let store = InMemoryStore::new();
        let (consumer, mut dlq) = setup(&store);

        let payload = br#"{"orderId": 2, "customerId": 1, "items": []}"#;
        let outcome = consumer.handle_delivery(payload).await;

        assert_eq!(outcome, DeliveryOutcome::Rejected);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.customer_count().await, 0);

        let letter = dlq.recv().await.unwrap();
        assert!(letter.reason.starts_with("Invalid order data"));
        assert_eq!(letter.payload, payload);
    }

    #[tokio::test]
    async fn redelivery_is_acknowledged_without_side_effects() {
        let store = InMemoryStore::new();
        let (consumer, _dlq) = setup(&store);

        assert_eq!(
            consumer.handle_delivery(SCENARIO_A.as_bytes()).await,
            DeliveryOutcome::Processed
        );
        assert_eq!(
            consumer.handle_delivery(SCENARIO_A.as_bytes()).await,
            DeliveryOutcome::Duplicate
        );

        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.customer_count().await, 1);
    }

    #[tokio::test]
    async fn a_preexisting_order_is_a_duplicate() {
        let store = InMemoryStore::new();
        let existing = Order::new(
            OrderId::new(1001),
            CustomerId::new(1),
            vec![OrderItem::new(
                "pencil",
                Some(1),
                Some(Money::new(Decimal::new(110, 2))),
            )],
        );
        let customer = domain::Customer::new(CustomerId::new(1));
        OrderStore::save(&store, &existing, &customer).await.unwrap();

        let (consumer, _dlq) = setup(&store);
        let outcome = consumer.handle_delivery(SCENARIO_A.as_bytes()).await;

        assert_eq!(outcome, DeliveryOutcome::Duplicate);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn unparseable_payloads_are_dead_lettered() {
        let store = InMemoryStore::new();
        let (consumer, mut dlq) = setup(&store);

        let outcome = consumer.handle_delivery(b"not json at all").await;

        assert_eq!(outcome, DeliveryOutcome::Rejected);
        assert_eq!(store.order_count().await, 0);

        let letter = dlq.recv().await.unwrap();
        assert!(letter.reason.starts_with("unparseable message"));
    }

    #[tokio::test]
    async fn the_worker_pool_drains_the_channel() {
        let store = InMemoryStore::new();
        let (consumer, _dlq) = setup(&store);

        let (tx, rx) = mpsc::channel(32);
        for n in 1..=20i64 {
            let payload = format!(
                r#"{{"orderId": {n}, "customerId": {}, "items": [
                    {{"product": "pencil", "quantity": 1, "price": 1.10}}
                ]}}"#,
                n % 3 + 1
            );
            tx.send(payload.into_bytes()).await.unwrap();
        }
        drop(tx);

        Arc::new(consumer).run(rx, 4).await;

        assert_eq!(store.order_count().await, 20);
        assert_eq!(store.customer_count().await, 3);
    }

    #[tokio::test]
    async fn concurrent_orders_for_one_new_customer_create_one_row() {
        let store = InMemoryStore::new();
        let (consumer, _dlq) = setup(&store);

        let (tx, rx) = mpsc::channel(32);
        for n in 1..=8i64 {
            let payload = format!(
                r#"{{"orderId": {n}, "customerId": 42, "items": [
                    {{"product": "pencil", "quantity": 1, "price": 1.10}}
                ]}}"#
            );
            tx.send(payload.into_bytes()).await.unwrap();
        }
        drop(tx);

        Arc::new(consumer).run(rx, 8).await;

        assert_eq!(store.order_count().await, 8);
        assert_eq!(store.customer_count().await, 1);
    }
}
