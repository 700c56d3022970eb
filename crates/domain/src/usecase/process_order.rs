//! Idempotent order ingestion.

use std::sync::Arc;
use std::time::Instant;

use common::CustomerId;
use thiserror::Error;

use crate::customer::Customer;
use crate::error::ValidationError;
use crate::order::Order;
use crate::store::{CustomerStore, OrderStore, StoreError, StoreResult};

/// What processing an inbound order amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The order was persisted; the stored row is returned.
    Created(Order),
    /// An order with this identity already exists. Redelivery tolerance:
    /// success, with no side effects.
    Duplicate,
}

/// Why ingestion failed.
#[derive(Debug, Error)]
pub enum ProcessOrderError {
    /// The order failed its validity predicate. Not retryable.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A store failure, propagated unchanged. The delivery collaborator
    /// owns any retry policy.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Makes an untrusted, possibly-duplicate inbound order durable exactly once.
///
/// Steps run strictly in sequence: validate, dedup by order identity,
/// find-or-create the owning customer, persist. A failed attempt is safe to
/// retry end-to-end because the dedup check makes the whole pipeline
/// re-entrant.
pub struct ProcessOrder {
    order_store: Arc<dyn OrderStore>,
    customer_store: Arc<dyn CustomerStore>,
}

impl ProcessOrder {
    pub fn new(order_store: Arc<dyn OrderStore>, customer_store: Arc<dyn CustomerStore>) -> Self {
        Self {
            order_store,
            customer_store,
        }
    }

    #[tracing::instrument(
        skip(self, order),
        fields(order_id = ?order.order_id(), customer_id = ?order.customer_id())
    )]
    pub async fn execute(&self, order: Order) -> Result<ProcessOutcome, ProcessOrderError> {
        let started = Instant::now();

        if let Err(reason) = order.validate() {
            tracing::error!(%reason, "invalid order received");
            metrics::counter!("orders_rejected_total").increment(1);
            return Err(reason.into());
        }

        // Presence of both ids is guaranteed by validation above.
        let order_id = order.order_id().ok_or(ValidationError::MissingOrderId)?;
        let customer_id = order
            .customer_id()
            .ok_or(ValidationError::MissingCustomerId)?;

        if self.order_store.exists(order_id).await? {
            tracing::warn!(%order_id, "order already exists, skipping");
            metrics::counter!("orders_duplicate_total").increment(1);
            return Ok(ProcessOutcome::Duplicate);
        }

        let customer = self.find_or_create_customer(customer_id).await?;

        let saved = self.order_store.save(&order, &customer).await?;

        metrics::counter!("orders_processed_total").increment(1);
        metrics::histogram!("order_processing_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            %order_id,
            total_amount = %saved.total_amount(),
            items_count = saved.items_count(),
            "order processed"
        );

        Ok(ProcessOutcome::Created(saved))
    }

    async fn find_or_create_customer(&self, customer_id: CustomerId) -> StoreResult<Customer> {
        if let Some(customer) = self.customer_store.find_by_id(customer_id).await? {
            return Ok(customer);
        }
        tracing::info!(%customer_id, "creating new customer");
        self.customer_store.save(&Customer::new(customer_id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use common::OrderId;
    use rust_decimal::Decimal;

    use crate::money::Money;
    use crate::order_item::OrderItem;
    use crate::usecase::stubs::{StubCustomerStore, StubOrderStore};

    use super::*;

    fn pencil_order(order_id: i64, customer_id: i64) -> Order {
        Order::new(
            OrderId::new(order_id),
            CustomerId::new(customer_id),
            vec![
                OrderItem::new("pencil", Some(100), Some(Money::new(Decimal::new(110, 2)))),
                OrderItem::new("notebook", Some(10), Some(Money::new(Decimal::new(100, 2)))),
            ],
        )
    }

    fn use_case(
        orders: Arc<StubOrderStore>,
        customers: Arc<StubCustomerStore>,
    ) -> ProcessOrder {
        ProcessOrder::new(orders, customers)
    }

    #[tokio::test]
    async fn persists_a_valid_order_and_creates_its_customer() {
        let orders = Arc::new(StubOrderStore::new());
        let customers = Arc::new(StubCustomerStore::new());
        let process = use_case(orders.clone(), customers.clone());

        let outcome = process.execute(pencil_order(1001, 1)).await.unwrap();

        let ProcessOutcome::Created(saved) = outcome else {
            panic!("expected Created outcome");
        };
        assert_eq!(saved.items_count(), 2);
        assert_eq!(saved.total_amount(), Money::from(120));
        assert!(saved.created_at().is_some());
        assert_eq!(orders.len(), 1);
        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn invalid_order_is_rejected_before_any_store_access() {
        let orders = Arc::new(StubOrderStore::new());
        let customers = Arc::new(StubCustomerStore::new());
        let process = use_case(orders.clone(), customers.clone());

        let empty = Order::new(OrderId::new(1), CustomerId::new(1), vec![]);
        let err = process.execute(empty).await.unwrap_err();

        assert!(matches!(
            err,
            ProcessOrderError::Invalid(ValidationError::NoItems)
        ));
        assert!(err.to_string().starts_with("Invalid order data"));
        assert_eq!(orders.exists_calls.load(Ordering::SeqCst), 0);
        assert_eq!(orders.save_calls.load(Ordering::SeqCst), 0);
        assert_eq!(customers.find_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_order_is_a_successful_noop() {
        let orders = Arc::new(StubOrderStore::new());
        let customers = Arc::new(StubCustomerStore::new());
        let process = use_case(orders.clone(), customers.clone());

        process.execute(pencil_order(1001, 1)).await.unwrap();
        let saves_after_first = orders.save_calls.load(Ordering::SeqCst);
        let customer_saves_after_first = customers.save_calls.load(Ordering::SeqCst);

        let outcome = process.execute(pencil_order(1001, 1)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Duplicate);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders.save_calls.load(Ordering::SeqCst), saves_after_first);
        assert_eq!(
            customers.save_calls.load(Ordering::SeqCst),
            customer_saves_after_first
        );
    }

    #[tokio::test]
    async fn duplicate_check_happens_before_customer_resolution() {
        let orders = Arc::new(StubOrderStore::new());
        let customers = Arc::new(StubCustomerStore::new());
        orders.insert(pencil_order(1001, 1));
        let process = use_case(orders.clone(), customers.clone());

        let outcome = process.execute(pencil_order(1001, 1)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Duplicate);
        assert_eq!(customers.find_calls.load(Ordering::SeqCst), 0);
        assert_eq!(customers.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn existing_customer_is_not_recreated() {
        let orders = Arc::new(StubOrderStore::new());
        let customers = Arc::new(StubCustomerStore::new());
        customers.insert(Customer::new(CustomerId::new(1)));
        let process = use_case(orders.clone(), customers.clone());

        process.execute(pencil_order(1001, 1)).await.unwrap();

        assert_eq!(customers.save_calls.load(Ordering::SeqCst), 0);
        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn two_orders_for_the_same_new_customer_create_one_customer() {
        let orders = Arc::new(StubOrderStore::new());
        let customers = Arc::new(StubCustomerStore::new());
        let process = use_case(orders.clone(), customers.clone());

        process.execute(pencil_order(1001, 7)).await.unwrap();
        process.execute(pencil_order(1002, 7)).await.unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_propagates_and_is_retryable() {
        let orders = Arc::new(StubOrderStore::failing_saves());
        let customers = Arc::new(StubCustomerStore::new());
        let process = use_case(orders.clone(), customers.clone());

        let err = process.execute(pencil_order(1001, 1)).await.unwrap_err();
        assert!(matches!(err, ProcessOrderError::Store(_)));

        // The customer row from the failed attempt remains; a retry simply
        // finds it instead of creating another.
        assert_eq!(customers.len(), 1);
        let retry = use_case(
            Arc::new(StubOrderStore::new()),
            customers.clone(),
        );
        retry.execute(pencil_order(1001, 1)).await.unwrap();
        assert_eq!(customers.len(), 1);
    }
}
