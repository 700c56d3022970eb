use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, OrderId, Page, PageRequest, Sort, SortDirection, SortField};
use domain::{Customer, CustomerStore, Order, OrderStore, StoreError, StoreResult};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    customers: HashMap<CustomerId, Customer>,
    next_item_id: i64,
}

/// In-memory store implementation for testing and local runs.
///
/// Implements both ports over one shared map so that saving an order and
/// its customer relationship happens under a single write lock, the
/// in-memory equivalent of the Postgres transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the number of persisted customers.
    pub async fn customer_count(&self) -> usize {
        self.inner.read().await.customers.len()
    }

    /// Clears all stored rows.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.orders.clear();
        inner.customers.clear();
        inner.next_item_id = 0;
    }

    fn without_items(order: &Order) -> Order {
        Order::from_stored(
            order.order_id().unwrap_or(OrderId::new(0)),
            order.customer_id().unwrap_or(CustomerId::new(0)),
            order.total_amount(),
            order.items_count(),
            order.created_at().unwrap_or_else(Utc::now),
            Vec::new(),
        )
    }

    fn sort_orders(orders: &mut [Order], sort: Sort) {
        match sort.field {
            SortField::CreatedAt => orders.sort_by_key(|o| o.created_at()),
            SortField::OrderId => orders.sort_by_key(|o| o.order_id()),
        }
        if sort.direction == SortDirection::Descending {
            orders.reverse();
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn exists(&self, order_id: OrderId) -> StoreResult<bool> {
        Ok(self.inner.read().await.orders.contains_key(&order_id))
    }

    async fn save(&self, order: &Order, customer: &Customer) -> StoreResult<Order> {
        let order_id = order.order_id().ok_or(StoreError::MissingIdentity)?;
        let customer_id = customer.customer_id().ok_or(StoreError::MissingIdentity)?;

        let mut inner = self.inner.write().await;

        let mut saved = order.clone();
        saved.set_created_at(Utc::now());
        for item in saved.items_mut() {
            inner.next_item_id += 1;
            item.set_item_id(inner.next_item_id);
        }

        // Establish the relationship: the customer row exists after this
        // save, whether or not the customer port persisted it first.
        inner
            .customers
            .entry(customer_id)
            .or_insert_with(|| {
                let mut row = customer.clone();
                row.set_created_at(Utc::now());
                row
            });

        inner.orders.insert(order_id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&order_id).map(Self::without_items))
    }

    async fn find_by_id_with_items(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&order_id).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
        request: PageRequest,
    ) -> StoreResult<Page<Order>> {
        let inner = self.inner.read().await;

        let mut matching: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.customer_id() == Some(customer_id))
            .map(Self::without_items)
            .collect();

        Self::sort_orders(
            &mut matching,
            request.sort().unwrap_or_else(Sort::created_at_descending),
        );

        let total = matching.len() as u64;
        let content: Vec<Order> = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .collect();

        Ok(Page::new(content, total, request))
    }

    async fn count_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| o.customer_id() == Some(customer_id))
            .count() as u64)
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn find_by_id(&self, customer_id: CustomerId) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner.customers.get(&customer_id).map(|c| {
            let mut row = Customer::new(customer_id);
            if let Some(created_at) = c.created_at() {
                row.set_created_at(created_at);
            }
            row
        }))
    }

    async fn find_by_id_with_orders(
        &self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().await;
        if !inner.customers.contains_key(&customer_id) {
            return Ok(None);
        }

        let orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.customer_id() == Some(customer_id))
            .map(Self::without_items)
            .collect();

        let mut customer = Customer::with_orders(customer_id, orders);
        if let Some(created_at) = inner.customers[&customer_id].created_at() {
            customer.set_created_at(created_at);
        }
        Ok(Some(customer))
    }

    async fn save(&self, customer: &Customer) -> StoreResult<Customer> {
        let customer_id = customer.customer_id().ok_or(StoreError::MissingIdentity)?;

        let mut inner = self.inner.write().await;

        // Idempotent by identity: a conflicting insert returns the
        // existing row untouched.
        if let Some(existing) = inner.customers.get(&customer_id) {
            return Ok(existing.clone());
        }

        let mut saved = customer.clone();
        saved.set_created_at(Utc::now());
        inner.customers.insert(customer_id, saved.clone());
        Ok(saved)
    }

    async fn count_orders_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| o.customer_id() == Some(customer_id))
            .count() as u64)
    }
}
