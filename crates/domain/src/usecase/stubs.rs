//! Recording store stubs for use-case tests.
//!
//! Call counters make "the store was never touched" assertions possible,
//! and the customer stub's conflict-is-a-no-op save mirrors the idempotent
//! upsert contract of the real implementations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, OrderId, Page, PageRequest};

use crate::customer::Customer;
use crate::order::Order;
use crate::store::{CustomerStore, OrderStore, StoreError, StoreResult};

#[derive(Default)]
pub struct StubOrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
    pub exists_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub find_with_items_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    pub last_page_request: Mutex<Option<PageRequest>>,
    pub fail_saves: bool,
}

impl StubOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, order: Order) {
        let id = order.order_id().expect("stub orders need an id");
        self.orders.lock().unwrap().insert(id, order);
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        self.orders.lock().unwrap().get(&order_id).cloned()
    }
}

#[async_trait]
impl OrderStore for StubOrderStore {
    async fn exists(&self, order_id: OrderId) -> StoreResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().unwrap().contains_key(&order_id))
    }

    async fn save(&self, order: &Order, _customer: &Customer) -> StoreResult<Order> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(StoreError::Unavailable("stub save failure".into()));
        }
        let mut saved = order.clone();
        saved.set_created_at(Utc::now());
        let id = saved.order_id().expect("saved orders carry an id");
        self.orders.lock().unwrap().insert(id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&order_id).cloned())
    }

    async fn find_by_id_with_items(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        self.find_with_items_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().unwrap().get(&order_id).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
        request: PageRequest,
    ) -> StoreResult<Page<Order>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_page_request.lock().unwrap() = Some(request);

        let orders = self.orders.lock().unwrap();
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.customer_id() == Some(customer_id))
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.order_id());

        let total = matching.len() as u64;
        let content: Vec<Order> = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .collect();
        Ok(Page::new(content, total, request))
    }

    async fn count_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .values()
            .filter(|o| o.customer_id() == Some(customer_id))
            .count() as u64)
    }
}

#[derive(Default)]
pub struct StubCustomerStore {
    customers: Mutex<HashMap<CustomerId, Customer>>,
    order_counts: Mutex<HashMap<CustomerId, u64>>,
    pub find_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
}

impl StubCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, customer: Customer) {
        let id = customer.customer_id().expect("stub customers need an id");
        self.customers.lock().unwrap().insert(id, customer);
    }

    pub fn set_order_count(&self, customer_id: CustomerId, count: u64) {
        self.order_counts.lock().unwrap().insert(customer_id, count);
    }

    pub fn len(&self) -> usize {
        self.customers.lock().unwrap().len()
    }
}

#[async_trait]
impl CustomerStore for StubCustomerStore {
    async fn find_by_id(&self, customer_id: CustomerId) -> StoreResult<Option<Customer>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.customers.lock().unwrap().get(&customer_id).cloned())
    }

    async fn find_by_id_with_orders(
        &self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        Ok(self.customers.lock().unwrap().get(&customer_id).cloned())
    }

    async fn save(&self, customer: &Customer) -> StoreResult<Customer> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let id = customer.customer_id().expect("saved customers carry an id");

        let mut customers = self.customers.lock().unwrap();
        if let Some(existing) = customers.get(&id) {
            // Conflicting insert is a successful no-op returning the row.
            return Ok(existing.clone());
        }
        let mut saved = customer.clone();
        saved.set_created_at(Utc::now());
        customers.insert(id, saved.clone());
        Ok(saved)
    }

    async fn count_orders_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self
            .order_counts
            .lock()
            .unwrap()
            .get(&customer_id)
            .unwrap_or(&0))
    }
}
