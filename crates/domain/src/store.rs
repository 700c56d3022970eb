//! Persistence ports consumed by the use cases.
//!
//! The domain owns these interfaces; the `store` crate provides the
//! implementations. All lookups report absence as `Option`, never as an
//! error, and "already exists" is an explicit query rather than a caught
//! failure.

use async_trait::async_trait;
use common::{CustomerId, OrderId, Page, PageRequest};
use thiserror::Error;

use crate::customer::Customer;
use crate::order::Order;

/// Failure inside a store implementation, propagated to callers unchanged.
/// The domain adds no retry, backoff, or suppression around these.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The entity handed to `save` carries no identity.
    #[error("Entity is missing its identity")]
    MissingIdentity,

    /// The backing store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence port for orders.
///
/// Implementations must be thread-safe; handlers on separate workers call
/// them concurrently. Pagination math (offset/limit, total-pages ceiling)
/// belongs to the implementation, not the caller.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Returns true if an order with this identity is already persisted.
    async fn exists(&self, order_id: OrderId) -> StoreResult<bool>;

    /// Persists the order, associating it with the given customer, and
    /// returns the stored row (ids and `created_at` assigned).
    async fn save(&self, order: &Order, customer: &Customer) -> StoreResult<Order>;

    /// Loads an order without its items.
    async fn find_by_id(&self, order_id: OrderId) -> StoreResult<Option<Order>>;

    /// Loads an order together with its items.
    async fn find_by_id_with_items(&self, order_id: OrderId) -> StoreResult<Option<Order>>;

    /// Loads one page of a customer's orders (without items).
    async fn find_by_customer_id(
        &self,
        customer_id: CustomerId,
        request: PageRequest,
    ) -> StoreResult<Page<Order>>;

    /// Counts a customer's orders.
    async fn count_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64>;
}

/// Persistence port for customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Loads a customer without orders.
    async fn find_by_id(&self, customer_id: CustomerId) -> StoreResult<Option<Customer>>;

    /// Loads a customer together with its orders (without items).
    async fn find_by_id_with_orders(
        &self,
        customer_id: CustomerId,
    ) -> StoreResult<Option<Customer>>;

    /// Persists the customer and returns the stored row.
    ///
    /// Must be idempotent by identity: a save that conflicts with an
    /// existing row is a successful no-op returning the existing row.
    /// Concurrent saves of the same identity must not create duplicates.
    async fn save(&self, customer: &Customer) -> StoreResult<Customer>;

    /// Counts the customer's orders.
    async fn count_orders_by_customer_id(&self, customer_id: CustomerId) -> StoreResult<u64>;
}
