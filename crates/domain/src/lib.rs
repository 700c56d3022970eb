//! Domain layer for the order service.
//!
//! This crate provides the aggregate model and the rules around it:
//! - `Order`, `OrderItem`, and `Customer` entities with eager total
//!   recomputation
//! - `OrderStore` / `CustomerStore` ports the persistence layer implements
//! - the ingestion use case (`ProcessOrder`) and the query use cases
//!   (`GetOrderTotal`, `GetCustomerOrderCount`, `GetCustomerOrders`)

pub mod customer;
pub mod error;
pub mod money;
pub mod order;
pub mod order_item;
pub mod store;
pub mod usecase;

pub use customer::Customer;
pub use error::ValidationError;
pub use money::Money;
pub use order::Order;
pub use order_item::OrderItem;
pub use store::{CustomerStore, OrderStore, StoreError, StoreResult};
pub use usecase::{
    GetCustomerOrderCount, GetCustomerOrders, GetCustomerOrdersError, GetOrderTotal, ProcessOrder,
    ProcessOrderError, ProcessOutcome,
};
