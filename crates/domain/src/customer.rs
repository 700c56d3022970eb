//! Customer entity.

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// A customer referenced by orders.
///
/// The order list is only populated when the customer is explicitly loaded
/// "with orders"; counts and listings served to callers always come from the
/// store, never from this in-memory list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    customer_id: Option<CustomerId>,
    created_at: Option<DateTime<Utc>>,
    orders: Option<Vec<Order>>,
}

impl Customer {
    /// Creates a customer without a loaded order list.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            created_at: None,
            orders: None,
        }
    }

    /// Creates a customer with its associated orders loaded.
    pub fn with_orders(customer_id: CustomerId, orders: Vec<Order>) -> Self {
        Self {
            customer_id: Some(customer_id),
            created_at: None,
            orders: Some(orders),
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Timestamp assigned by the store; `None` until persisted.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
    }

    /// The loaded order list, if this customer was loaded with orders.
    pub fn orders(&self) -> Option<&[Order]> {
        self.orders.as_deref()
    }

    /// Size of the loaded order list; zero when not loaded.
    pub fn total_orders(&self) -> usize {
        self.orders.as_ref().map_or(0, Vec::len)
    }

    pub fn has_orders(&self) -> bool {
        self.orders.as_ref().is_some_and(|orders| !orders.is_empty())
    }

    /// A valid customer has a present, strictly positive identity.
    pub fn is_valid(&self) -> bool {
        self.customer_id.is_some_and(|id| id.is_valid())
    }

    /// Associates an order with this customer.
    ///
    /// Silently a no-op unless the order list is loaded and the order's
    /// owning-customer identity matches this customer's identity.
    pub fn add_order(&mut self, order: Order) {
        let matches_owner = match (self.customer_id, order.customer_id()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        };
        if matches_owner && let Some(orders) = self.orders.as_mut() {
            orders.push(order);
        }
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;
    use rust_decimal::Decimal;

    use crate::money::Money;
    use crate::order_item::OrderItem;

    use super::*;

    fn order_for(customer_id: i64) -> Order {
        Order::new(
            OrderId::new(1001),
            CustomerId::new(customer_id),
            vec![OrderItem::new(
                "pencil",
                Some(1),
                Some(Money::new(Decimal::new(110, 2))),
            )],
        )
    }

    #[test]
    fn validity_requires_positive_identity() {
        assert!(Customer::new(CustomerId::new(1)).is_valid());
        assert!(!Customer::new(CustomerId::new(0)).is_valid());
        assert!(!Customer::new(CustomerId::new(-5)).is_valid());
        assert!(!Customer::default().is_valid());
    }

    #[test]
    fn add_order_appends_matching_order() {
        let mut customer = Customer::with_orders(CustomerId::new(1), vec![]);
        customer.add_order(order_for(1));

        assert_eq!(customer.total_orders(), 1);
        assert!(customer.has_orders());
    }

    #[test]
    fn add_order_ignores_foreign_order() {
        let mut customer = Customer::with_orders(CustomerId::new(1), vec![]);
        customer.add_order(order_for(2));

        assert_eq!(customer.total_orders(), 0);
    }

    #[test]
    fn add_order_without_loaded_list_is_a_noop() {
        let mut customer = Customer::new(CustomerId::new(1));
        customer.add_order(order_for(1));

        assert_eq!(customer.total_orders(), 0);
        assert!(customer.orders().is_none());
    }

    #[test]
    fn add_order_ignores_order_without_owner() {
        let mut customer = Customer::with_orders(CustomerId::new(1), vec![]);
        let orphan = Order::from_message_parts(Some(OrderId::new(1)), None, vec![]);
        customer.add_order(orphan);

        assert_eq!(customer.total_orders(), 0);
    }

    #[test]
    fn counts_come_from_loaded_list() {
        let customer = Customer::with_orders(CustomerId::new(1), vec![order_for(1), order_for(1)]);
        assert_eq!(customer.total_orders(), 2);

        let unloaded = Customer::new(CustomerId::new(1));
        assert_eq!(unloaded.total_orders(), 0);
        assert!(!unloaded.has_orders());
    }
}
