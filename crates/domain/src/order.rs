//! Order aggregate.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::order_item::OrderItem;

/// An order and its line items, treated as one consistency unit.
///
/// `total_amount` and `items_count` are derived from the item list and are
/// recomputed synchronously whenever the list is replaced, an item is
/// appended, or [`Order::update_totals`] is called after an in-place item
/// mutation. Identity and the creation timestamp come from outside the
/// domain: the order id from the inbound message, `created_at` from the
/// store on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    order_id: Option<OrderId>,
    customer_id: Option<CustomerId>,
    total_amount: Money,
    items_count: u32,
    created_at: Option<DateTime<Utc>>,
    items: Vec<OrderItem>,
}

impl Order {
    /// Creates an order and computes its derived totals.
    pub fn new(order_id: OrderId, customer_id: CustomerId, items: Vec<OrderItem>) -> Self {
        let mut order = Self {
            order_id: Some(order_id),
            customer_id: Some(customer_id),
            total_amount: Money::zero(),
            items_count: 0,
            created_at: None,
            items,
        };
        order.update_totals();
        order
    }

    /// Creates an order whose identity fields may be absent, as produced by
    /// the inbound message adapter. Totals are still computed.
    pub fn from_message_parts(
        order_id: Option<OrderId>,
        customer_id: Option<CustomerId>,
        items: Vec<OrderItem>,
    ) -> Self {
        let mut order = Self {
            order_id,
            customer_id,
            total_amount: Money::zero(),
            items_count: 0,
            created_at: None,
            items,
        };
        order.update_totals();
        order
    }

    /// Rebuilds an order from a stored row.
    ///
    /// Derived fields are taken verbatim from the row (a listing loaded
    /// without items must still report its persisted totals); callers that
    /// need authoritative totals run [`Order::update_totals`] afterwards.
    pub fn from_stored(
        order_id: OrderId,
        customer_id: CustomerId,
        total_amount: Money,
        items_count: u32,
        created_at: DateTime<Utc>,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            order_id: Some(order_id),
            customer_id: Some(customer_id),
            total_amount,
            items_count,
            created_at: Some(created_at),
            items,
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn items_count(&self) -> u32 {
        self.items_count
    }

    /// Timestamp assigned by the store; `None` until persisted.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Mutable access for in-place item edits. Callers that mutate through
    /// this must invoke [`Order::update_totals`] afterwards.
    pub fn items_mut(&mut self) -> &mut Vec<OrderItem> {
        &mut self.items
    }

    /// Sums the item totals. Pure; does not touch any state.
    pub fn calculate_total_amount(&self) -> Money {
        self.items.iter().map(OrderItem::total_price).sum()
    }

    /// Recomputes `items_count`, every item's total, and `total_amount`.
    pub fn update_totals(&mut self) {
        self.items_count = self.items.len() as u32;
        for item in &mut self.items {
            item.update_total_price();
        }
        self.total_amount = self.calculate_total_amount();
    }

    /// Replaces the item list and recomputes totals.
    pub fn set_items(&mut self, items: Vec<OrderItem>) {
        self.items = items;
        self.update_totals();
    }

    /// Appends an item and recomputes totals.
    pub fn add_item(&mut self, item: OrderItem) {
        self.items.push(item);
        self.update_totals();
    }

    /// A valid order has both identities, at least one item, and only valid
    /// items.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks the validity predicate, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_id.is_none() {
            return Err(ValidationError::MissingOrderId);
        }
        if self.customer_id.is_none() {
            return Err(ValidationError::MissingCustomerId);
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        if let Some(index) = self.items.iter().position(|item| !item.is_valid()) {
            return Err(ValidationError::InvalidItem { index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn item(product: &str, quantity: u32, mantissa: i64, scale: u32) -> OrderItem {
        OrderItem::new(
            product,
            Some(quantity),
            Some(Money::new(Decimal::new(mantissa, scale))),
        )
    }

    fn pencil_and_notebook() -> Vec<OrderItem> {
        vec![item("pencil", 100, 110, 2), item("notebook", 10, 100, 2)]
    }

    #[test]
    fn construction_computes_totals() {
        let order = Order::new(OrderId::new(1001), CustomerId::new(1), pencil_and_notebook());

        assert_eq!(order.items_count(), 2);
        assert_eq!(order.total_amount(), Money::from(120));
    }

    #[test]
    fn empty_order_has_zero_totals() {
        let order = Order::new(OrderId::new(1), CustomerId::new(1), vec![]);
        assert_eq!(order.items_count(), 0);
        assert_eq!(order.total_amount(), Money::zero());
    }

    #[test]
    fn calculate_total_amount_is_pure() {
        let order = Order::new(OrderId::new(1), CustomerId::new(1), pencil_and_notebook());
        let before = order.clone();

        let total = order.calculate_total_amount();

        assert_eq!(total, Money::from(120));
        assert_eq!(order, before);
    }

    #[test]
    fn item_with_missing_price_counts_but_adds_nothing() {
        let items = vec![
            item("pencil", 100, 110, 2),
            OrderItem::new("mystery", Some(3), None),
        ];
        let order = Order::new(OrderId::new(1), CustomerId::new(1), items);

        assert_eq!(order.items_count(), 2);
        assert_eq!(order.total_amount(), Money::from(110));
    }

    #[test]
    fn set_items_recomputes_totals() {
        let mut order = Order::new(OrderId::new(1), CustomerId::new(1), pencil_and_notebook());

        order.set_items(vec![item("eraser", 2, 50, 2)]);

        assert_eq!(order.items_count(), 1);
        assert_eq!(order.total_amount(), Money::new(Decimal::new(100, 2)));
    }

    #[test]
    fn add_item_recomputes_totals() {
        let mut order = Order::new(OrderId::new(1), CustomerId::new(1), vec![]);

        order.add_item(item("pencil", 100, 110, 2));
        assert_eq!(order.items_count(), 1);
        assert_eq!(order.total_amount(), Money::from(110));

        order.add_item(item("notebook", 10, 100, 2));
        assert_eq!(order.items_count(), 2);
        assert_eq!(order.total_amount(), Money::from(120));
    }

    #[test]
    fn update_totals_repairs_in_place_mutation() {
        let mut order = Order::new(OrderId::new(1), CustomerId::new(1), pencil_and_notebook());

        order.items_mut()[0].set_quantity(Some(200));
        order.items_mut().remove(1);
        order.update_totals();

        assert_eq!(order.items_count(), 1);
        assert_eq!(order.total_amount(), Money::from(220));
    }

    #[test]
    fn validity_predicate() {
        let valid = Order::new(OrderId::new(1), CustomerId::new(1), pencil_and_notebook());
        assert!(valid.is_valid());

        let no_order_id =
            Order::from_message_parts(None, Some(CustomerId::new(1)), pencil_and_notebook());
        assert_eq!(
            no_order_id.validate(),
            Err(ValidationError::MissingOrderId)
        );

        let no_customer =
            Order::from_message_parts(Some(OrderId::new(1)), None, pencil_and_notebook());
        assert_eq!(
            no_customer.validate(),
            Err(ValidationError::MissingCustomerId)
        );

        let empty = Order::new(OrderId::new(1), CustomerId::new(1), vec![]);
        assert_eq!(empty.validate(), Err(ValidationError::NoItems));

        let bad_item = Order::new(
            OrderId::new(1),
            CustomerId::new(1),
            vec![item("pencil", 100, 110, 2), OrderItem::new("", Some(1), None)],
        );
        assert_eq!(
            bad_item.validate(),
            Err(ValidationError::InvalidItem { index: 1 })
        );
    }

    #[test]
    fn created_at_comes_from_outside() {
        let mut order = Order::new(OrderId::new(1), CustomerId::new(1), pencil_and_notebook());
        assert_eq!(order.created_at(), None);

        let now = Utc::now();
        order.set_created_at(now);
        assert_eq!(order.created_at(), Some(now));
    }
}
