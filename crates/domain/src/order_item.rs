//! Order line item entity.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A single line of an order.
///
/// The total is derived state: any mutation of quantity or price recomputes
/// it before the setter returns, so a stale total is never observable. An
/// absent quantity or price makes the total zero rather than an error; the
/// validity predicate is what rejects such items at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    item_id: Option<i64>,
    product: String,
    quantity: Option<u32>,
    price: Option<Money>,
    total_price: Money,
}

impl OrderItem {
    /// Creates an item and computes its total.
    pub fn new(product: impl Into<String>, quantity: Option<u32>, price: Option<Money>) -> Self {
        let mut item = Self {
            item_id: None,
            product: product.into(),
            quantity,
            price,
            total_price: Money::zero(),
        };
        item.update_total_price();
        item
    }

    /// Identity assigned by the store on save; `None` until persisted.
    pub fn item_id(&self) -> Option<i64> {
        self.item_id
    }

    pub fn set_item_id(&mut self, item_id: i64) {
        self.item_id = Some(item_id);
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn price(&self) -> Option<Money> {
        self.price
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Sets the quantity and recomputes the total.
    pub fn set_quantity(&mut self, quantity: Option<u32>) {
        self.quantity = quantity;
        self.update_total_price();
    }

    /// Sets the unit price and recomputes the total.
    pub fn set_price(&mut self, price: Option<Money>) {
        self.price = price;
        self.update_total_price();
    }

    /// Recomputes `total_price = price × quantity`, zero when either is absent.
    pub fn update_total_price(&mut self) {
        self.total_price = match (self.price, self.quantity) {
            (Some(price), Some(quantity)) => price.multiply(quantity),
            _ => Money::zero(),
        };
    }

    /// A valid item has a non-blank product, a positive quantity, and a
    /// non-negative price.
    pub fn is_valid(&self) -> bool {
        !self.product.trim().is_empty()
            && self.quantity.is_some_and(|q| q > 0)
            && self.price.is_some_and(|p| !p.is_negative())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn price(mantissa: i64, scale: u32) -> Option<Money> {
        Some(Money::new(Decimal::new(mantissa, scale)))
    }

    #[test]
    fn total_is_price_times_quantity() {
        let item = OrderItem::new("pencil", Some(100), price(110, 2));
        assert_eq!(item.total_price(), Money::from(110));
    }

    #[test]
    fn missing_price_gives_zero_total() {
        let item = OrderItem::new("pencil", Some(100), None);
        assert_eq!(item.total_price(), Money::zero());
    }

    #[test]
    fn missing_quantity_gives_zero_total() {
        let item = OrderItem::new("pencil", None, price(110, 2));
        assert_eq!(item.total_price(), Money::zero());
    }

    #[test]
    fn set_quantity_recomputes_total() {
        let mut item = OrderItem::new("notebook", Some(10), price(100, 2));
        assert_eq!(item.total_price(), Money::from(10));

        item.set_quantity(Some(20));
        assert_eq!(item.total_price(), Money::from(20));

        item.set_quantity(None);
        assert_eq!(item.total_price(), Money::zero());
    }

    #[test]
    fn set_price_recomputes_total() {
        let mut item = OrderItem::new("notebook", Some(10), price(100, 2));

        item.set_price(price(250, 2));
        assert_eq!(item.total_price(), Money::new(Decimal::new(2500, 2)));

        item.set_price(None);
        assert_eq!(item.total_price(), Money::zero());
    }

    #[test]
    fn validity_requires_all_fields() {
        assert!(OrderItem::new("pencil", Some(1), price(0, 0)).is_valid());

        assert!(!OrderItem::new("", Some(1), price(100, 2)).is_valid());
        assert!(!OrderItem::new("   ", Some(1), price(100, 2)).is_valid());
        assert!(!OrderItem::new("pencil", Some(0), price(100, 2)).is_valid());
        assert!(!OrderItem::new("pencil", None, price(100, 2)).is_valid());
        assert!(!OrderItem::new("pencil", Some(1), None).is_valid());
        assert!(!OrderItem::new("pencil", Some(1), price(-100, 2)).is_valid());
    }

    #[test]
    fn item_id_is_absent_until_assigned() {
        let mut item = OrderItem::new("pencil", Some(1), price(100, 2));
        assert_eq!(item.item_id(), None);

        item.set_item_id(7);
        assert_eq!(item.item_id(), Some(7));
    }
}
