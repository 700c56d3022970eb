//! Wire schema for inbound order messages.

use common::{CustomerId, OrderId};
use domain::{Money, Order, OrderItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One order per message.
///
/// Every field is optional on the wire so that an incomplete message still
/// parses and reaches validation, where it is rejected with a reason,
/// instead of failing opaquely at the JSON layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMessage {
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<OrderItemMessage>,
}

/// One line item of an order message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemMessage {
    pub product: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<Decimal>,
}

/// Translates a parsed message into the domain order graph.
///
/// Deterministic and total: each message item maps 1:1, in order, to a
/// domain item, and nothing is dropped. A line item with a missing field
/// maps to an invalid item the ingestion use case then rejects as a whole.
pub fn order_from_message(message: OrderMessage) -> Order {
    let items = message.items.into_iter().map(item_from_message).collect();

    Order::from_message_parts(
        message.order_id.map(OrderId::new),
        message.customer_id.map(CustomerId::new),
        items,
    )
}

fn item_from_message(item: OrderItemMessage) -> OrderItem {
    OrderItem::new(
        item.product.unwrap_or_default(),
        item.quantity,
        item.price.map(Money::new),
    )
}
