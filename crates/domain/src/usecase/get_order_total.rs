//! Order total lookup.

use std::sync::Arc;

use common::OrderId;

use crate::order::Order;
use crate::store::{OrderStore, StoreResult};

/// Loads an order with its items and recomputes its totals.
///
/// The persisted total is never trusted blindly; the domain recomputation
/// is authoritative. Absence is a typed `None`, and a degenerate identity
/// short-circuits without touching the store.
pub struct GetOrderTotal {
    order_store: Arc<dyn OrderStore>,
}

impl GetOrderTotal {
    pub fn new(order_store: Arc<dyn OrderStore>) -> Self {
        Self { order_store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        if !order_id.is_valid() {
            tracing::warn!(%order_id, "invalid order id");
            return Ok(None);
        }

        let Some(mut order) = self.order_store.find_by_id_with_items(order_id).await? else {
            tracing::warn!(%order_id, "order not found");
            return Ok(None);
        };

        order.update_totals();

        tracing::info!(
            %order_id,
            total_amount = %order.total_amount(),
            items_count = order.items_count(),
            "order found"
        );

        Ok(Some(order))
    }
}
