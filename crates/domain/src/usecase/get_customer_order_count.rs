//! Customer order count lookup.

use std::sync::Arc;

use common::CustomerId;

use crate::store::{CustomerStore, StoreResult};

/// Returns the store's order count for a customer.
///
/// A degenerate identity yields zero without touching the store; malformed
/// input never reaches persistence.
pub struct GetCustomerOrderCount {
    customer_store: Arc<dyn CustomerStore>,
}

impl GetCustomerOrderCount {
    pub fn new(customer_store: Arc<dyn CustomerStore>) -> Self {
        Self { customer_store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, customer_id: CustomerId) -> StoreResult<u64> {
        if !customer_id.is_valid() {
            tracing::warn!(%customer_id, "invalid customer id");
            return Ok(0);
        }

        let count = self
            .customer_store
            .count_orders_by_customer_id(customer_id)
            .await?;

        tracing::info!(%customer_id, count, "order count");

        Ok(count)
    }
}
