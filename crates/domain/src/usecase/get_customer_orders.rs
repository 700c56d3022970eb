//! Paginated customer order history.

use std::sync::Arc;

use common::{CustomerId, Page, PageRequest, Sort};
use thiserror::Error;

use crate::order::Order;
use crate::store::{CustomerStore, OrderStore, StoreError};

/// Why a customer order listing failed.
#[derive(Debug, Error)]
pub enum GetCustomerOrdersError {
    /// The customer does not exist, or the supplied identity is degenerate.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// A store failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lists a customer's orders one page at a time.
///
/// Existence of the customer is checked first; an unsorted request gets the
/// default ordering (creation time, most recent first) while an explicit
/// sort passes through unmodified. The page math itself is the store's.
pub struct GetCustomerOrders {
    order_store: Arc<dyn OrderStore>,
    customer_store: Arc<dyn CustomerStore>,
}

impl GetCustomerOrders {
    pub fn new(order_store: Arc<dyn OrderStore>, customer_store: Arc<dyn CustomerStore>) -> Self {
        Self {
            order_store,
            customer_store,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(
        &self,
        customer_id: CustomerId,
        request: PageRequest,
    ) -> Result<Page<Order>, GetCustomerOrdersError> {
        if !customer_id.is_valid() {
            tracing::warn!(%customer_id, "invalid customer id");
            return Err(GetCustomerOrdersError::CustomerNotFound(customer_id));
        }

        if self
            .customer_store
            .find_by_id(customer_id)
            .await?
            .is_none()
        {
            tracing::warn!(%customer_id, "customer not found");
            return Err(GetCustomerOrdersError::CustomerNotFound(customer_id));
        }

        let request = Self::with_default_sort(request);

        let page = self
            .order_store
            .find_by_customer_id(customer_id, request)
            .await?;

        tracing::info!(
            %customer_id,
            found = page.len(),
            page = page.page,
            total_pages = page.total_pages,
            "customer orders"
        );

        Ok(page)
    }

    fn with_default_sort(request: PageRequest) -> PageRequest {
        if request.is_unsorted() {
            request.with_sort(Sort::created_at_descending())
        } else {
            request
        }
    }
}
