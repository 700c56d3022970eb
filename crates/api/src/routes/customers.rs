//! Customer query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::{
    CustomerId, DEFAULT_PAGE_SIZE, PageRequest, Sort, SortDirection, SortField,
};
use domain::Order;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

#[derive(Serialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub total_amount: Decimal,
    pub items_count: u32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct CustomerOrdersResponse {
    pub customer_id: i64,
    pub orders: Vec<OrderSummary>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub page: u32,
    pub size: u32,
}

#[derive(Serialize)]
pub struct CustomerOrderCountResponse {
    pub customer_id: i64,
    pub order_count: u64,
}

/// GET /customers/{customer_id}/orders — paginated order history.
#[tracing::instrument(skip(state))]
pub async fn orders(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<CustomerOrdersResponse>, ApiError> {
    let request = page_request(&params)?;

    let page = state
        .get_customer_orders
        .execute(CustomerId::new(customer_id), request)
        .await?;

    let summaries = page.map(summary);
    Ok(Json(CustomerOrdersResponse {
        customer_id,
        total_elements: summaries.total_elements,
        total_pages: summaries.total_pages,
        page: summaries.page,
        size: summaries.size,
        orders: summaries.content,
    }))
}

/// GET /customers/{customer_id}/orders/count — total order count.
#[tracing::instrument(skip(state))]
pub async fn order_count(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<i64>,
) -> Result<Json<CustomerOrderCountResponse>, ApiError> {
    let order_count = state
        .get_customer_order_count
        .execute(CustomerId::new(customer_id))
        .await?;

    Ok(Json(CustomerOrderCountResponse {
        customer_id,
        order_count,
    }))
}

fn summary(order: Order) -> OrderSummary {
    OrderSummary {
        order_id: order.order_id().map(|id| id.get()).unwrap_or_default(),
        total_amount: super::orders::money_json(order.total_amount()),
        items_count: order.items_count(),
        created_at: order.created_at(),
    }
}

/// Builds the page request, leaving it unsorted unless the caller asked
/// for an explicit order.
fn page_request(params: &PageParams) -> Result<PageRequest, ApiError> {
    let request = PageRequest::new(
        params.page.unwrap_or(0),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    let Some(sort_by) = params.sort_by.as_deref() else {
        return Ok(request);
    };

    let field = match sort_by {
        "created_at" => SortField::CreatedAt,
        "order_id" => SortField::OrderId,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown sort field: {other}"
            )));
        }
    };
    let direction = match params.direction.as_deref() {
        None | Some("asc") => SortDirection::Ascending,
        Some("desc") => SortDirection::Descending,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unknown sort direction: {other}"
            )));
        }
    };

    Ok(request.with_sort(Sort::new(field, direction)))
}
