//! Order query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct OrderTotalResponse {
    pub order_id: i64,
    pub total_amount: Decimal,
    pub items_count: u32,
}

/// GET /orders/{order_id}/total — total and item count for one order.
#[tracing::instrument(skip(state))]
pub async fn total(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderTotalResponse>, ApiError> {
    let order = state
        .get_order_total
        .execute(OrderId::new(order_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))?;

    Ok(Json(OrderTotalResponse {
        order_id,
        total_amount: money_json(order.total_amount()),
        items_count: order.items_count(),
    }))
}

/// Money leaves the API with exactly two decimal places, whatever scale
/// the arithmetic produced.
pub(crate) fn money_json(money: domain::Money) -> Decimal {
    let mut amount = money.amount();
    amount.rescale(2);
    amount
}
