//! Customer order route handlers: checkout, history, cancellation.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{ApiJson, ApiPath, ApiQuery, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::{Order, OrderDetail, ShippingInfo};
use crate::models::{Page, PageRequest};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

const DEFAULT_ORDER_PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutRequest {
    pub shipping_info: ShippingInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// POST /orders
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let order = CheckoutService::new(state.pool())
        .place_order(user.id, &body.shipping_info)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<Json<Page<Order>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_ORDER_PAGE_SIZE)?;
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_user(user.id, page)
        .await?;
    Ok(Json(Page::new(orders, page, total)))
}

/// GET /orders/{id}
///
/// Another user's order is reported as not found.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
    let items = orders.items_of(order.id).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        notes: None,
    }))
}

/// POST /orders/{id}/cancel
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = CheckoutService::new(state.pool())
        .cancel_own(id, user.id)
        .await?;
    Ok(Json(order))
}
