//! Admin order management.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{ApiJson, ApiPath, ApiQuery, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::{Order, OrderDetail, OrderNote};
use crate::models::{Page, PageRequest};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

const DEFAULT_ADMIN_ORDER_PAGE_SIZE: u32 = 20;
const MAX_NOTE_LENGTH: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NoteRequest {
    pub body: String,
}

impl NoteRequest {
    fn validate(&self) -> Result<&str> {
        let body = self.body.trim();
        if body.is_empty() || body.chars().count() > MAX_NOTE_LENGTH {
            return Err(AppError::BadRequest(format!(
                "note must be 1 to {MAX_NOTE_LENGTH} characters"
            )));
        }
        Ok(body)
    }
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_owned())
}

/// GET /admin/orders
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiQuery(query): ApiQuery<AdminOrderQuery>,
) -> Result<Json<Page<Order>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_ADMIN_ORDER_PAGE_SIZE)?;
    let (orders, total) = OrderRepository::new(state.pool())
        .list(query.status, page)
        .await?;
    Ok(Json(Page::new(orders, page, total)))
}

/// GET /admin/orders/{id}
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders.get(id).await?.ok_or_else(order_not_found)?;
    let items = orders.items_of(id).await?;
    let notes = orders.notes(id).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        notes: Some(notes),
    }))
}

/// PATCH /admin/orders/{id}/status
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<Json<OrderDetail>> {
    let mut detail = CheckoutService::new(state.pool())
        .set_status(id, body.status)
        .await?;
    detail.notes = Some(OrderRepository::new(state.pool()).notes(id).await?);
    Ok(Json(detail))
}

/// POST /admin/orders/{id}/notes
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn add_note(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<NoteRequest>,
) -> Result<(StatusCode, Json<OrderNote>)> {
    let note = OrderRepository::new(state.pool())
        .add_note(id, admin.id, body.validate()?)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(),
            other => other.into(),
        })?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_note_length_bounds() {
        let blank = NoteRequest { body: "   ".to_owned() };
        assert!(blank.validate().is_err());

        let long = NoteRequest {
            body: "x".repeat(MAX_NOTE_LENGTH + 1),
        };
        assert!(long.validate().is_err());

        let ok = NoteRequest {
            body: "  Called the customer ".to_owned(),
        };
        assert_eq!(ok.validate().unwrap(), "Called the customer");
    }

    #[test]
    fn test_status_request_parses() {
        let body: StatusUpdateRequest =
            serde_json::from_value(serde_json::json!({ "status": "shipped" })).unwrap();
        assert_eq!(body.status, OrderStatus::Shipped);

        assert!(
            serde_json::from_value::<StatusUpdateRequest>(serde_json::json!({ "status": "lost" }))
                .is_err()
        );
    }
}
