//! Admin dashboard.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::dashboard::{StatusCount, Totals};
use crate::db::{DashboardRepository, OrderRepository, ProductRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::PageRequest;
use crate::models::order::Order;
use crate::models::product::Product;
use crate::state::AppState;

/// Products at or below this inventory count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

const RECENT_ORDER_COUNT: u32 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub totals: Totals,
    pub orders_by_status: Vec<StatusCount>,
    pub low_stock: Vec<Product>,
    pub recent_orders: Vec<Order>,
}

/// GET /admin/dashboard
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Dashboard>> {
    let dashboard = DashboardRepository::new(state.pool());
    let totals = dashboard.totals().await?;
    let orders_by_status = dashboard.orders_by_status().await?;
    let low_stock = ProductRepository::new(state.pool())
        .low_stock(LOW_STOCK_THRESHOLD)
        .await?;
    let (recent_orders, _) = OrderRepository::new(state.pool())
        .list(None, PageRequest::first(RECENT_ORDER_COUNT))
        .await?;

    Ok(Json(Dashboard {
        totals,
        orders_by_status,
        low_stock,
        recent_orders,
    }))
}
