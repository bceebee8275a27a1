//! Admin back-office routes. Every handler takes `RequireAdmin`.

pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::routes::sync;
use crate::state::AppState;

/// Create the admin routes router, nested under `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route("/orders/{id}/notes", post(orders::add_note))
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show))
        .route("/users/{id}/role", patch(users::update_role))
        .route("/sync-ratings", post(sync::sync_ratings))
}
