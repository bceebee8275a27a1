//! HTTP routes for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database ping)
//!
//! # Auth (rate limited when enabled)
//! POST /auth/register               - Create account and log in
//! POST /auth/login                  - Log in
//! POST /auth/logout                 - Log out
//! GET  /auth/me                     - Current user
//! POST /auth/forgot-password        - Issue a reset token
//! POST /auth/reset-password         - Consume a reset token
//!
//! # Catalog and reviews
//! GET  /products                    - Paginated catalog
//! GET  /products/featured           - Featured products
//! GET  /products/categories         - Categories with counts
//! GET  /products/{id}               - Product detail
//! GET  /products/{id}/reviews       - Reviews with rating summary
//! POST /products/{id}/reviews       - Submit a review
//! POST /reviews/{id}/feedback       - Helpful / not helpful vote
//!
//! # Cart, wishlist, orders, account (require auth)
//! GET|PUT|DELETE /cart
//! POST /cart/items, PATCH|DELETE /cart/items/{productId}
//! GET  /wishlist, POST|DELETE /wishlist/{productId}
//! POST /orders, GET /orders, GET /orders/{id}, POST /orders/{id}/cancel
//! GET|PATCH /account, POST /account/password
//!
//! # Admin (require the admin role)
//! GET  /sync-ratings
//! /admin/...                        - see `admin::routes`
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod sync;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore, service::SignedCookie};
use tracing::Span;

use crate::middleware::{auth_rate_limiter, rate_limited_as_json, request_id_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}

/// Create the catalog and product review routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", get(reviews::list).post(reviews::submit))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).put(cart::replace).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::set_quantity).delete(cart::remove),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/{product_id}", post(wishlist::add).delete(wishlist::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::checkout))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).patch(account::update))
        .route("/password", post(account::change_password))
}

/// Create all API routes. `rate_limit_auth` guards `/auth` with governor.
pub fn routes(rate_limit_auth: bool) -> Router<AppState> {
    let auth = if rate_limit_auth {
        auth_routes()
            .layer(auth_rate_limiter())
            .layer(axum::middleware::map_response(rate_limited_as_json))
    } else {
        auth_routes()
    };

    Router::new()
        .nest("/auth", auth)
        .nest("/products", product_routes())
        .route("/reviews/{id}/feedback", post(reviews::feedback))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/orders", order_routes())
        .nest("/account", account_routes())
        .route("/sync-ratings", get(sync::sync_ratings))
        .nest("/admin", admin::routes())
}

/// Build the full application: health checks, API routes, session and
/// tracing layers. Sentry layers are added by the binary.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S, SignedCookie>) -> Router
where
    S: SessionStore + Clone,
{
    let rate_limit_auth = state.config().rate_limit;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes(rate_limit_auth))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
