//! Wishlist route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::db::{ProductRepository, RepositoryError, WishlistRepository};
use crate::error::{ApiPath, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::product::Product;
use crate::state::AppState;

/// GET /wishlist
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let products = WishlistRepository::new(state.pool()).products(user.id).await?;
    Ok(Json(products))
}

/// POST /wishlist/{productId}
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Vec<Product>>> {
    ProductRepository::new(state.pool())
        .get_active(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let wishlists = WishlistRepository::new(state.pool());
    wishlists.add(user.id, product_id).await?;
    Ok(Json(wishlists.products(user.id).await?))
}

/// DELETE /wishlist/{productId}
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Vec<Product>>> {
    let wishlists = WishlistRepository::new(state.pool());
    wishlists
        .remove(user.id, product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("Product is not on your wishlist".to_owned())
            }
            other => other.into(),
        })?;
    Ok(Json(wishlists.products(user.id).await?))
}
