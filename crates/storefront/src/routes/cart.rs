//! Cart route handlers. Every handler responds with the full cart.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::{Cart, MAX_LINE_QUANTITY};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplaceCartRequest {
    pub items: Vec<AddItemRequest>,
}

fn check_quantity(quantity: i32, allow_zero: bool) -> Result<()> {
    let min = i32::from(!allow_zero);
    if (min..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "quantity must be between {min} and {MAX_LINE_QUANTITY}"
        )))
    }
}

/// Merge duplicate product lines, summing and capping quantities.
fn merge_lines(items: &[AddItemRequest]) -> Result<Vec<(ProductId, i32)>> {
    let mut merged: BTreeMap<ProductId, i32> = BTreeMap::new();
    for item in items {
        check_quantity(item.quantity, false)?;
        let entry = merged.entry(item.product_id).or_default();
        *entry = (*entry + item.quantity).min(MAX_LINE_QUANTITY);
    }
    Ok(merged.into_iter().collect())
}

async fn require_active(state: &AppState, product_id: ProductId) -> Result<()> {
    ProductRepository::new(state.pool())
        .get_active(product_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))
}

async fn load_cart(state: &AppState, user_id: UserId) -> Result<Json<Cart>> {
    let lines = CartRepository::new(state.pool()).lines(user_id).await?;
    Ok(Json(Cart::from(lines)))
}

fn line_not_in_cart(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Item is not in your cart".to_owned()),
        other => other.into(),
    }
}

/// GET /cart
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    load_cart(&state, user.id).await
}

/// POST /cart/items
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<Cart>> {
    check_quantity(body.quantity, false)?;
    require_active(&state, body.product_id).await?;

    CartRepository::new(state.pool())
        .add(user.id, body.product_id, body.quantity)
        .await?;
    load_cart(&state, user.id).await
}

/// PATCH /cart/items/{productId}
///
/// A quantity of zero removes the line.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<SetQuantityRequest>,
) -> Result<Json<Cart>> {
    check_quantity(body.quantity, true)?;

    let carts = CartRepository::new(state.pool());
    if body.quantity == 0 {
        carts.remove(user.id, product_id).await.map_err(line_not_in_cart)?;
    } else {
        carts
            .set_quantity(user.id, product_id, body.quantity)
            .await
            .map_err(line_not_in_cart)?;
    }
    load_cart(&state, user.id).await
}

/// DELETE /cart/items/{productId}
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Cart>> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await
        .map_err(line_not_in_cart)?;
    load_cart(&state, user.id).await
}

/// DELETE /cart
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    let mut conn = state.pool().acquire().await.map_err(RepositoryError::from)?;
    CartRepository::clear(&mut conn, user.id).await?;
    Ok(Json(Cart::from(Vec::new())))
}

/// PUT /cart
///
/// Replaces the cart with the given lines, e.g. when syncing a guest cart
/// after login.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ReplaceCartRequest>,
) -> Result<Json<Cart>> {
    let lines = merge_lines(&body.items)?;
    for (product_id, _) in &lines {
        require_active(&state, *product_id).await?;
    }

    CartRepository::new(state.pool()).replace(user.id, &lines).await?;
    load_cart(&state, user.id).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert!(check_quantity(1, false).is_ok());
        assert!(check_quantity(99, false).is_ok());
        assert!(check_quantity(0, false).is_err());
        assert!(check_quantity(0, true).is_ok());
        assert!(check_quantity(100, true).is_err());
        assert!(check_quantity(-1, true).is_err());
    }

    #[test]
    fn test_merge_lines_sums_and_caps() {
        let items = vec![
            AddItemRequest {
                product_id: ProductId::new(2),
                quantity: 60,
            },
            AddItemRequest {
                product_id: ProductId::new(1),
                quantity: 1,
            },
            AddItemRequest {
                product_id: ProductId::new(2),
                quantity: 60,
            },
        ];
        let merged = merge_lines(&items).unwrap();
        assert_eq!(merged, vec![(ProductId::new(1), 1), (ProductId::new(2), 99)]);
    }

    #[test]
    fn test_add_item_defaults_quantity() {
        let body: AddItemRequest = serde_json::from_str(r#"{"productId": 7}"#).unwrap();
        assert_eq!(body.quantity, 1);
        assert_eq!(body.product_id, ProductId::new(7));
    }
}
