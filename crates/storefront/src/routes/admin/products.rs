//! Admin product management.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use bazaar_core::{Money, ProductCategory, ProductId, ProductStatus};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{ApiJson, ApiPath, ApiQuery, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Page;
use crate::models::product::{NewProduct, Product, ProductChanges, normalize_tags};
use crate::routes::products::CatalogQuery;
use crate::state::AppState;

const MAX_PRODUCT_NAME_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub compare_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: ProductCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub inventory: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: ProductStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    #[serde(default, deserialize_with = "double_option")]
    pub compare_price: Option<Option<Money>>,
    pub images: Option<Vec<String>>,
    pub category: Option<ProductCategory>,
    pub tags: Option<Vec<String>>,
    pub inventory: Option<i32>,
    pub featured: Option<bool>,
    pub status: Option<ProductStatus>,
}

fn check_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be 1 to {MAX_PRODUCT_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

fn check_description(description: &str) -> Result<String> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::BadRequest(format!(
            "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(description.trim().to_owned())
}

fn check_inventory(inventory: i32) -> Result<i32> {
    if inventory < 0 {
        return Err(AppError::BadRequest("inventory must not be negative".to_owned()));
    }
    Ok(inventory)
}

fn check_compare_price(price: Money, compare_price: Option<Money>) -> Result<()> {
    if compare_price.is_some_and(|compare| compare <= price) {
        return Err(AppError::BadRequest(
            "comparePrice must exceed price".to_owned(),
        ));
    }
    Ok(())
}

fn check_images(images: Vec<String>) -> Result<Vec<String>> {
    images
        .into_iter()
        .map(|raw| {
            let trimmed = raw.trim();
            url::Url::parse(trimmed)
                .ok()
                .filter(|u| matches!(u.scheme(), "http" | "https"))
                .map(|_| trimmed.to_owned())
                .ok_or_else(|| AppError::BadRequest(format!("invalid image URL: {raw}")))
        })
        .collect()
}

impl CreateProductRequest {
    fn validate(self) -> Result<NewProduct> {
        check_compare_price(self.price, self.compare_price)?;
        Ok(NewProduct {
            name: check_name(&self.name)?,
            description: check_description(&self.description)?,
            price: self.price,
            compare_price: self.compare_price,
            images: check_images(self.images)?,
            category: self.category,
            tags: normalize_tags(self.tags),
            inventory: check_inventory(self.inventory)?,
            featured: self.featured,
            status: self.status,
        })
    }
}

impl UpdateProductRequest {
    fn validate(self) -> Result<ProductChanges> {
        if let (Some(price), Some(compare_price)) = (self.price, self.compare_price) {
            check_compare_price(price, compare_price)?;
        }
        let changes = ProductChanges {
            name: self.name.as_deref().map(check_name).transpose()?,
            description: self.description.as_deref().map(check_description).transpose()?,
            price: self.price,
            compare_price: self.compare_price,
            images: self.images.map(check_images).transpose()?,
            category: self.category,
            tags: self.tags.map(normalize_tags),
            inventory: self.inventory.map(check_inventory).transpose()?,
            featured: self.featured,
            status: self.status,
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest("no changes supplied".to_owned()));
        }
        Ok(changes)
    }
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

/// GET /admin/products
///
/// Same filters as the public catalog plus `status`; all statuses by default.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Json<Page<Product>>> {
    let (filter, sort, page) = query.into_parts()?;
    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, sort, page)
        .await?;
    Ok(Json(Page::new(products, page, total)))
}

/// GET /admin/products/{id}
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(product))
}

/// POST /admin/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductRepository::new(state.pool())
        .create(&body.validate()?)
        .await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /admin/products/{id}
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let changes = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => product_not_found(),
            other => other.into(),
        })?;
    tracing::info!("Product updated");
    Ok(Json(product))
}

/// DELETE /admin/products/{id}
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => product_not_found(),
            other => other.into(),
        })?;
    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_normalizes() {
        let body: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "  Desk Lamp ",
            "price": "39.90",
            "category": "home",
            "tags": ["Lighting", "lighting", "Desk"],
            "images": ["https://cdn.example.com/lamp.jpg"],
            "inventory": 4
        }))
        .unwrap();
        let product = body.validate().unwrap();
        assert_eq!(product.name, "Desk Lamp");
        assert_eq!(product.tags, vec!["lighting", "desk"]);
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.price, Money::from_cents(3990));
    }

    #[test]
    fn test_create_request_rejects_bad_values() {
        let body: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Lamp",
            "price": "10.00",
            "category": "home",
            "inventory": -1
        }))
        .unwrap();
        assert!(body.validate().is_err());

        let body: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Lamp",
            "price": "10.00",
            "category": "home",
            "images": ["ftp://example.com/x.png"]
        }))
        .unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let cleared: UpdateProductRequest =
            serde_json::from_value(serde_json::json!({ "comparePrice": null })).unwrap();
        assert_eq!(cleared.compare_price, Some(None));

        let untouched: UpdateProductRequest =
            serde_json::from_value(serde_json::json!({ "featured": true })).unwrap();
        assert_eq!(untouched.compare_price, None);
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(UpdateProductRequest::default().validate().is_err());
    }
}
