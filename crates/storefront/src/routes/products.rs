//! Public catalog route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{Money, ProductCategory, ProductId, ProductStatus};

use crate::db::ProductRepository;
use crate::error::{ApiPath, ApiQuery, AppError, Result};
use crate::models::product::{CategoryCount, Product, ProductFilter, ProductSort};
use crate::models::{Page, PageRequest};
use crate::state::AppState;

pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 12;
const FEATURED_LIMIT: i64 = 8;

/// Catalog query string. Shared with the admin product listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<ProductCategory>,
    pub q: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub featured: Option<bool>,
    pub sort: Option<ProductSort>,
    /// Only honored by the admin listing.
    pub status: Option<ProductStatus>,
}

impl CatalogQuery {
    /// Split into filter, sort and page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `minPrice` exceeds `maxPrice` or the
    /// page parameters are out of range.
    pub fn into_parts(self) -> Result<(ProductFilter, ProductSort, PageRequest)> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "minPrice must not exceed maxPrice".to_owned(),
            ));
        }
        let page = PageRequest::new(self.page, self.limit, DEFAULT_CATALOG_PAGE_SIZE)?;
        let filter = ProductFilter {
            category: self.category,
            search: self.q,
            min_price: self.min_price,
            max_price: self.max_price,
            featured: self.featured,
            status: self.status,
        };
        Ok((filter, self.sort.unwrap_or_default(), page))
    }
}

/// GET /products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Json<Page<Product>>> {
    let (mut filter, sort, page) = query.into_parts()?;
    filter.status = Some(ProductStatus::Active);

    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, sort, page)
        .await?;
    Ok(Json(Page::new(products, page, total)))
}

/// GET /products/featured
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .featured(FEATURED_LIMIT)
        .await?;
    Ok(Json(products))
}

/// GET /products/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let counts = ProductRepository::new(state.pool()).category_counts().await?;
    Ok(Json(counts))
}

/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    Ok(Json(product))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let (filter, sort, page) = CatalogQuery::default().into_parts().unwrap();
        assert_eq!(sort, ProductSort::Newest);
        assert_eq!(page, PageRequest { page: 1, limit: 12 });
        assert!(filter.category.is_none());
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        let query = CatalogQuery {
            min_price: Some(Money::from_cents(5000)),
            max_price: Some(Money::from_cents(1000)),
            ..CatalogQuery::default()
        };
        assert!(matches!(query.into_parts(), Err(AppError::BadRequest(_))));
    }
}
