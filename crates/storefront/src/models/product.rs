//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Money, ProductCategory, ProductId, ProductStatus, RatingSummary};

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub compare_price: Option<Money>,
    pub images: Vec<String>,
    pub category: ProductCategory,
    pub tags: Vec<String>,
    pub inventory: i32,
    pub rating: f64,
    pub review_count: i64,
    pub featured: bool,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The stored rating pair, as last written by the synchronizer.
    #[must_use]
    pub const fn rating_summary(&self) -> RatingSummary {
        RatingSummary {
            rating: self.rating,
            review_count: self.review_count,
        }
    }

    #[must_use]
    pub fn in_stock(&self, quantity: u32) -> bool {
        i64::from(self.inventory) >= i64::from(quantity)
    }
}

/// Fields for a new product. Validated by the admin route before insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub compare_price: Option<Money>,
    pub images: Vec<String>,
    pub category: ProductCategory,
    pub tags: Vec<String>,
    pub inventory: i32,
    pub featured: bool,
    pub status: ProductStatus,
}

/// A partial product update. `None` leaves the column unchanged.
///
/// `compare_price` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub compare_price: Option<Option<Money>>,
    pub images: Option<Vec<String>>,
    pub category: Option<ProductCategory>,
    pub tags: Option<Vec<String>>,
    pub inventory: Option<i32>,
    pub featured: Option<bool>,
    pub status: Option<ProductStatus>,
}

impl ProductChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.compare_price.is_none()
            && self.images.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.inventory.is_none()
            && self.featured.is_none()
            && self.status.is_none()
    }
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl ProductSort {
    /// `ORDER BY` clause body. The trailing `id` keeps paging stable.
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id DESC",
            Self::Rating => "rating DESC, review_count DESC, id DESC",
            Self::Name => "name ASC, id ASC",
        }
    }
}

/// Catalog filters. Public listings always force `status = active`.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub featured: Option<bool>,
    pub status: Option<ProductStatus>,
}

/// A category with its number of active products.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: ProductCategory,
    pub label: &'static str,
    pub count: i64,
}

/// Lower-case, trim and de-duplicate tags, keeping first-seen order.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["Audio", " audio ", "", "Wireless", "WIRELESS", "usb-c"]);
        assert_eq!(tags, vec!["audio", "wireless", "usb-c"]);
    }

    #[test]
    fn test_sort_parses_snake_case() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap_or_default();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert_eq!(ProductSort::default(), ProductSort::Newest);
    }

    #[test]
    fn test_empty_changes() {
        assert!(ProductChanges::default().is_empty());
        let changes = ProductChanges {
            compare_price: Some(None),
            ..ProductChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
