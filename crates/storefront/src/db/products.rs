//! Product repository for database operations.
//!
//! Listings are built with `QueryBuilder` because the filter set is dynamic.
//! Functions taking `&mut PgConnection` run inside a caller's transaction.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use bazaar_core::{ProductCategory, ProductId, ProductStatus, RatingSummary};

use super::RepositoryError;
use crate::models::PageRequest;
use crate::models::product::{
    CategoryCount, NewProduct, Product, ProductChanges, ProductFilter, ProductSort,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price, compare_price, images, category, \
     tags, inventory, rating, review_count, featured, status, created_at, updated_at";

/// Escape `LIKE` metacharacters and wrap in `%…%`.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, filter: &'args ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND featured = ").push_bind(featured);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = contains_pattern(term);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(" OR ")
            .push_bind(term.to_lowercase())
            .push(" = ANY(tags))");
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Get a product only if it is publicly visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.get(id).await?.filter(|p| p.status.is_public()))
    }

    /// List products matching `filter`, returning one page and the total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM storefront.product");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let products = qb.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok((products, total))
    }

    /// Active featured products, best rated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM storefront.product
            WHERE featured AND status = 'active'
            ORDER BY rating DESC, created_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Every category with its number of active products, zeros included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, (ProductCategory, i64)>(
            r"
            SELECT category, COUNT(*) FROM storefront.product
            WHERE status = 'active'
            GROUP BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ProductCategory::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category,
                label: category.label(),
                count: rows
                    .iter()
                    .find(|(c, _)| *c == category)
                    .map_or(0, |(_, n)| *n),
            })
            .collect())
    }

    /// IDs of every product in the catalog, all statuses, in ID order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all_ids(&self) -> Result<Vec<ProductId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, ProductId>("SELECT id FROM storefront.product ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(ids)
    }

    /// Whether a product with exactly this name exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_named(&self, name: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.product WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let created = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO storefront.product
                (name, description, price, compare_price, images, category, tags,
                 inventory, featured, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.compare_price)
        .bind(&product.images)
        .bind(product.category)
        .bind(&product.tags)
        .bind(product.inventory)
        .bind(product.featured)
        .bind(product.status)
        .fetch_one(self.pool)
        .await?;
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE storefront.product SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(description) = &changes.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(price) = changes.price {
            set.push("price = ").push_bind_unseparated(price);
        }
        if let Some(compare_price) = changes.compare_price {
            set.push("compare_price = ").push_bind_unseparated(compare_price);
        }
        if let Some(images) = &changes.images {
            set.push("images = ").push_bind_unseparated(images);
        }
        if let Some(category) = changes.category {
            set.push("category = ").push_bind_unseparated(category);
        }
        if let Some(tags) = &changes.tags {
            set.push("tags = ").push_bind_unseparated(tags);
        }
        if let Some(inventory) = changes.inventory {
            set.push("inventory = ").push_bind_unseparated(inventory);
        }
        if let Some(featured) = changes.featured {
            set.push("featured = ").push_bind_unseparated(featured);
        }
        if let Some(status) = changes.status {
            set.push("status = ").push_bind_unseparated(status);
        }
        set.push("updated_at = NOW()");
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {PRODUCT_COLUMNS}"));

        qb.build_query_as::<Product>()
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Hard-delete a product. Reviews, cart and wishlist lines cascade; order
    /// items keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Lock a product row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(product)
    }

    /// Write the denormalized rating pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn write_rating(
        conn: &mut PgConnection,
        id: ProductId,
        summary: RatingSummary,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET rating = $2, review_count = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(summary.rating)
        .bind(summary.review_count)
        .execute(conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Lock several product rows, in ascending id order.
    ///
    /// Returns the ids that still exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_many(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
        let locked = sqlx::query_scalar::<_, ProductId>(
            r"
            SELECT id FROM storefront.product
            WHERE id = ANY($1)
            ORDER BY id ASC
            FOR UPDATE
            ",
        )
        .bind(raw)
        .fetch_all(conn)
        .await?;
        Ok(locked)
    }

    /// Change a product's inventory by `delta` (negative to sell).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the result would be negative.
    pub async fn adjust_inventory(
        conn: &mut PgConnection,
        id: ProductId,
        delta: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET inventory = inventory + $2, updated_at = NOW()
            WHERE id = $1 AND inventory + $2 >= 0
            ",
        )
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "insufficient inventory for product {id}"
            )));
        }
        Ok(())
    }

    /// Products at or below the given inventory level, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM storefront.product
            WHERE inventory <= $1 AND status = $2
            ORDER BY inventory ASC, id ASC
            "
        ))
        .bind(threshold)
        .bind(ProductStatus::Active)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("mug"), "%mug%");
        assert_eq!(contains_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_filters_build_expected_sql() {
        let filter = ProductFilter {
            category: Some(ProductCategory::Books),
            search: Some("  rust ".to_owned()),
            status: Some(ProductStatus::Active),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storefront.product");
        push_filters(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("category = $2"));
        assert!(sql.contains("name ILIKE $3 OR description ILIKE $4 OR $5 = ANY(tags)"));
        assert!(!sql.contains("price"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = ProductFilter {
            search: Some("   ".to_owned()),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM storefront.product");
        push_filters(&mut qb, &filter);
        assert!(!qb.sql().contains("ILIKE"));
    }
}
