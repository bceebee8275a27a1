//! Review repository for database operations.

use sqlx::{PgConnection, PgPool};

use bazaar_core::{OrderStatus, ProductId, Rating, RatingDistribution, ReviewId, UserId};

use super::RepositoryError;
use crate::models::PageRequest;
use crate::models::review::{NewReview, Review, ReviewSort};

const REVIEW_COLUMNS: &str = "id, product_id, user_id, user_name, user_email, rating, title, \
     comment, verified_purchase, helpful_count, not_helpful_count, created_at";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the user already reviewed the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_for_user(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM storefront.review WHERE product_id = $1 AND user_id = $2
            )
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether the user has a non-cancelled order containing the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_purchased(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let purchased = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM storefront.order o
                JOIN storefront.order_item i ON i.order_id = o.id
                WHERE o.user_id = $1 AND i.product_id = $2 AND o.status <> $3
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(OrderStatus::Cancelled)
        .fetch_one(self.pool)
        .await?;
        Ok(purchased)
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(&format!(
            r"
            INSERT INTO storefront.review
                (product_id, user_id, user_name, user_email, rating, title, comment,
                 verified_purchase)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(&review.user_name)
        .bind(&review.user_email)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.comment)
        .bind(review.verified_purchase)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::unique_or_database(e, "you have already reviewed this product")
        })
    }

    /// Every rating for a product, read on the caller's connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ratings_for(
        conn: &mut PgConnection,
        product_id: ProductId,
    ) -> Result<Vec<Rating>, RepositoryError> {
        let ratings = sqlx::query_scalar::<_, Rating>(
            "SELECT rating FROM storefront.review WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(conn)
        .await?;
        Ok(ratings)
    }

    /// One page of a product's reviews and the product's review total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        sort: ReviewSort,
        page: PageRequest,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            r"
            SELECT {REVIEW_COLUMNS} FROM storefront.review
            WHERE product_id = $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            ",
            sort.order_by()
        ))
        .bind(product_id)
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.review WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok((reviews, total))
    }

    /// Count of a product's reviews at each star value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn distribution(
        &self,
        product_id: ProductId,
    ) -> Result<RatingDistribution, RepositoryError> {
        let rows = sqlx::query_as::<_, (Rating, i64)>(
            r"
            SELECT rating, COUNT(*) FROM storefront.review
            WHERE product_id = $1
            GROUP BY rating
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Increment the helpful or not-helpful counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn record_feedback(
        &self,
        id: ReviewId,
        helpful: bool,
    ) -> Result<Review, RepositoryError> {
        let column = if helpful {
            "helpful_count"
        } else {
            "not_helpful_count"
        };
        sqlx::query_as::<_, Review>(&format!(
            r"
            UPDATE storefront.review SET {column} = {column} + 1
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
