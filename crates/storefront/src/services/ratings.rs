//! Rating synchronizer.
//!
//! `product.rating` and `product.review_count` are a denormalized summary of
//! the product's review rows. Every recompute locks the product row before
//! reading ratings, so concurrent recomputes for one product run one after
//! another and the last one sees every committed review.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{ProductId, RatingSummary};

use crate::db::{ProductRepository, RepositoryError, ReviewRepository};

/// Errors from a rating recompute.
#[derive(Debug, Error)]
pub enum RatingSyncError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for RatingSyncError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Result of recomputing one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecomputeOutcome {
    /// The stored pair was overwritten with this summary.
    Updated(RatingSummary),
    /// The product has no reviews; its stored pair was left as is.
    NoReviews,
}

/// Totals from a full catalog pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub scanned: u64,
    pub updated: u64,
    pub without_reviews: u64,
}

/// Keeps product rating fields in step with review rows.
pub struct RatingSynchronizer<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingSynchronizer<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Recompute one product's rating from its reviews.
    ///
    /// With no reviews the product row is not written.
    ///
    /// # Errors
    ///
    /// Returns `RatingSyncError::ProductNotFound` if the product doesn't exist.
    /// Returns `RatingSyncError::Repository` if a query fails.
    #[instrument(skip(self))]
    pub async fn recompute_one(
        &self,
        product_id: ProductId,
    ) -> Result<RecomputeOutcome, RatingSyncError> {
        let mut tx = self.pool.begin().await?;

        if ProductRepository::lock_for_update(&mut tx, product_id)
            .await?
            .is_none()
        {
            return Err(RatingSyncError::ProductNotFound(product_id));
        }

        let ratings = ReviewRepository::ratings_for(&mut tx, product_id).await?;
        let Some(summary) = RatingSummary::from_ratings(ratings) else {
            tx.commit().await?;
            tracing::debug!("No reviews, rating left unchanged");
            return Ok(RecomputeOutcome::NoReviews);
        };

        ProductRepository::write_rating(&mut tx, product_id, summary).await?;
        tx.commit().await?;

        tracing::debug!(
            rating = summary.rating,
            review_count = summary.review_count,
            "Product rating recomputed"
        );
        Ok(RecomputeOutcome::Updated(summary))
    }

    /// Recompute every product in the catalog, one at a time.
    ///
    /// Products deleted while the pass runs are skipped. Any other failure
    /// stops the pass.
    ///
    /// # Errors
    ///
    /// Returns `RatingSyncError::Repository` on the first failing query.
    #[instrument(skip(self))]
    pub async fn recompute_all(&self) -> Result<SyncReport, RatingSyncError> {
        let ids = ProductRepository::new(self.pool).all_ids().await?;
        let mut report = SyncReport::default();

        for product_id in ids {
            match self.recompute_one(product_id).await {
                Ok(RecomputeOutcome::Updated(_)) => report.updated += 1,
                Ok(RecomputeOutcome::NoReviews) => report.without_reviews += 1,
                Err(RatingSyncError::ProductNotFound(id)) => {
                    tracing::debug!(product_id = %id, "Product deleted during sync, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            }
            report.scanned += 1;
        }

        tracing::info!(
            scanned = report.scanned,
            updated = report.updated,
            without_reviews = report.without_reviews,
            "Rating sync complete"
        );
        Ok(report)
    }
}
