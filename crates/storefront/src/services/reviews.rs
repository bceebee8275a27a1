//! Review submission, listing and feedback.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{ProductId, Rating, RatingError, RatingSummary, ReviewId};

use crate::db::{ProductRepository, RepositoryError, ReviewRepository};
use crate::models::review::{NewReview, Review, ReviewSort, ReviewStats};
use crate::models::{CurrentUser, Page, PageRequest};
use crate::services::ratings::RatingSynchronizer;

pub const MAX_TITLE_LENGTH: usize = 120;
pub const MAX_COMMENT_LENGTH: usize = 2000;
pub const DEFAULT_REVIEW_PAGE_SIZE: u32 = 10;

/// Errors from review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("product not found")]
    ProductNotFound,

    #[error("review not found")]
    ReviewNotFound,

    #[error("you have already reviewed this product")]
    AlreadyReviewed,

    #[error(transparent)]
    InvalidRating(#[from] RatingError),

    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A review as submitted by a customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewInput {
    pub rating: i64,
    pub title: String,
    pub comment: String,
}

/// A review input that passed validation.
#[derive(Debug, Clone)]
pub struct ValidReview {
    pub rating: Rating,
    pub title: String,
    pub comment: String,
}

impl ReviewInput {
    /// Check the rating range and text lengths, trimming the text.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` or `ReviewError::Invalid`.
    pub fn validate(self) -> Result<ValidReview, ReviewError> {
        let rating = Rating::new(self.rating)?;
        let title = bounded_text("title", &self.title, MAX_TITLE_LENGTH)?;
        let comment = bounded_text("comment", &self.comment, MAX_COMMENT_LENGTH)?;
        Ok(ValidReview {
            rating,
            title,
            comment,
        })
    }
}

fn bounded_text(field: &str, value: &str, max: usize) -> Result<String, ReviewError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ReviewError::Invalid(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ReviewError::Invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_owned())
}

/// Response to a successful submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedReview {
    pub review: Review,
    pub product: RatingSummary,
}

/// Reviews page plus the product-wide summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    #[serde(flatten)]
    pub page: Page<Review>,
    pub summary: ReviewStats,
}

/// Review operations for one request.
pub struct ReviewService<'a> {
    pool: &'a PgPool,
    products: ProductRepository<'a>,
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            products: ProductRepository::new(pool),
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Create a review and refresh the product's rating.
    ///
    /// A failing rating refresh is logged and does not fail the submission.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` for missing or non-public products.
    /// Returns `ReviewError::AlreadyReviewed` if the user already reviewed it.
    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn submit(
        &self,
        product_id: ProductId,
        user: &CurrentUser,
        input: ValidReview,
    ) -> Result<SubmittedReview, ReviewError> {
        if self.products.get_active(product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound);
        }

        if self.reviews.exists_for_user(product_id, user.id).await? {
            return Err(ReviewError::AlreadyReviewed);
        }

        let verified_purchase = self.reviews.has_purchased(product_id, user.id).await?;

        let review = self
            .reviews
            .create(&NewReview {
                product_id,
                user_id: user.id,
                user_name: user.name.clone(),
                user_email: user.email.clone(),
                rating: input.rating,
                title: input.title,
                comment: input.comment,
                verified_purchase,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ReviewError::AlreadyReviewed,
                other => ReviewError::Repository(other),
            })?;

        if let Err(e) = RatingSynchronizer::new(self.pool)
            .recompute_one(product_id)
            .await
        {
            tracing::warn!(error = %e, "Rating recompute after review submission failed");
        }

        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound)?;

        tracing::info!(review_id = %review.id, "Review submitted");
        Ok(SubmittedReview {
            review,
            product: product.rating_summary(),
        })
    }

    /// One page of a product's reviews with the product-wide summary.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` for missing or non-public products.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        product_id: ProductId,
        sort: ReviewSort,
        page: PageRequest,
    ) -> Result<ReviewListing, ReviewError> {
        if self.products.get_active(product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound);
        }

        let (reviews, total) = self.reviews.list_for_product(product_id, sort, page).await?;
        let distribution = self.reviews.distribution(product_id).await?;

        Ok(ReviewListing {
            page: Page::new(reviews, page, total),
            summary: ReviewStats::from(distribution),
        })
    }

    /// Record a helpful or not-helpful vote.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ReviewNotFound` if the review doesn't exist.
    #[instrument(skip(self))]
    pub async fn feedback(&self, review_id: ReviewId, helpful: bool) -> Result<Review, ReviewError> {
        self.reviews
            .record_feedback(review_id, helpful)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ReviewError::ReviewNotFound,
                other => ReviewError::Repository(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(rating: i64, title: &str, comment: &str) -> ReviewInput {
        ReviewInput {
            rating,
            title: title.to_owned(),
            comment: comment.to_owned(),
        }
    }

    #[test]
    fn test_rating_out_of_range_is_rejected() {
        assert!(matches!(
            input(0, "t", "c").validate(),
            Err(ReviewError::InvalidRating(_))
        ));
        assert!(matches!(
            input(6, "t", "c").validate(),
            Err(ReviewError::InvalidRating(_))
        ));
        assert_eq!(input(5, "t", "c").validate().unwrap().rating.value(), 5);
    }

    #[test]
    fn test_text_is_trimmed_and_bounded() {
        let valid = input(4, "  Great  ", " Works well ").validate().unwrap();
        assert_eq!(valid.title, "Great");
        assert_eq!(valid.comment, "Works well");

        assert!(input(4, "   ", "c").validate().is_err());
        assert!(input(4, &"t".repeat(MAX_TITLE_LENGTH + 1), "c").validate().is_err());
        assert!(
            input(4, "t", &"c".repeat(MAX_COMMENT_LENGTH + 1))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_input_rejects_unknown_fields() {
        let json = r#"{"rating": 5, "title": "t", "comment": "c", "verifiedPurchase": true}"#;
        assert!(serde_json::from_str::<ReviewInput>(json).is_err());
    }
}
