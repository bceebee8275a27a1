//! Review types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, ProductId, Rating, RatingDistribution, ReviewId, UserId};

/// A product review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub user_email: Email,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub verified_purchase: bool,
    pub helpful_count: i32,
    pub not_helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new review row. The author snapshot comes from the session.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: Email,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub verified_purchase: bool,
}

/// Review listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
    Helpful,
}

impl ReviewSort {
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::Oldest => "created_at ASC, id ASC",
            Self::Highest => "rating DESC, created_at DESC, id DESC",
            Self::Lowest => "rating ASC, created_at DESC, id DESC",
            Self::Helpful => "helpful_count DESC, created_at DESC, id DESC",
        }
    }
}

/// Aggregate block shown above a product's reviews.
///
/// Computed from every review of the product, not only the current page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: i64,
    pub distribution: RatingDistribution,
}

impl From<RatingDistribution> for ReviewStats {
    fn from(distribution: RatingDistribution) -> Self {
        let average_rating = distribution.summary().map_or(0.0, |s| s.rating);
        Self {
            average_rating,
            total_reviews: distribution.total(),
            distribution,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_distribution() {
        let dist: RatingDistribution = [
            (Rating::new(5).unwrap(), 1),
            (Rating::new(4).unwrap(), 1),
            (Rating::new(3).unwrap(), 1),
        ]
        .into_iter()
        .collect();

        let stats = ReviewStats::from(dist);
        assert_eq!(stats.total_reviews, 3);
        assert!((stats.average_rating - 4.0).abs() < f64::EPSILON);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["distribution"]["1"], 0);
        assert_eq!(json["distribution"]["5"], 1);
        assert_eq!(json["totalReviews"], 3);
    }

    #[test]
    fn test_stats_without_reviews() {
        let stats = ReviewStats::from(RatingDistribution::default());
        assert_eq!(stats.total_reviews, 0);
        assert!(stats.average_rating.abs() < f64::EPSILON);
    }
}
