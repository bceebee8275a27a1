//! Star ratings and their aggregates.
//!
//! A product's `rating` / `review_count` columns are a denormalized copy of
//! [`RatingSummary::from_ratings`] over that product's reviews. Keeping the
//! arithmetic here means the storefront, the CLI and the tests all agree on
//! how an average is computed and rounded.

use core::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(i64),
}

/// A single review's star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a star value.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError::OutOfRange(value))
    }

    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Rating {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Rating {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Rating {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i16::from(self.0), buf)
    }
}

/// The denormalized `{rating, reviewCount}` pair stored on a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean star rating rounded to one decimal place.
    pub rating: f64,
    /// Number of reviews the mean was computed from.
    pub review_count: i64,
}

impl RatingSummary {
    /// Average a set of ratings.
    ///
    /// Returns `None` for an empty set; callers leave the stored fields alone
    /// in that case rather than writing a zero average.
    #[must_use]
    pub fn from_ratings<I>(ratings: I) -> Option<Self>
    where
        I: IntoIterator<Item = Rating>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_i64, 0_i64), |(sum, count), r| {
                (sum + i64::from(r.value()), count + 1)
            });
        Self::from_totals(sum, count)
    }

    /// Build a summary from a star total and a review count.
    #[must_use]
    pub fn from_totals(sum: i64, count: i64) -> Option<Self> {
        if count <= 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
        let mean = sum as f64 / count as f64;
        Some(Self {
            rating: round_one_decimal(mean),
            review_count: count,
        })
    }
}

/// Round half away from zero to one decimal place.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Count of reviews at each star value.
///
/// Serializes as `{"1": n, "2": n, "3": n, "4": n, "5": n}` with every key
/// present, so clients can draw a histogram without filling gaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDistribution {
    counts: [i64; 5],
}

impl RatingDistribution {
    /// Add `count` reviews with the given star value.
    pub fn record(&mut self, rating: Rating, count: i64) {
        if let Some(slot) = self.counts.get_mut(usize::from(rating.value() - 1)) {
            *slot += count;
        }
    }

    /// Number of reviews with the given star value.
    #[must_use]
    pub fn count(&self, rating: Rating) -> i64 {
        self.counts
            .get(usize::from(rating.value() - 1))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }

    /// The same summary [`RatingSummary::from_ratings`] would produce for the
    /// underlying reviews.
    #[must_use]
    pub fn summary(&self) -> Option<RatingSummary> {
        let sum = self
            .counts
            .iter()
            .zip(1_i64..)
            .map(|(count, stars)| count * stars)
            .sum();
        RatingSummary::from_totals(sum, self.total())
    }
}

impl FromIterator<(Rating, i64)> for RatingDistribution {
    fn from_iter<T: IntoIterator<Item = (Rating, i64)>>(iter: T) -> Self {
        let mut dist = Self::default();
        for (rating, count) in iter {
            dist.record(rating, count);
        }
        dist
    }
}

impl Serialize for RatingDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (stars, count) in (1_u8..).zip(self.counts.iter()) {
            map.serialize_entry(&stars.to_string(), count)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ratings(values: &[i64]) -> Vec<Rating> {
        values.iter().map(|&v| Rating::new(v).unwrap()).collect()
    }

    #[test]
    fn test_rating_range() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert_eq!(Rating::new(0), Err(RatingError::OutOfRange(0)));
        assert_eq!(Rating::new(6), Err(RatingError::OutOfRange(6)));
        assert_eq!(Rating::new(-3), Err(RatingError::OutOfRange(-3)));
    }

    #[test]
    fn test_rating_deserialize_rejects_out_of_range() {
        assert_eq!(serde_json::from_str::<Rating>("4").unwrap().value(), 4);
        assert!(serde_json::from_str::<Rating>("6").is_err());
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("3.5").is_err());
    }

    #[test]
    fn test_summary_of_five_four_three() {
        let summary = RatingSummary::from_ratings(ratings(&[5, 4, 3])).unwrap();
        assert!((summary.rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.review_count, 3);
    }

    #[test]
    fn test_summary_rounds_to_one_decimal() {
        // 14 / 3 = 4.666..
        let summary = RatingSummary::from_ratings(ratings(&[5, 5, 4])).unwrap();
        assert!((summary.rating - 4.7).abs() < f64::EPSILON);

        // 13 / 4 = 3.25 rounds away from zero
        let summary = RatingSummary::from_ratings(ratings(&[5, 4, 3, 1])).unwrap();
        assert!((summary.rating - 3.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_of_nothing_is_none() {
        assert!(RatingSummary::from_ratings(Vec::new()).is_none());
        assert!(RatingSummary::from_totals(0, 0).is_none());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = RatingSummary::from_ratings(ratings(&[2, 4])).unwrap();
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["reviewCount"], 2);
        assert_eq!(json["rating"], 3.0);
    }

    #[test]
    fn test_distribution_matches_direct_average() {
        let values = [5, 5, 4, 2, 1, 5, 3];
        let dist: RatingDistribution = ratings(&values).into_iter().map(|r| (r, 1)).collect();

        assert_eq!(dist.total(), 7);
        assert_eq!(dist.count(Rating::new(5).unwrap()), 3);
        assert_eq!(
            dist.summary(),
            RatingSummary::from_ratings(ratings(&values))
        );
    }

    #[test]
    fn test_distribution_serializes_every_star() {
        let dist: RatingDistribution = [(Rating::new(4).unwrap(), 2)].into_iter().collect();
        let json = serde_json::to_value(dist).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"1": 0, "2": 0, "3": 0, "4": 2, "5": 0})
        );
    }
}
