//! Human-facing order numbers.
//!
//! Format: `ORD-<yyyymmddHHMMSS>-<suffix>` where the timestamp is UTC and the
//! suffix is 6 symbols from a 32-symbol alphabet (about 10^9 values per
//! second). Generation alone is only probabilistically unique; the
//! `order_number` column carries a unique constraint and the insert retries
//! with a fresh number on conflict.

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Symbols used for the random suffix. `0`, `O`, `1` and `I` are left out so
/// numbers read over the phone are unambiguous.
const SUFFIX_ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

const SUFFIX_LEN: usize = 6;

const PREFIX: &str = "ORD-";

/// A generated order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a number for an order created at `now`.
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
                char::from(SUFFIX_ALPHABET.get(idx).copied().unwrap_or(b'X'))
            })
            .collect();
        Self(format!("{PREFIX}{}-{suffix}", now.format("%Y%m%d%H%M%S")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `s` has the shape produced by [`OrderNumber::generate`].
    #[must_use]
    pub fn is_well_formed(s: &str) -> bool {
        let Some(rest) = s.strip_prefix(PREFIX) else {
            return false;
        };
        let Some((stamp, suffix)) = rest.split_once('-') else {
            return false;
        };
        stamp.len() == 14
            && stamp.bytes().all(|b| b.is_ascii_digit())
            && suffix.len() == SUFFIX_LEN
            && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let stored = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        if !Self::is_well_formed(&stored) {
            return Err(format!("malformed order number: {stored}").into());
        }
        Ok(Self(stored))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generate_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let number = OrderNumber::generate(now, &mut rng);

        assert!(number.as_str().starts_with("ORD-20260314092653-"));
        assert_eq!(number.as_str().len(), "ORD-20260314092653-".len() + 6);
        assert!(OrderNumber::is_well_formed(number.as_str()));
    }

    #[test]
    fn test_same_second_numbers_differ() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let numbers: HashSet<_> = (0..1000)
            .map(|_| OrderNumber::generate(now, &mut rng))
            .collect();
        assert_eq!(numbers.len(), 1000);
    }

    #[test]
    fn test_is_well_formed_rejects_other_shapes() {
        assert!(!OrderNumber::is_well_formed("ORD-123"));
        assert!(!OrderNumber::is_well_formed("ORD-20260101000000-ABC"));
        assert!(!OrderNumber::is_well_formed("ORD-20260101000000-ABCDE0"));
        assert!(!OrderNumber::is_well_formed("INV-20260101000000-ABCDEF"));
    }
}
