//! Product categories.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.product_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Books,
    Home,
    Beauty,
    Sports,
    Toys,
    Grocery,
    Other,
}

impl ProductCategory {
    pub const ALL: [Self; 9] = [
        Self::Electronics,
        Self::Clothing,
        Self::Books,
        Self::Home,
        Self::Beauty,
        Self::Sports,
        Self::Toys,
        Self::Grocery,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "electronics",
            Self::Clothing => "clothing",
            Self::Books => "books",
            Self::Home => "home",
            Self::Beauty => "beauty",
            Self::Sports => "sports",
            Self::Toys => "toys",
            Self::Grocery => "grocery",
            Self::Other => "other",
        }
    }

    /// Human-readable label for navigation menus.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::Books => "Books",
            Self::Home => "Home & Garden",
            Self::Beauty => "Beauty",
            Self::Sports => "Sports & Outdoors",
            Self::Toys => "Toys & Games",
            Self::Grocery => "Grocery",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serde_agree() {
        for category in ProductCategory::ALL {
            let parsed: ProductCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }

    #[test]
    fn test_unknown_category() {
        assert!("furniture".parse::<ProductCategory>().is_err());
    }
}
