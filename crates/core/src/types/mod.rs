//! Domain value types for Bazaar.
//!
//! Each type validates on construction so that code holding one can rely on
//! its invariants.

pub mod category;
pub mod email;
pub mod id;
pub mod money;
pub mod order_number;
pub mod rating;
pub mod status;

pub use category::ProductCategory;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use order_number::OrderNumber;
pub use rating::{Rating, RatingDistribution, RatingError, RatingSummary};
pub use status::*;
