//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - registration, login, password change and reset
//! - `ratings` - keeps product rating fields in step with reviews
//! - `reviews` - review submission, listing and feedback
//! - `checkout` - cart to order, order status changes with restock

pub mod auth;
pub mod checkout;
pub mod ratings;
pub mod reviews;
