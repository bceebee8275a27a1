//! Bazaar Core - Shared domain types.
//!
//! This crate provides the value types used across the Bazaar workspace:
//! - `storefront` - HTTP API for customers and the admin back-office
//! - `cli` - Command-line tools for migrations, rating sync and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Rating arithmetic, order numbering and the order status
//! machine live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money, ratings, order numbers and enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
