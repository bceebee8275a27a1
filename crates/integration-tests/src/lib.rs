//! Integration test helpers for Bazaar.
//!
//! # Running Tests
//!
//! Database tests use `#[sqlx::test]`, which creates a fresh database per
//! test from `DATABASE_URL` and applies the storefront migrations:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/bazaar_test \
//!     cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! HTTP tests expect a running server at `STOREFRONT_URL`
//! (default `http://localhost:3000`).
//!
//! # Test Categories
//!
//! - `rating_sync` - rating recompute and review submission against `PostgreSQL`
//! - `orders` - checkout and cancellation locking, order-number allocation
//! - `storefront_http` - end-to-end API flows over HTTP

use bazaar_core::{Email, Money, ProductCategory, ProductId, ProductStatus, Rating};
use bazaar_storefront::db::{ProductRepository, RepositoryError, ReviewRepository, UserRepository};
use bazaar_storefront::models::CurrentUser;
use bazaar_storefront::models::product::{NewProduct, Product};
use bazaar_storefront::models::review::NewReview;
use sqlx::PgPool;

/// Placeholder hash for users that never log in.
const UNUSABLE_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$unusable";

/// Base URL of a running storefront.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// A unique email so HTTP tests can run repeatedly against one database.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Insert an active product with default stock.
///
/// # Errors
///
/// Returns the repository error if the insert fails.
pub async fn insert_product(pool: &PgPool, name: &str) -> Result<Product, RepositoryError> {
    ProductRepository::new(pool)
        .create(&NewProduct {
            name: name.to_owned(),
            description: format!("{name} for tests"),
            price: Money::from_cents(1999),
            compare_price: None,
            images: Vec::new(),
            category: ProductCategory::Other,
            tags: vec!["test".to_owned()],
            inventory: 10,
            featured: false,
            status: ProductStatus::Active,
        })
        .await
}

/// Insert a user and return the session snapshot handlers would see.
///
/// # Errors
///
/// Returns the repository error if the insert fails.
///
/// # Panics
///
/// If `email` is not a valid address.
#[allow(clippy::expect_used)]
pub async fn insert_user(pool: &PgPool, name: &str, email: &str) -> Result<CurrentUser, RepositoryError> {
    let email = Email::parse(email).expect("test email must be valid");
    let user = UserRepository::new(pool)
        .create(name, &email, UNUSABLE_PASSWORD_HASH)
        .await?;
    Ok(CurrentUser::from(&user))
}

/// Insert a review row directly, without refreshing the product's rating.
///
/// Used to create drift between stored ratings and review rows.
///
/// # Errors
///
/// Returns the repository error if the insert fails.
///
/// # Panics
///
/// If `stars` is outside 1..=5.
#[allow(clippy::expect_used)]
pub async fn insert_review_row(
    pool: &PgPool,
    product_id: ProductId,
    user: &CurrentUser,
    stars: i64,
) -> Result<(), RepositoryError> {
    ReviewRepository::new(pool)
        .create(&NewReview {
            product_id,
            user_id: user.id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            rating: Rating::new(stars).expect("test rating must be 1..=5"),
            title: "Test review".to_owned(),
            comment: "Written by an integration test.".to_owned(),
            verified_purchase: false,
        })
        .await
        .map(|_| ())
}

/// Insert `count` users named `{prefix} N`.
///
/// # Errors
///
/// Returns the repository error if an insert fails.
pub async fn insert_users(
    pool: &PgPool,
    prefix: &str,
    count: usize,
) -> Result<Vec<CurrentUser>, RepositoryError> {
    let mut users = Vec::with_capacity(count);
    for n in 1..=count {
        users.push(insert_user(pool, &format!("{prefix} {n}"), &unique_email(prefix)).await?);
    }
    Ok(users)
}

/// Reload a product, failing the test if it vanished.
///
/// # Panics
///
/// If the query fails or the product doesn't exist.
#[allow(clippy::expect_used)]
pub async fn reload_product(pool: &PgPool, id: ProductId) -> Product {
    ProductRepository::new(pool)
        .get(id)
        .await
        .expect("product query failed")
        .expect("product should exist")
}
