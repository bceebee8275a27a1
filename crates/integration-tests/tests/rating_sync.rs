//! Rating recompute and review submission against `PostgreSQL`.
//!
//! These tests require `DATABASE_URL` pointing at a server where the test
//! user may create databases. Run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use bazaar_core::{ProductId, RatingSummary};
use bazaar_integration_tests::{
    insert_product, insert_review_row, insert_users, reload_product,
};
use bazaar_storefront::db::ProductRepository;
use bazaar_storefront::services::ratings::{RatingSyncError, RatingSynchronizer, RecomputeOutcome};
use bazaar_storefront::services::reviews::{ReviewError, ReviewInput, ReviewService};
use sqlx::PgPool;

fn review(stars: i64) -> ReviewInput {
    ReviewInput {
        rating: stars,
        title: "Solid".to_owned(),
        comment: "Does what it says.".to_owned(),
    }
}

// ============================================================================
// recompute_one
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recompute_uses_rounded_mean(pool: PgPool) {
    let product = insert_product(&pool, "Kettle").await.unwrap();
    let users = insert_users(&pool, "rater", 3).await.unwrap();
    for (user, stars) in users.iter().zip([5, 4, 4]) {
        insert_review_row(&pool, product.id, user, stars).await.unwrap();
    }

    let outcome = RatingSynchronizer::new(&pool)
        .recompute_one(product.id)
        .await
        .unwrap();

    let stored = reload_product(&pool, product.id).await;
    assert!((stored.rating - 4.3).abs() < f64::EPSILON);
    assert_eq!(stored.review_count, 3);
    assert_eq!(outcome, RecomputeOutcome::Updated(stored.rating_summary()));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recompute_five_four_three(pool: PgPool) {
    let product = insert_product(&pool, "Lamp").await.unwrap();
    let users = insert_users(&pool, "rater", 3).await.unwrap();
    for (user, stars) in users.iter().zip([5, 4, 3]) {
        insert_review_row(&pool, product.id, user, stars).await.unwrap();
    }

    RatingSynchronizer::new(&pool)
        .recompute_one(product.id)
        .await
        .unwrap();

    let stored = reload_product(&pool, product.id).await;
    assert!((stored.rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(stored.review_count, 3);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recompute_without_reviews_leaves_rating(pool: PgPool) {
    let product = insert_product(&pool, "Rug").await.unwrap();

    // A stale pair with no review rows behind it.
    let stale = RatingSummary {
        rating: 3.5,
        review_count: 2,
    };
    let mut conn = pool.acquire().await.unwrap();
    ProductRepository::write_rating(&mut conn, product.id, stale)
        .await
        .unwrap();
    drop(conn);

    let outcome = RatingSynchronizer::new(&pool)
        .recompute_one(product.id)
        .await
        .unwrap();

    assert_eq!(outcome, RecomputeOutcome::NoReviews);
    let stored = reload_product(&pool, product.id).await;
    assert_eq!(stored.rating_summary(), stale);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recompute_missing_product(pool: PgPool) {
    let missing = ProductId::new(999_999);
    let result = RatingSynchronizer::new(&pool).recompute_one(missing).await;
    assert!(matches!(result, Err(RatingSyncError::ProductNotFound(id)) if id == missing));
}

// ============================================================================
// recompute_all
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recompute_all_is_idempotent(pool: PgPool) {
    let reviewed = insert_product(&pool, "Chair").await.unwrap();
    let unreviewed = insert_product(&pool, "Table").await.unwrap();
    let users = insert_users(&pool, "rater", 2).await.unwrap();
    for (user, stars) in users.iter().zip([2, 5]) {
        insert_review_row(&pool, reviewed.id, user, stars).await.unwrap();
    }

    let synchronizer = RatingSynchronizer::new(&pool);
    let first = synchronizer.recompute_all().await.unwrap();
    let after_first = (
        reload_product(&pool, reviewed.id).await.rating_summary(),
        reload_product(&pool, unreviewed.id).await.rating_summary(),
    );

    let second = synchronizer.recompute_all().await.unwrap();
    let after_second = (
        reload_product(&pool, reviewed.id).await.rating_summary(),
        reload_product(&pool, unreviewed.id).await.rating_summary(),
    );

    assert_eq!(first, second);
    assert_eq!(first.scanned, 2);
    assert_eq!(first.updated, 1);
    assert_eq!(first.without_reviews, 1);
    assert_eq!(after_first, after_second);
    assert!((after_first.0.rating - 3.5).abs() < f64::EPSILON);
}

// ============================================================================
// Review submission
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_second_review_rejected(pool: PgPool) {
    let product = insert_product(&pool, "Backpack").await.unwrap();
    let users = insert_users(&pool, "reviewer", 1).await.unwrap();
    let service = ReviewService::new(&pool);

    let first = service
        .submit(product.id, &users[0], review(4).validate().unwrap())
        .await
        .unwrap();
    assert_eq!(first.product.review_count, 1);

    let second = service
        .submit(product.id, &users[0], review(1).validate().unwrap())
        .await;
    assert!(matches!(second, Err(ReviewError::AlreadyReviewed)));

    let stored = reload_product(&pool, product.id).await;
    assert_eq!(stored.review_count, 1);
    assert!((stored.rating - 4.0).abs() < f64::EPSILON);
}

#[test]
fn test_out_of_range_rating_rejected() {
    for stars in [0, 6] {
        assert!(matches!(
            review(stars).validate(),
            Err(ReviewError::InvalidRating(_))
        ));
    }
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_submissions_both_counted(pool: PgPool) {
    let product = insert_product(&pool, "Tent").await.unwrap();
    let users = insert_users(&pool, "camper", 2).await.unwrap();

    let service_a = ReviewService::new(&pool);
    let service_b = ReviewService::new(&pool);
    let (a, b) = tokio::join!(
        service_a.submit(product.id, &users[0], review(5).validate().unwrap()),
        service_b.submit(product.id, &users[1], review(3).validate().unwrap()),
    );
    a.unwrap();
    b.unwrap();

    let stored = reload_product(&pool, product.id).await;
    assert_eq!(stored.review_count, 2);
    assert!((stored.rating - 4.0).abs() < f64::EPSILON);
}
