//! Checkout, cancellation and order numbering against `PostgreSQL`.
//!
//! These tests require `DATABASE_URL` pointing at a server where the test
//! user may create databases. Run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use bazaar_core::{Money, OrderId, OrderNumber, OrderStatus};
use bazaar_integration_tests::{insert_product, insert_users, reload_product};
use bazaar_storefront::db::orders::MAX_ORDER_NUMBER_ATTEMPTS;
use bazaar_storefront::db::{CartRepository, OrderRepository, RepositoryError};
use bazaar_storefront::error::AppError;
use bazaar_storefront::models::order::{OrderItem, ShippingInfo};
use bazaar_storefront::models::product::Product;
use bazaar_storefront::services::checkout::{CheckoutError, CheckoutService};
use chrono::{TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::PgPool;
use sqlx::types::Json;

/// Cancel/checkout pairs raced against each other.
const ROUNDS: usize = 20;

fn shipping() -> ShippingInfo {
    ShippingInfo {
        full_name: "Order Tester".to_owned(),
        email: "orders@example.com".to_owned(),
        phone: None,
        address_line1: "1 Test Street".to_owned(),
        address_line2: None,
        city: "Testville".to_owned(),
        state: "TS".to_owned(),
        postal_code: "12345".to_owned(),
        country: "US".to_owned(),
    }
}

fn item(product: &Product) -> OrderItem {
    OrderItem {
        product_id: Some(product.id),
        name: product.name.clone(),
        price: product.price,
        images: product.images.clone(),
        quantity: 1,
    }
}

/// Deterministic, well-formed order numbers.
fn numbers(seed: u64) -> impl Iterator<Item = OrderNumber> {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    std::iter::repeat_with(move || OrderNumber::generate(now, &mut rng))
}

// ============================================================================
// Lock ordering
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_cancel_and_checkout_on_shared_products_both_succeed(pool: PgPool) {
    let anvil = insert_product(&pool, "Anvil").await.unwrap();
    let bucket = insert_product(&pool, "Bucket").await.unwrap();
    let users = insert_users(&pool, "shopper", 2).await.unwrap();
    let (canceller, buyer) = (&users[0], &users[1]);
    let carts = CartRepository::new(&pool);
    let checkout = CheckoutService::new(&pool);
    let total = Money::from_cents(3998);

    for _ in 0..ROUNDS {
        // Items listed anvil first; the cart below is filled bucket first.
        let mut conn = pool.acquire().await.unwrap();
        let pending = OrderRepository::create(&mut conn, canceller.id, &shipping(), total, total)
            .await
            .unwrap();
        OrderRepository::add_items(&mut conn, pending.id, &[item(&anvil), item(&bucket)])
            .await
            .unwrap();
        drop(conn);

        carts.add(buyer.id, bucket.id, 1).await.unwrap();
        carts.add(buyer.id, anvil.id, 1).await.unwrap();

        let address = shipping();
        let (cancelled, placed) = tokio::join!(
            checkout.cancel_own(pending.id, canceller.id),
            checkout.place_order(buyer.id, &address),
        );
        assert_eq!(cancelled.unwrap().order.status, OrderStatus::Cancelled);
        assert_eq!(placed.unwrap().items.len(), 2);
    }

    // Each round restocks one of each and sells one of each.
    assert_eq!(reload_product(&pool, anvil.id).await.inventory, 10);
    assert_eq!(reload_product(&pool, bucket.id).await.inventory, 10);
}

// ============================================================================
// Order numbers
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_colliding_order_number_is_regenerated(pool: PgPool) {
    let buyer = insert_users(&pool, "buyer", 1).await.unwrap().remove(0);
    let mut drawn = numbers(1);
    let taken = drawn.next().unwrap();
    let fresh = drawn.next().unwrap();
    let total = Money::from_cents(500);
    let mut conn = pool.acquire().await.unwrap();

    let existing = taken.clone();
    OrderRepository::create_numbered(&mut conn, buyer.id, &shipping(), total, total, move || {
        existing.clone()
    })
    .await
    .unwrap();

    let mut queue = vec![fresh.clone(), taken];
    let mut draws = 0;
    let order = OrderRepository::create_numbered(&mut conn, buyer.id, &shipping(), total, total, || {
        draws += 1;
        queue.pop().unwrap()
    })
    .await
    .unwrap();

    assert_eq!(order.order_number, fresh);
    assert_eq!(draws, 2);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_order_number_exhaustion_is_server_error(pool: PgPool) {
    let buyer = insert_users(&pool, "buyer", 1).await.unwrap().remove(0);
    let taken = numbers(2).next().unwrap();
    let total = Money::from_cents(500);
    let mut conn = pool.acquire().await.unwrap();

    let existing = taken.clone();
    OrderRepository::create_numbered(&mut conn, buyer.id, &shipping(), total, total, move || {
        existing.clone()
    })
    .await
    .unwrap();

    let mut draws = 0;
    let result = OrderRepository::create_numbered(&mut conn, buyer.id, &shipping(), total, total, || {
        draws += 1;
        taken.clone()
    })
    .await;

    assert_eq!(draws, MAX_ORDER_NUMBER_ATTEMPTS);
    let err = result.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let err = AppError::from(CheckoutError::Repository(err));
    assert_eq!(err.status().as_u16(), 500);
    assert_eq!(err.client_message(), "Internal server error");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_malformed_stored_order_number_is_rejected(pool: PgPool) {
    let buyer = insert_users(&pool, "buyer", 1).await.unwrap().remove(0);
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO storefront.order (order_number, user_id, shipping_info, subtotal, total)
        VALUES ('legacy-42', $1, $2, 0, 0)
        RETURNING id
        ",
    )
    .bind(buyer.id)
    .bind(Json(shipping()))
    .fetch_one(&pool)
    .await
    .unwrap();

    let err = OrderRepository::new(&pool)
        .get(OrderId::new(id))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("malformed order number"), "{err}");
}
