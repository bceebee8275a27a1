//! End-to-end API tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bz-cli migrate`)
//! - A seeded catalog with at least one in-stock product (`bz-cli seed catalog`)
//! - The storefront running (`cargo run -p bazaar-storefront`)
//!
//! Run with: `cargo test -p bazaar-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bazaar_integration_tests::{storefront_url, unique_email};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

const TEST_PASSWORD: &str = "correct horse battery staple";

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a fresh account; the returned client carries its session.
async fn registered_client(prefix: &str) -> (Client, Value) {
    let client = client();
    let resp = client
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({
            "name": "Integration Tester",
            "email": unique_email(prefix),
            "password": TEST_PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = resp.json().await.expect("Invalid user JSON");
    (client, user)
}

/// First active product with stock, from the public catalog.
async fn in_stock_product(client: &Client) -> Value {
    let page: Value = client
        .get(format!("{}/products?limit=50", storefront_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid catalog JSON");

    page["items"]
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .find(|p| p["inventory"].as_i64().unwrap_or(0) > 1)
        })
        .cloned()
        .expect("Catalog needs an in-stock product; run `bz-cli seed catalog`")
}

// ============================================================================
// Health & auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_checks() {
    let client = client();
    for path in ["/health", "/health/ready"] {
        let resp = client
            .get(format!("{}{path}", storefront_url()))
            .send()
            .await
            .expect("Health request failed");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert!(resp.headers().contains_key("x-request-id"));
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_me_logout() {
    let (client, user) = registered_client("session").await;
    assert_eq!(user["role"], "user");

    let me: Value = client
        .get(format!("{}/auth/me", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["id"], user["id"]);

    let resp = client
        .post(format!("{}/auth/logout", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{}/auth/me", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_email_conflicts() {
    let email = unique_email("dup");
    let body = json!({ "name": "Dup", "email": email, "password": TEST_PASSWORD });

    let first = client()
        .post(format!("{}/auth/register", storefront_url()))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client()
        .post(format!("{}/auth/register", storefront_url()))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let err: Value = second.json().await.unwrap();
    assert!(err["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_customer_cannot_reach_admin() {
    let (client, _) = registered_client("not-admin").await;
    let resp = client
        .get(format!("{}/admin/dashboard", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(format!("{}/sync-ratings", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_review_submission_and_duplicate() {
    let (client, _) = registered_client("reviewer").await;
    let product = in_stock_product(&client).await;
    let url = format!("{}/products/{}/reviews", storefront_url(), product["id"]);

    let out_of_range = client
        .post(&url)
        .json(&json!({ "rating": 6, "title": "Too good", "comment": "Off the scale" }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let created = client
        .post(&url)
        .json(&json!({ "rating": 4, "title": "Nice", "comment": "Works well" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await.unwrap();
    let count = body["product"]["reviewCount"].as_i64().unwrap();
    assert!(count >= 1);

    let duplicate = client
        .post(&url)
        .json(&json!({ "rating": 2, "title": "Again", "comment": "Second try" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let listing: Value = client
        .get(&url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["summary"]["totalReviews"].as_i64().unwrap(), count);
}

// ============================================================================
// Cart & checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_then_cancel_restocks() {
    let (client, _) = registered_client("shopper").await;
    let product = in_stock_product(&client).await;
    let stock_before = product["inventory"].as_i64().unwrap();

    let cart: Value = client
        .post(format!("{}/cart/items", storefront_url()))
        .json(&json!({ "productId": product["id"], "quantity": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 1);

    let resp = client
        .post(format!("{}/orders", storefront_url()))
        .json(&json!({
            "shippingInfo": {
                "fullName": "Integration Tester",
                "email": "shopper@example.com",
                "addressLine1": "1 Test Street",
                "city": "Testville",
                "state": "TS",
                "postalCode": "12345",
                "country": "US"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));

    let cart: Value = client
        .get(format!("{}/cart", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 0);

    let cancelled: Value = client
        .post(format!("{}/orders/{}/cancel", storefront_url(), order["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cancelled["status"], "cancelled");

    let after: Value = client
        .get(format!("{}/products/{}", storefront_url(), product["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["inventory"].as_i64().unwrap(), stock_before);
}
