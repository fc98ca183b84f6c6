//! Checkout against a real database.
//!
//! Each test gets a migrated scratch database from `#[sqlx::test]` and drives
//! the router the way a browser would, one [`TestClient`] per visitor.

#![allow(clippy::unwrap_used)]

use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use sqlx::PgPool;

use greenshop_integration_tests::{TestClient, body_text, location};

const CHECKOUT_FORM: &str = "first_name=Anna&last_name=Petrova&email=anna%40example.com\
     &phone=%2B79990000000&address=Lenina+1&city=Moscow&postal_code=101000&notes=";

const NO_ACCESS: &str = "You do not have access to this order.";

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

async fn category(pool: &PgPool) -> i32 {
    sqlx::query_scalar("INSERT INTO categories (name, slug) VALUES ('Home', 'home') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn product(pool: &PgPool, category_id: i32, name: &str, price: &str, is_active: bool) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO products (category_id, name, slug, price, stock, is_active) \
         VALUES ($1, $2, $3, $4, 10, $5) RETURNING id",
    )
    .bind(category_id)
    .bind(name)
    .bind(name.to_lowercase().replace(' ', "-"))
    .bind(dec(price))
    .bind(is_active)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn set_price(pool: &PgPool, product_id: i32, price: &str) {
    sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
        .bind(product_id)
        .bind(dec(price))
        .execute(pool)
        .await
        .unwrap();
}

async fn order_lines(pool: &PgPool) -> Vec<(i32, i32, Decimal)> {
    sqlx::query_as("SELECT product_id, quantity, unit_price FROM order_items ORDER BY product_id")
        .fetch_all(pool)
        .await
        .unwrap()
}

/// Number of units in the client's cart, read through the JSON endpoint.
async fn cart_units(client: &mut TestClient) -> u64 {
    let request = Request::post("/cart/remove/0")
        .header("x-requested-with", "XMLHttpRequest")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = client.send(request).await;
    let summary: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    summary["items"].as_u64().unwrap()
}

/// Place an order and return its confirmation URL.
async fn place_order(client: &mut TestClient) -> String {
    let response = client.post("/checkout", CHECKOUT_FORM).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let url = location(&response).unwrap().to_owned();
    assert!(url.starts_with("/order/") && url.ends_with("/confirmation"), "{url}");
    url
}

async fn register(client: &mut TestClient, username: &str) {
    let body = format!(
        "username={username}&email={username}%40example.com\
         &password1=violet-harbor-92&password2=violet-harbor-92"
    );
    let response = client.post("/register", &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_checkout_writes_one_item_per_line_at_captured_prices(pool: PgPool) {
    let home = category(&pool).await;
    let soap = product(&pool, home, "Olive Soap", "150.00", true).await;
    let brush = product(&pool, home, "Bamboo Brush", "249.90", true).await;

    let mut client = TestClient::new(pool.clone());
    for (uri, quantity) in [
        (format!("/cart/add/{soap}"), "quantity=2"),
        (format!("/cart/add/{brush}"), "quantity=1"),
        (format!("/cart/add/{soap}"), "quantity=1"),
    ] {
        let response = client.post(&uri, quantity).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    // Raised after it went into the cart: the cart keeps the old price.
    set_price(&pool, soap, "999.00").await;

    let confirmation = place_order(&mut client).await;

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 1);
    assert_eq!(
        order_lines(&pool).await,
        vec![(soap, 3, dec("150.00")), (brush, 1, dec("249.90"))]
    );
    assert_eq!(cart_units(&mut client).await, 0);

    let response = client.get(&confirmation).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Petrova"));

    // Later catalog edits leave the order history alone.
    set_price(&pool, soap, "1.00").await;
    set_price(&pool, brush, "1.00").await;
    assert_eq!(
        order_lines(&pool).await,
        vec![(soap, 3, dec("150.00")), (brush, 1, dec("249.90"))]
    );
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_adding_inactive_product_is_not_found(pool: PgPool) {
    let home = category(&pool).await;
    let hidden = product(&pool, home, "Retired Jar", "90.00", false).await;

    let mut client = TestClient::new(pool);
    let response = client.post(&format!("/cart/add/{hidden}"), "quantity=1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(cart_units(&mut client).await, 0);

    let response = client.post("/cart/add/4040", "quantity=1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_guest_confirmation_is_only_for_the_placing_session(pool: PgPool) {
    let home = category(&pool).await;
    let soap = product(&pool, home, "Olive Soap", "150.00", true).await;

    let mut buyer = TestClient::new(pool.clone());
    buyer.post(&format!("/cart/add/{soap}"), "quantity=1").await;
    let confirmation = place_order(&mut buyer).await;

    let mut stranger = TestClient::new(pool);
    let response = stranger.get(&confirmation).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
    let home_page = body_text(stranger.get("/").await).await;
    assert!(home_page.contains(NO_ACCESS));
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_account_confirmation_is_only_for_its_owner(pool: PgPool) {
    let home = category(&pool).await;
    let soap = product(&pool, home, "Olive Soap", "150.00", true).await;

    let mut owner = TestClient::new(pool.clone());
    register(&mut owner, "anna").await;
    owner.post(&format!("/cart/add/{soap}"), "quantity=1").await;
    let confirmation = place_order(&mut owner).await;

    let linked: Option<i32> = sqlx::query_scalar("SELECT user_id FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(linked.is_some());

    let mut other = TestClient::new(pool);
    register(&mut other, "boris").await;
    let response = other.get(&confirmation).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
    assert!(body_text(other.get("/").await).await.contains(NO_ACCESS));

    assert_eq!(owner.get(&confirmation).await.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_cart_of_deleted_products_counts_as_empty(pool: PgPool) {
    let home = category(&pool).await;
    let soap = product(&pool, home, "Olive Soap", "10.00", true).await;

    let mut client = TestClient::new(pool.clone());
    client.post(&format!("/cart/add/{soap}"), "quantity=1").await;
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(soap)
        .execute(&pool)
        .await
        .unwrap();

    let response = client.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/catalog"));

    let response = client.post("/checkout", CHECKOUT_FORM).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/catalog"));
    assert!(order_lines(&pool).await.is_empty());
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn test_checkout_total_skips_deleted_products(pool: PgPool) {
    let home = category(&pool).await;
    let soap = product(&pool, home, "Olive Soap", "150.00", true).await;
    let jar = product(&pool, home, "Glass Jar", "10.00", true).await;

    let mut client = TestClient::new(pool.clone());
    client.post(&format!("/cart/add/{soap}"), "quantity=1").await;
    client.post(&format!("/cart/add/{jar}"), "quantity=1").await;
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(jar)
        .execute(&pool)
        .await
        .unwrap();

    let response = client.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Total: 150.00 ₽"), "{body}");
    assert!(!body.contains("Glass Jar &times;"));

    place_order(&mut client).await;
    assert_eq!(order_lines(&pool).await, vec![(soap, 1, dec("150.00"))]);
}
