use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use shop_hex::application::notification::NotificationDispatcher;
use shop_hex::application::order_service::OrderService;
use shop_hex::application::stock_service::StockService;
use shop_hex::inbound::http::auth::{AuthKeys, Role};
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::memory::InMemoryRepo;
use shop_types::domain::id::ObjectId;
use shop_types::domain::notification::Notification;
use shop_types::domain::product::Product;
use shop_types::ports::notifier::{Notifier, NotifyError};
use shop_types::ports::product_repository::ProductRepository;

const SECRET: &str = "integration-secret";
const USER: &str = "64b7f0c2a1b2c3d4e5f60718";
const ADMIN: &str = "64b7f0c2a1b2c3d4e5f60719";

#[derive(Clone, Default)]
struct Outbox(Arc<Mutex<Vec<Notification>>>);

#[async_trait]
impl Notifier for Outbox {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

struct TestApp {
    addr: String,
    client: reqwest::Client,
    user_token: String,
    admin_token: String,
    product: Product,
    outbox: Outbox,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn_app() -> TestApp {
    let port = find_free_port();
    let config = HttpServerConfig {
        port: port.to_string(),
        allowed_origins: vec!["http://localhost:3000".into()],
    };

    let repo = InMemoryRepo::new();
    let product = repo
        .insert_product(Product::new("Widget", 1999, 12).unwrap())
        .await
        .unwrap();

    let outbox = Outbox::default();
    let orders = OrderService::new(
        repo.clone(),
        NotificationDispatcher::new(outbox.clone(), "ops@example.com", Duration::from_secs(1)),
    );
    let stock = StockService::new(repo.clone());
    let keys = AuthKeys::new(SECRET);
    let user_token = keys.issue(USER, Role::User).unwrap();
    let admin_token = keys.issue(ADMIN, Role::Admin).unwrap();

    let server = HttpServer::new(orders, stock, keys, config).await.unwrap();
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    // Give the server a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestApp {
        addr: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        user_token,
        admin_token,
        product,
        outbox,
        handle,
    }
}

fn order_body(product_id: &str, quantity: i64) -> Value {
    json!({
        "items": [{ "productId": product_id, "quantity": quantity }],
        "shippingAddress": {
            "street": "12 Rue de la Paix",
            "city": "Paris",
            "postalCode": "75002",
            "country": "France"
        },
        "paymentMethod": "Carte bancaire",
        "shippingMethod": "colissimo"
    })
}

#[tokio::test]
async fn create_list_update_delete_over_http() {
    let app = spawn_app().await;
    let product_id = app.product.id.to_string();

    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .json(&order_body(&product_id, 2))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["message"], "Order created successfully.");
    assert_eq!(created["order"]["status"], "Pending");
    assert_eq!(created["order"]["totalCents"], 3998);
    assert_eq!(created["order"]["userId"], USER);
    let id = created["order"]["id"].as_str().unwrap().to_string();

    let fetched: Value = app
        .client
        .get(format!("{}/api/orders/{}", app.addr, id))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["items"][0]["productId"], product_id.as_str());
    assert_eq!(fetched["items"][0]["unitPriceCents"], 1999);

    let list: Vec<Value> = app
        .client
        .get(format!("{}/api/orders", app.addr))
        .header("Cookie", format!("token={}", app.admin_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());

    let res = app
        .client
        .patch(format!("{}/api/orders/{}/validate", app.addr, id))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let validated: Value = res.json().await.unwrap();
    assert_eq!(validated["order"]["status"], "Processing");

    let res = app
        .client
        .patch(format!("{}/api/orders/{}/status", app.addr, id))
        .bearer_auth(&app.admin_token)
        .json(&json!({ "status": "Shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["order"]["status"], "Shipped");

    let res = app
        .client
        .delete(format!("{}/api/orders/{}", app.addr, id))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let deleted: Value = res.json().await.unwrap();
    assert_eq!(deleted["message"], "Order deleted successfully.");

    let res = app
        .client
        .get(format!("{}/api/orders/{}", app.addr, id))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Delivery runs in a detached task.
    let mut sent = Vec::new();
    for _ in 0..20 {
        sent = app.outbox.0.lock().unwrap().clone();
        if !sent.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New order created");
    assert!(sent[0].text.contains(&product_id));
}

#[tokio::test]
async fn auth_is_enforced() {
    let app = spawn_app().await;
    let product_id = app.product.id.to_string();

    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .json(&order_body(&product_id, 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = AuthKeys::new("not-the-secret")
        .issue(ADMIN, Role::Admin)
        .unwrap();
    let res = app
        .client
        .get(format!("{}/api/orders", app.addr))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .client
        .get(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access denied.");

    let res = app
        .client
        .patch(format!("{}/api/products/{}/stock", app.addr, product_id))
        .bearer_auth(&app.user_token)
        .json(&json!({ "stock": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .get(format!("{}/health", app.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_request_and_not_found_paths() {
    let app = spawn_app().await;

    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .json(&json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "The order information is invalid.");
    assert!(!body["details"].as_array().unwrap().is_empty());

    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .json(&json!({
            "items": [{ "productId": app.product.id.to_string(), "quantity": "many" }],
            "shippingAddress": {
                "street": "a",
                "city": "Paris",
                "postalCode": "75002",
                "country": "France"
            },
            "shippingMethod": "ups"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 4, "{details:?}");
    assert!(details.contains(&json!("items[0].quantity must be a number")));
    assert!(details.contains(&json!("paymentMethod is required")));

    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let ghost = ObjectId::new().to_string();
    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .json(&order_body(&ghost, 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["details"], json!([ghost]));

    let res = app
        .client
        .get(format!("{}/api/orders/not-an-id", app.addr))
        .bearer_auth(&app.admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .patch(format!("{}/api/orders/{}/status", app.addr, ObjectId::new()))
        .bearer_auth(&app.admin_token)
        .json(&json!({ "status": "Shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .client
        .post(format!("{}/api/orders", app.addr))
        .bearer_auth(&app.user_token)
        .header("Content-Type", "application/json")
        .body(" ".repeat(20 * 1024))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    assert!(app.outbox.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn products_are_public_and_stock_is_admin_editable() {
    let app = spawn_app().await;
    let product_id = app.product.id.to_string();

    let products: Vec<Value> = app
        .client
        .get(format!("{}/api/products", app.addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["stock"], 12);

    let res = app
        .client
        .patch(format!("{}/api/products/{}/stock", app.addr, product_id))
        .bearer_auth(&app.admin_token)
        .json(&json!({ "stock": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .patch(format!("{}/api/products/{}/stock", app.addr, product_id))
        .bearer_auth(&app.admin_token)
        .json(&json!({ "stock": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["product"]["stock"], 0);

    let res = app
        .client
        .patch(format!("{}/api/products/{}/stock", app.addr, ObjectId::new()))
        .bearer_auth(&app.admin_token)
        .json(&json!({ "stock": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
