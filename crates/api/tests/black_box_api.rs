use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use lustre_api::app::AppServices;
use lustre_auth::{JwtClaims, Role};
use lustre_core::UserId;
use lustre_infra::{LogNotifier, NotificationDispatcher};
use lustre_orders::ShippingPolicy;
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, bound to an ephemeral port.
        let services = AppServices::in_memory(
            ShippingPolicy {
                flat_fee: 500,
                free_over: None,
            },
            NotificationDispatcher::inline(Arc::new(LogNotifier)),
        );
        let app = lustre_api::app::build_app(JWT_SECRET.to_string(), services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, token, None).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, token, Some(body)).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, token, Some(body)).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: i64, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(user_id),
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn customer(id: i64) -> String {
    mint_jwt(id, vec![Role::CUSTOMER])
}

fn staff() -> String {
    mint_jwt(900, vec![Role::STAFF])
}

fn checkout_body() -> Value {
    json!({
        "items": [{
            "product_id": 42,
            "name": "Gold pendant",
            "metal_type": "gold",
            "purity": "22K",
            "weight_grams": 8.4,
            "price": 4500,
            "quantity": 2
        }],
        "shipping_address": {
            "name": "Asha Rao",
            "phone": "9800000001",
            "email": "asha@example.com",
            "address": "12 MG Road",
            "city": "Pune"
        },
        "payment_method": "cod"
    })
}

async fn place_order(srv: &TestServer, token: &str) -> i64 {
    let (status, body) = srv.post("/orders", token, checkout_body()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn set_status(srv: &TestServer, id: i64, status: &str) -> (StatusCode, Value) {
    srv.put(
        &format!("/orders/admin/{id}/status"),
        &staff(),
        json!({ "status": status }),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = srv.get("/orders/mine", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/whoami", &customer(17)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 17);
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "customer"));
}

#[tokio::test]
async fn customer_checkout_and_history() {
    let srv = TestServer::spawn().await;
    let token = customer(10);

    let (status, created) = srv.post("/orders", &token, checkout_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["subtotal"], 9000);
    assert_eq!(created["shipping_cost"], 500);
    assert_eq!(created["total"], 9500);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["payment_status"], "pending");
    assert!(created["order_number"].as_str().unwrap().starts_with("ORD-"));
    let id = created["id"].as_i64().unwrap();

    let (status, mine) = srv.get("/orders/mine", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, detail) = srv.get(&format!("/orders/mine/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["order"]["items"][0]["line_total"], 9000);
    assert_eq!(detail["tracking"].as_array().unwrap().len(), 1);
    assert_eq!(detail["tracking"][0]["notes"], "Order placed");
}

#[tokio::test]
async fn invalid_checkout_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let token = customer(10);

    let mut body = checkout_body();
    body["items"] = json!([]);
    let (status, err) = srv.post("/orders", &token, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");

    let mut body = checkout_body();
    body["payment_method"] = json!("barter");
    let (status, _) = srv.post("/orders", &token, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv.post("/orders", &token, json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_cannot_use_back_office_routes() {
    let srv = TestServer::spawn().await;
    let token = customer(10);
    let id = place_order(&srv, &token).await;

    let (status, body) = srv.get("/orders/admin/all", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = srv
        .put(
            &format!("/orders/admin/{id}/status"),
            &token,
            json!({ "status": "shipped" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn staff_moves_orders_forward_only() {
    let srv = TestServer::spawn().await;
    let id = place_order(&srv, &customer(10)).await;

    let (status, order) = set_status(&srv, id, "shipped").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "shipped");

    let (status, err) = set_status(&srv, id, "pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_transition");

    let (status, _) = set_status(&srv, id, "delivered").await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = set_status(&srv, id, "processing").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["message"].as_str().unwrap().contains("delivered"));

    let (_, detail) = srv.get(&format!("/orders/admin/{id}"), &staff()).await;
    let statuses: Vec<&str> = detail["tracking"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["pending", "shipped", "delivered"]);
}

#[tokio::test]
async fn shipped_order_can_be_marked_paid() {
    let srv = TestServer::spawn().await;
    let id = place_order(&srv, &customer(10)).await;
    set_status(&srv, id, "shipped").await;

    let (status, order) = srv
        .put(
            &format!("/orders/admin/{id}/payment"),
            &staff(),
            json!({ "payment_status": "paid" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_status"], "paid");
    assert_eq!(order["status"], "shipped");

    let (status, _) = srv
        .put(
            &format!("/orders/admin/{id}/payment"),
            &staff(),
            json!({ "payment_status": "bitcoin" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customer_cancellation_rules() {
    let srv = TestServer::spawn().await;
    let owner = customer(10);
    let stranger = customer(11);
    let first = place_order(&srv, &owner).await;
    let second = place_order(&srv, &owner).await;

    let (status, _) = srv
        .put(&format!("/orders/mine/{first}/cancel"), &stranger, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, order) = srv
        .put(
            &format!("/orders/mine/{first}/cancel"),
            &owner,
            json!({ "reason": "Ordered the wrong size" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");

    set_status(&srv, second, "confirmed").await;
    let (status, err) = srv
        .put(&format!("/orders/mine/{second}/cancel"), &owner, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["message"].as_str().unwrap().contains("confirmed"));

    let (status, _) = srv.get(&format!("/orders/mine/{second}"), &stranger).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_body_is_optional_but_must_be_well_formed() {
    let srv = TestServer::spawn().await;
    let owner = customer(10);
    let id = place_order(&srv, &owner).await;
    let path = format!("/orders/mine/{id}/cancel");

    let (status, err) = srv.put(&path, &owner, json!({ "reason": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");
    let (_, detail) = srv.get(&format!("/orders/mine/{id}"), &owner).await;
    assert_eq!(detail["order"]["status"], "pending");

    let (status, order) = srv.send(reqwest::Method::PUT, &path, &owner, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    let (_, detail) = srv.get(&format!("/orders/mine/{id}"), &owner).await;
    assert_eq!(detail["tracking"][1]["notes"], "Cancelled by customer");
}

#[tokio::test]
async fn bad_ids_and_missing_orders() {
    let srv = TestServer::spawn().await;

    let (status, err) = srv.get("/orders/admin/abc", &staff()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_id");

    let (status, err) = srv.get("/orders/admin/999", &staff()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (status, _) = set_status(&srv, 999, "shipped").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_creates_offline_order_for_walk_in_customer() {
    let srv = TestServer::spawn().await;
    let mut body = checkout_body();
    body["shipping_address"]["email"] = Value::Null;
    body["customer"] = json!({ "name": "Ravi Menon", "email": "ravi@example.com" });
    body["shipping_cost"] = json!(0);
    body["status"] = json!("delivered");
    body["payment_status"] = json!("paid");

    let (status, created) = srv.post("/orders/admin/offline", &staff(), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["customer"]["created"], true);
    assert_eq!(created["customer"]["email"], "ravi@example.com");
    assert!(created["customer"].get("password_hash").is_none());
    assert!(created["order"]["order_number"].as_str().unwrap().starts_with("OFF-"));
    assert_eq!(created["order"]["total"], 9000);
    assert_eq!(created["order"]["status"], "delivered");
    assert_eq!(created["order"]["shipping"]["email"], "ravi@example.com");
    assert_eq!(created["tracking"][0]["notes"], "Offline order created");

    let (status, again) = srv.post("/orders/admin/offline", &staff(), body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["customer"]["created"], false);
    assert_eq!(again["customer"]["id"], created["customer"]["id"]);

    let (status, _) = srv
        .post(
            "/orders/admin/offline",
            &staff(),
            json!({ "customer_id": 4242, "items": checkout_body()["items"],
                    "shipping_address": checkout_body()["shipping_address"],
                    "payment_method": "cod" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_listing_filters_and_pages() {
    let srv = TestServer::spawn().await;
    for _ in 0..3 {
        place_order(&srv, &customer(10)).await;
    }
    let mut offline = checkout_body();
    offline["customer"] = json!({ "name": "Walk In", "email": "walkin@example.com" });
    srv.post("/orders/admin/offline", &staff(), offline).await;

    let (status, page) = srv.get("/orders/admin/all?channel=offline", &staff()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["channel"], "offline");

    let (_, page) = srv
        .get("/orders/admin/all?channel=online&page=2&limit=2", &staff())
        .await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (status, err) = srv.get("/orders/admin/all?status=lost", &staff()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");
}
