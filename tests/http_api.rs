//! Integration tests for the REST API.
//!
//! Requests go through the full router (extractors, error rendering, and
//! layers) with `tower::ServiceExt::oneshot`, backed by in-memory stores and
//! the mock gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use visit_pass::adapters::gateway::{signature_for, CallbackVerifier, MockPaymentGateway};
use visit_pass::adapters::http::payment::SIGNATURE_HEADER;
use visit_pass::adapters::http::{router, AppState, LedgerPorts, LedgerSettings};
use visit_pass::adapters::memory::{
    InMemoryPaymentRepository, InMemorySubscriptionRepository, InMemoryTemplateRepository,
    InMemoryVisitRepository, ManualClock,
};
use visit_pass::domain::foundation::{PayerId, Timestamp, UserId};
use visit_pass::ports::GatewayPaymentStatus;

const CALLBACK_SECRET: &str = "callback-secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    gateway: MockPaymentGateway,
    staff: String,
}

impl TestApp {
    fn new() -> Self {
        let templates = Arc::new(InMemoryTemplateRepository::new());
        let gateway = MockPaymentGateway::new();
        let ports = LedgerPorts {
            payments: Arc::new(InMemoryPaymentRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            templates: templates.clone(),
            catalog: templates,
            visits: Arc::new(InMemoryVisitRepository::new()),
            gateway: Arc::new(gateway.clone()),
            clock: Arc::new(ManualClock::new(Timestamp::now())),
        };
        let settings = LedgerSettings {
            callback_verifier: CallbackVerifier::new(Some(SecretString::new(
                CALLBACK_SECRET.into(),
            ))),
            ..LedgerSettings::default()
        };

        Self {
            router: router(AppState::new(ports, settings), Duration::from_secs(10)),
            gateway,
            staff: UserId::new().to_string(),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, &body, None)).await
    }

    async fn post_as_staff(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, &body, Some(&self.staff)))
            .await
    }

    async fn create_template(&self, lessons: u32, price: i64) -> String {
        let (status, body) = self
            .post_as_staff(
                "/api/templates",
                json!({
                    "name": format!("Swimming, {} lessons", lessons),
                    "tariff": { "kind": "lessons", "count": lessons },
                    "price": { "amount": price, "currency": "RUB" }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Purchases and settles; returns (payment id, token).
    async fn active_subscription(&self, lessons: u32) -> (String, String) {
        let template_id = self.create_template(lessons, 28000).await;
        let (_, purchase) = self
            .post(
                "/api/subscriptions",
                json!({ "payer_id": PayerId::new().to_string(), "template_id": template_id }),
            )
            .await;
        let payment_id = purchase["payment_id"].as_str().unwrap().to_string();
        self.gateway
            .set_status_for_invoice(&payment_id, GatewayPaymentStatus::Success, None);
        let (status, _) = self
            .post(&format!("/api/payments/{}/check", payment_id), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = purchase["subscription"]["token"].as_str().unwrap().to_string();
        (payment_id, token)
    }
}

fn json_request(method: Method, uri: &str, body: &Value, staff: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(staff) = staff {
        builder = builder.header("X-User-Id", staff);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// =============================================================================
// Health & Errors
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::post("/api/subscriptions")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/payments/not-a-uuid/check", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn unknown_payment_is_not_found() {
    let app = TestApp::new();
    let id = uuid::Uuid::new_v4();
    let (status, body) = app
        .post(&format!("/api/payments/{}/check", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PAYMENT_NOT_FOUND");
}

// =============================================================================
// Templates
// =============================================================================

#[tokio::test]
async fn template_management_requires_staff_identity() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/templates",
            json!({
                "name": "Yoga",
                "tariff": { "kind": "unlimited" },
                "price": { "amount": 50000, "currency": "RUB" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_REQUIRED");
}

#[tokio::test]
async fn deactivated_templates_leave_the_catalog() {
    let app = TestApp::new();
    let keep = app.create_template(8, 28000).await;
    let drop = app.create_template(4, 16000).await;

    let (status, body) = app
        .post_as_staff(&format!("/api/templates/{}/deactivate", drop), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (_, list) = app.get("/api/templates").await;
    let ids: Vec<&str> = list["templates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![keep.as_str()]);

    let (status, body) = app
        .post(
            "/api/subscriptions",
            json!({ "payer_id": PayerId::new().to_string(), "template_id": drop }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TEMPLATE_INACTIVE");
}

#[tokio::test]
async fn lessons_tariff_without_count_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .post_as_staff(
            "/api/templates",
            json!({
                "name": "Broken",
                "tariff": { "kind": "lessons" },
                "price": { "amount": 1000, "currency": "RUB" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Purchase, Callback & Redemption
// =============================================================================

#[tokio::test]
async fn purchase_returns_redirect_and_pending_subscription() {
    let app = TestApp::new();
    let template_id = app.create_template(8, 28000).await;
    let payer_id = PayerId::new().to_string();

    let (status, body) = app
        .post(
            "/api/subscriptions",
            json!({ "payer_id": payer_id, "template_id": template_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["subscription"]["status"], "pending_payment");
    assert_eq!(body["subscription"]["remaining_credits"], 8);
    assert!(body["payment_redirect_url"].as_str().unwrap().starts_with("https://"));

    let (_, list) = app.get(&format!("/api/payers/{}/subscriptions", payer_id)).await;
    assert_eq!(list["subscriptions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn signed_callback_settles_the_payment() {
    let app = TestApp::new();
    let template_id = app.create_template(8, 28000).await;
    let (_, purchase) = app
        .post(
            "/api/subscriptions",
            json!({ "payer_id": PayerId::new().to_string(), "template_id": template_id }),
        )
        .await;
    let payment_id = purchase["payment_id"].as_str().unwrap();
    let token = purchase["subscription"]["token"].as_str().unwrap();
    app.gateway
        .set_status_for_invoice(payment_id, GatewayPaymentStatus::Success, None);

    // The body claims failure; only the gateway's answer counts
    let payload = json!({ "invoice_id": payment_id, "status": "error" }).to_string();
    let request = Request::post("/api/gateway/callback")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature_for(CALLBACK_SECRET, payload.as_bytes()))
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "succeeded");

    let (_, subscription) = app
        .get(&format!("/api/subscriptions/by-token/{}", token))
        .await;
    assert_eq!(subscription["status"], "active");
}

#[tokio::test]
async fn unsigned_callback_is_rejected() {
    let app = TestApp::new();
    let payload = json!({ "invoice_id": uuid::Uuid::new_v4().to_string() }).to_string();
    let request = Request::post("/api/gateway/callback")
        .header(SIGNATURE_HEADER, "00ff")
        .body(Body::from(payload))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!app.gateway.was_called("get_status"));
}

#[tokio::test]
async fn redeem_then_duplicate_scan_conflicts() {
    let app = TestApp::new();
    let (_, token) = app.active_subscription(8).await;
    let location_id = uuid::Uuid::new_v4().to_string();

    let (status, visit) = app
        .post(
            "/api/redemptions",
            json!({ "token": token, "location_id": location_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(visit["remaining_credits"], 7);
    assert_eq!(visit["subscription_status"], "active");

    let (status, body) = app
        .post(
            "/api/redemptions",
            json!({ "token": token, "location_id": location_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_REDEMPTION");
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/redemptions",
            json!({
                "token": "ZZZZZZZZZZZZZZZZZZZZZZZZ",
                "location_id": uuid::Uuid::new_v4().to_string()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn refund_over_http_closes_the_payment() {
    let app = TestApp::new();
    let (payment_id, token) = app.active_subscription(8).await;

    let (status, body) = app
        .post_as_staff(
            &format!("/api/payments/{}/refund", payment_id),
            json!({ "reason": "moved away" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["payment"]["status"], "refunded");
    assert_eq!(body["remaining"]["amount"], 0);

    let (status, body) = app
        .post_as_staff(
            &format!("/api/payments/{}/refund", payment_id),
            json!({ "amount": 100 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PAYMENT_NOT_REFUNDABLE");

    // The refunded subscription no longer resolves
    let (status, body) = app
        .post(
            "/api/redemptions",
            json!({ "token": token, "location_id": uuid::Uuid::new_v4().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "INVALID_TOKEN");
}
