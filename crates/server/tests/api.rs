//! Router-level tests for behaviour that is decided before any query runs.
//! The pool connects lazily and points nowhere, so a handler that reached the
//! database would fail with a 5xx instead of the status asserted here.

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::{DBService, PoolSettings};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{
    config::{Config, Environment},
    create_router,
    state::AppState,
};
use tower::ServiceExt;
use utils::auth::{Claims, encode_claims};

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    let config = Config {
        database_url: "postgres://localhost/unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: Environment::Test,
        jwt_secret: SECRET.to_string(),
        token_ttl: Duration::from_secs(3600),
        admin_emails: Vec::new(),
        cors_origins: Vec::new(),
        db: PoolSettings::default(),
        request_timeout: Duration::from_secs(5),
        sentry_dsn: None,
    };
    let db = DBService::new_lazy(&config.database_url, &config.db).unwrap();
    create_router(AppState::new(config, db))
}

fn token(is_admin: bool) -> String {
    let claims = Claims::new(1, "ops@thatsmartsite.com", is_admin, Duration::from_secs(3600));
    encode_claims(&claims, SECRET).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_liveness_probe() {
    let response = app()
        .oneshot(Request::get("/api/health/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "alive");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let response = app()
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_invalid_review_is_rejected() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            json!({
                "tenant_slug": "shine-co",
                "customer_name": "Dana Smith",
                "rating": 9,
                "comment": "Great work",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Rating must be between 1 and 5");
}

#[tokio::test]
async fn test_invalid_service_is_rejected() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/services",
            json!({
                "tenant_id": 1,
                "service_category_id": 12,
                "name": "",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_signup_is_rejected() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/tenants/signup",
            json!({
                "firstName": "J",
                "lastName": "Price",
                "personalPhone": "5125550100",
                "personalEmail": "not-an-email",
                "businessName": "Jordan's Mobile Detail",
                "businessPhone": "+15125550199",
                "businessAddress": {
                    "address": "100 Congress Ave",
                    "city": "Austin",
                    "state": "TX",
                    "zip": "78701"
                },
                "selectedPlan": "basic",
                "planPrice": 0.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let response = app()
        .oneshot(
            Request::delete("/api/admin/tenants/5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app()
        .oneshot(
            Request::get("/api/admin/pending-applications")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_token_is_forbidden() {
    let response = app()
        .oneshot(
            Request::get("/api/admin/pending-applications")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(false)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_rejects_non_numeric_tenant_id() {
    let response = app()
        .oneshot(
            Request::delete("/api/admin/tenants/abc?dry_run=true")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(true)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_approval_validates_slug_before_lookup() {
    let response = app()
        .oneshot(
            Request::post("/api/admin/approve-application/7")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(true)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "approved_slug": "Bad--Slug" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_robots_for_preview_host() {
    let response = app()
        .oneshot(
            Request::get("/robots.txt")
                .header(header::HOST, "shine-preview.thatsmartsite.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "User-agent: *\nDisallow: /\n");
}

#[tokio::test]
async fn test_robots_for_live_host_points_at_sitemap() {
    let response = app()
        .oneshot(
            Request::get("/robots.txt")
                .header(header::HOST, "shine.thatsmartsite.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Disallow: /api"));
    assert!(body.contains("Sitemap: https://shine.thatsmartsite.com/sitemap.xml"));
}

#[tokio::test]
async fn test_preview_sitemap_cache_header() {
    let app = app();
    let request = || {
        Request::get("/sitemap.xml")
            .header(header::HOST, "localhost:5173")
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-sitemap-cache"], "MISS");
    assert!(body_text(first).await.contains("<urlset"));

    let second = app.oneshot(request()).await.unwrap();
    assert_eq!(second.headers()["x-sitemap-cache"], "HIT");
}

#[tokio::test]
async fn test_malformed_json_gets_json_error_body() {
    let response = app()
        .oneshot(
            Request::post("/api/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"tenant_slug\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_wrong_field_type_and_bad_query_get_json_errors() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/reviews/id/3/vote",
            json!({ "vote_type": "sideways" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);

    let response = app()
        .oneshot(
            Request::get("/api/reviews/shine-co?limit=lots")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_non_numeric_path_gets_json_error() {
    let response = app()
        .oneshot(
            Request::delete("/api/reviews/id/abc")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(true)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_review_edit_requires_admin() {
    let response = app()
        .oneshot(json_request("PUT", "/api/reviews/id/3", json!({ "rating": 4 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_review_edit_needs_a_field() {
    let response = app()
        .oneshot(
            Request::put("/api/reviews/id/3")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(true)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No valid fields to update");
}

#[tokio::test]
async fn test_me_requires_a_token() {
    let response = app()
        .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Authentication required");
}

#[tokio::test]
async fn test_logout_is_stateless() {
    let response = app()
        .oneshot(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Logout successful");
}

#[tokio::test]
async fn test_login_and_register_validate_before_lookup() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "", "password": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "owner@example.com", "password": "short", "name": "Owner" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "password must be between 8 and 128 characters");
}

#[tokio::test]
async fn test_user_listing_is_admin_only() {
    let response = app()
        .oneshot(
            Request::get("/api/admin/users?status=clients")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(false)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_repeated_login_attempts_are_rate_limited() {
    let app = app();
    let attempt = |ip: &str| {
        Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(json!({ "email": "", "password": "" }).to_string()))
            .unwrap()
    };

    for _ in 0..3 {
        let response = app.clone().oneshot(attempt("203.0.113.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app.clone().oneshot(attempt("203.0.113.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Too many requests from this IP, please try again later."
    );

    let response = app.oneshot(attempt("203.0.113.10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
