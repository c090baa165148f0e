use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use leadgen::admin::{admin_router, AdminSite, AdminState};
use leadgen::db::{migrate, seed_demo, Database};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn seeded_router() -> (TempDir, axum::Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Database::new(dir.path().join("db.sqlite3"));
    let mut conn = database.open().expect("open database");
    migrate(&conn).expect("schema");
    seed_demo(&mut conn).expect("seed");
    drop(conn);

    let state = Arc::new(AdminState {
        site: Arc::new(AdminSite::lead_generation().expect("registrations are valid")),
        database,
    });
    (dir, admin_router(state))
}

async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    (status, body.to_vec())
}

async fn get_json(router: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn index_lists_every_registered_model() {
    let (_dir, router) = seeded_router();
    let (status, payload) = get_json(&router, "/admin/api/models").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = payload["models"]
        .as_array()
        .expect("models array")
        .iter()
        .filter_map(|model| model["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec!["lead", "neighborhoodmedian", "permit", "property", "scraperrun"]
    );
}

#[tokio::test]
async fn model_endpoint_exposes_registration_metadata() {
    let (_dir, router) = seeded_router();
    let (status, payload) = get_json(&router, "/admin/api/models/Property").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["table"], "properties");
    assert_eq!(payload["ordering"], serde_json::json!(["-market_value"]));
    assert!(payload["list_filter"]
        .as_array()
        .expect("filters")
        .iter()
        .any(|field| field == "enrichment_status"));
}

#[tokio::test]
async fn leads_list_is_ordered_by_score() {
    let (_dir, router) = seeded_router();
    let (status, payload) = get_json(&router, "/admin/api/models/lead/records").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["count"], 3);
    let scores: Vec<i64> = payload["results"]
        .as_array()
        .expect("results")
        .iter()
        .filter_map(|row| row["score"].as_i64())
        .collect();
    assert_eq!(scores, vec![91, 68, 35]);
    assert_eq!(payload["results"][0]["lead_tier"], "hot");
}

#[tokio::test]
async fn records_support_search_and_filters() {
    let (_dir, router) = seeded_router();
    let (status, payload) =
        get_json(&router, "/admin/api/models/permit/records?city=Dallas&q=pine").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["count"], 1);
    assert_eq!(payload["results"][0]["permit_number"], "BP-2025-0310");

    let (status, payload) =
        get_json(&router, "/admin/api/models/scraperrun/records?status=failed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["count"], 1);
    assert_eq!(payload["results"][0]["city"], "Dallas");
}

#[tokio::test]
async fn unknown_filter_is_a_bad_request() {
    let (_dir, router) = seeded_router();
    let (status, payload) =
        get_json(&router, "/admin/api/models/permit/records?valuation=1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("valuation"));
}

#[tokio::test]
async fn unregistered_model_is_not_found() {
    let (_dir, router) = seeded_router();
    let (status, _) = get_json(&router, "/admin/api/models/contractor/records").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_export_returns_attachment() {
    let (_dir, router) = seeded_router();
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/api/models/neighborhoodmedian/export.csv")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"neighborhood_medians.csv\"")
    );
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("id,neighborhood_code,city,median_market_value,sample_size,computed_at")
    );
    // Ordered by city, then neighborhood code.
    assert!(lines.next().expect("first row").contains("Austin"));
    assert!(lines.next().expect("second row").contains("Dallas"));
}

#[tokio::test]
async fn missing_database_is_an_internal_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = Arc::new(AdminState {
        site: Arc::new(AdminSite::lead_generation().expect("site")),
        database: Database::new(dir.path().join("absent.sqlite3")),
    });
    let router = admin_router(state);

    let (status, payload) = get_json(&router, "/admin/api/models/permit/records").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("absent.sqlite3"));
}
