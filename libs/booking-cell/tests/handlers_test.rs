// libs/booking-cell/tests/handlers_test.rs
//
// Routes end to end: router -> handler -> engine -> mocked PostgREST.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::router::booking_routes;
use shared_config::AppConfig;

fn create_test_app(mock_server: &MockServer) -> Router {
    let config = AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-key".to_string(),
    };
    booking_routes(Arc::new(config))
}

// Handlers evaluate against the real clock, so fixtures live safely in
// the future.
fn future_date() -> NaiveDate {
    (Utc::now() + Duration::days(30)).date_naive()
}

fn preparer_json(preparer_id: Uuid) -> Value {
    json!({
        "id": preparer_id,
        "display_name": "Dana Ruiz",
        "booking_enabled": true,
        "allow_phone_bookings": true,
        "allow_video_bookings": true,
        "allow_in_person_bookings": true,
        "requires_approval": false
    })
}

fn rule_json(preparer_id: Uuid, date: NaiveDate) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "preparer_id": preparer_id,
        "kind": "regular",
        "weekday": date.weekday().num_days_from_sunday(),
        "start_time": "09:00:00",
        "end_time": "17:00:00",
        "active": true
    })
}

async fn mount_booking_mocks(mock_server: &MockServer, preparer_id: Uuid, date: NaiveDate) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/preparers"))
        .and(query_param("id", format!("eq.{}", preparer_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([preparer_json(preparer_id)])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_rules"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([rule_json(preparer_id, date)])),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn available_slots_route_returns_the_day_listing() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();
    let date = future_date();
    mount_booking_mocks(&mock_server, preparer_id, date).await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/{}/available-slots?date={}&duration_minutes=60",
                    preparer_id, date
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    // 09:00-17:00 on a half-hour grid with hour-long slots.
    assert_eq!(body["total_slots"], 15);
    assert_eq!(body["available_slots"][0]["start_label"], "9:00 AM");
}

#[tokio::test]
async fn conflicts_route_reports_a_clear_interval() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();
    let date = future_date();
    mount_booking_mocks(&mock_server, preparer_id, date).await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/{}/conflicts?start={}T10:00:00Z&end={}T11:00:00Z",
                    preparer_id, date, date
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["has_conflict"], false);
}

#[tokio::test]
async fn validate_slot_route_accepts_an_open_interval() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();
    let date = future_date();
    mount_booking_mocks(&mock_server, preparer_id, date).await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/validate-slot", preparer_id))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "start_time": format!("{}T10:00:00Z", date),
                        "duration_minutes": 60
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn validate_slot_route_rejects_a_past_start() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();
    let date = future_date();
    mount_booking_mocks(&mock_server, preparer_id, date).await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/validate-slot", preparer_id))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "start_time": "2020-01-06T10:00:00Z",
                        "duration_minutes": 60
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    // Rejections are a 200 with valid=false, not an HTTP error.
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "cannot book a time in the past");
}

#[tokio::test]
async fn next_available_route_finds_the_first_slot() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();
    let date = future_date();
    mount_booking_mocks(&mock_server, preparer_id, date).await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/{}/next-available?duration_minutes=60&start_from={}T00:00:00Z",
                    preparer_id, date
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["next_available_slot"]["start_label"], "9:00 AM");
}

#[tokio::test]
async fn schedule_route_rejects_an_inverted_range() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/{}/schedule?start_date=2030-06-10&end_date=2030-06-01",
                    preparer_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_route_is_not_found_for_an_unknown_preparer() {
    let mock_server = MockServer::start().await;
    let preparer_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/preparers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/{}/schedule?start_date=2030-06-01&end_date=2030-06-07",
                    preparer_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
