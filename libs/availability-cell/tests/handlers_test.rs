use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use availability_cell::router::availability_routes;
use shared_utils::test_utils::test_state;

fn authed_request(
    method: &str,
    uri: &str,
    tenant_id: Uuid,
    role: &str,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-tenant-id", tenant_id.to_string())
        .header("x-role", role);
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn weekday_rules() -> Value {
    json!([
        {
            "day_of_week": 1,
            "start_time": "09:00:00",
            "end_time": "12:00:00",
            "slot_duration_minutes": 30,
        },
        {
            "day_of_week": 3,
            "start_time": "14:00:00",
            "end_time": "17:00:00",
            "slot_duration_minutes": 30,
        },
    ])
}

#[tokio::test]
async fn requests_without_identity_headers_are_unauthorized() {
    let app = availability_routes(test_state());

    let request = Request::builder()
        .method("GET")
        .uri(format!("/slots?provider_id={}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn generated_slots_are_listed_back_in_order() {
    let app = availability_routes(test_state());
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();

    let body = json!({
        "provider_id": provider_id,
        "horizon_days": 14,
        "rules": weekday_rules(),
    });
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/generate",
            tenant_id,
            "provider",
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    // Two weekdays over two weeks, 6 half-hour slots per day, minus any day
    // already past in the current week.
    let created = payload["schedule"]["slots_created"].as_i64().unwrap();
    assert!(created >= 6, "expected at least one full day, got {created}");

    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/slots?provider_id={}", provider_id),
            tenant_id,
            "front_desk",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    let slots = payload["slots"].as_array().unwrap();
    assert_eq!(slots.len() as i64, created);

    let starts: Vec<&str> = slots
        .iter()
        .map(|slot| slot["start_time"].as_str().unwrap())
        .collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[tokio::test]
async fn front_desk_cannot_generate_schedules() {
    let app = availability_routes(test_state());

    let body = json!({
        "provider_id": Uuid::new_v4(),
        "rules": weekday_rules(),
    });
    let response = app
        .oneshot(authed_request(
            "POST",
            "/generate",
            Uuid::new_v4(),
            "front_desk",
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inverted_rule_window_is_a_bad_request() {
    let app = availability_routes(test_state());

    let body = json!({
        "provider_id": Uuid::new_v4(),
        "rules": [{
            "day_of_week": 2,
            "start_time": "15:00:00",
            "end_time": "09:00:00",
            "slot_duration_minutes": 30,
        }],
    });
    let response = app
        .oneshot(authed_request(
            "POST",
            "/generate",
            Uuid::new_v4(),
            "tenant_admin",
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_duration_and_horizon_are_bad_requests() {
    let app = availability_routes(test_state());

    let body = json!({
        "provider_id": Uuid::new_v4(),
        "rules": [{
            "day_of_week": 2,
            "start_time": "09:00:00",
            "end_time": "17:00:00",
            "slot_duration_minutes": i64::MAX,
        }],
    });
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/generate",
            Uuid::new_v4(),
            "provider",
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({
        "provider_id": Uuid::new_v4(),
        "horizon_days": i64::MAX,
        "rules": weekday_rules(),
    });
    let response = app
        .oneshot(authed_request(
            "POST",
            "/generate",
            Uuid::new_v4(),
            "provider",
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regenerating_replaces_the_open_slots() {
    let app = availability_routes(test_state());
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();

    let first = json!({
        "provider_id": provider_id,
        "horizon_days": 7,
        "rules": weekday_rules(),
    });
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/generate",
            tenant_id,
            "provider",
            Some(first),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Narrow the schedule to a single weekday; the old open slots go away.
    let second = json!({
        "provider_id": provider_id,
        "horizon_days": 7,
        "rules": [{
            "day_of_week": 1,
            "start_time": "09:00:00",
            "end_time": "10:00:00",
            "slot_duration_minutes": 30,
        }],
    });
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/generate",
            tenant_id,
            "provider",
            Some(second),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert!(payload["schedule"]["slots_removed"].as_i64().unwrap() > 0);

    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/slots?provider_id={}", provider_id),
            tenant_id,
            "provider",
            None,
        ))
        .await
        .unwrap();
    let payload = response_json(response).await;
    let slots = payload["slots"].as_array().unwrap();
    // At most two half-hour slots per remaining weekday occurrence.
    assert!(slots.len() <= 2);
}
