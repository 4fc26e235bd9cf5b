use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{seed_open_slot, test_state, test_state_with_webhook};

fn authed_request(method: &str, uri: &str, tenant_id: Uuid, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-tenant-id", tenant_id.to_string())
        .header("x-role", "front_desk")
        .header("x-actor-id", Uuid::new_v4().to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_without_identity_headers_is_unauthorized() {
    let state = test_state();
    let app = appointment_routes(state);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(json!({}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_an_open_slot_returns_the_appointment() {
    let state = test_state();
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();
    let slot_id = seed_open_slot(&state.store, provider_id, 24).await;
    let app = appointment_routes(state);

    let body = json!({
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "slot_id": slot_id,
        "notes": "first visit",
    });
    let response = app
        .oneshot(authed_request("POST", "/", tenant_id, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["appointment"]["tenant_id"], json!(tenant_id));
    assert_eq!(payload["appointment"]["status"], json!("scheduled"));
}

#[tokio::test]
async fn booking_a_taken_slot_returns_conflict() {
    let state = test_state();
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();
    let slot_id = seed_open_slot(&state.store, provider_id, 24).await;
    let app = appointment_routes(state);

    let body = json!({
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "slot_id": slot_id,
    });
    let first = app
        .clone()
        .oneshot(authed_request("POST", "/", tenant_id, body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(authed_request("POST", "/", tenant_id, body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn appointment_of_another_tenant_is_not_accessible() {
    let state = test_state();
    let provider_id = Uuid::new_v4();
    let owner_tenant = Uuid::new_v4();
    let slot_id = seed_open_slot(&state.store, provider_id, 24).await;
    let app = appointment_routes(state);

    let body = json!({
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "slot_id": slot_id,
    });
    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", owner_tenant, body))
        .await
        .unwrap();
    let appointment_id = response_json(response).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let other_tenant = Uuid::new_v4();
    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", appointment_id))
        .header("x-tenant-id", other_tenant.to_string())
        .header("x-role", "front_desk")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn finalize_flow_completes_and_reports_billing() {
    let state = test_state();
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();
    let slot_id = seed_open_slot(&state.store, provider_id, 24).await;
    let app = appointment_routes(state);

    let body = json!({
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "slot_id": slot_id,
    });
    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", tenant_id, body))
        .await
        .unwrap();
    let appointment_id = response_json(response).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let clinical = json!({
        "chief_complaint": "headache",
        "diagnosis": "migraine",
        "consultation_fee": 500.0,
        "treatments": [{"name": "injection", "price": 200.0}],
        "discount": 100.0,
        "notes": null,
    });
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            &format!("/{}/finalize", appointment_id),
            tenant_id,
            clinical.clone(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["billing"]["total"], json!(600.0));

    // Finalizing again is a conflict, not a duplicate record.
    let again = app
        .oneshot(authed_request(
            "POST",
            &format!("/{}/finalize", appointment_id),
            tenant_id,
            clinical,
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn patching_to_completed_is_a_bad_request() {
    let state = test_state();
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();
    let slot_id = seed_open_slot(&state.store, provider_id, 24).await;
    let app = appointment_routes(state);

    let body = json!({
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "slot_id": slot_id,
    });
    let response = app
        .clone()
        .oneshot(authed_request("POST", "/", tenant_id, body))
        .await
        .unwrap();
    let appointment_id = response_json(response).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let patch = json!({"status": "completed", "reason": null, "notes": null});
    let response = app
        .oneshot(authed_request(
            "PATCH",
            &format!("/{}", appointment_id),
            tenant_id,
            patch,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_posts_a_notification_to_the_webhook() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/scheduling"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let webhook_url = format!("{}/hooks/scheduling", mock_server.uri());
    let state = test_state_with_webhook(&webhook_url);
    let provider_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();
    let slot_id = seed_open_slot(&state.store, provider_id, 24).await;
    let app = appointment_routes(state);

    let body = json!({
        "patient_id": Uuid::new_v4(),
        "provider_id": provider_id,
        "slot_id": slot_id,
    });
    let response = app
        .oneshot(authed_request("POST", "/", tenant_id, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delivery runs on a spawned task after the response; wait for it to
    // arrive before the drop-time expectation check.
    for _ in 0..100 {
        let received = mock_server.received_requests().await.unwrap_or_default();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
