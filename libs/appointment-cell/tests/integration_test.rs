use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;

fn test_app(server: &MockServer) -> Router {
    let config = AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
    };
    appointment_routes(Arc::new(config))
}

fn appointment_row(id: Uuid, doctor_id: Uuid, patient_id: Uuid) -> Value {
    json!({
        "id": id,
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": "2025-03-10",
        "appointment_time": "09:00:00",
        "status": "scheduled",
        "reason": "Annual check-up",
        "notes": null,
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": "2025-03-01T12:00:00Z"
    })
}

async fn mount_entity_lookups(server: &MockServer, doctor_id: Uuid, patient_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": doctor_id }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": patient_id }])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn post_booking_returns_201_with_scheduled_appointment() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let created_id = Uuid::new_v4();

    mount_entity_lookups(&server, doctor_id, patient_id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([appointment_row(created_id, doctor_id, patient_id)])),
        )
        .mount(&server)
        .await;

    let body = json!({
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": "2025-03-10",
        "appointment_time": "09:00:00",
        "reason": "Annual check-up",
        "notes": null
    });

    let response = test_app(&server)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let appointment: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["id"], json!(created_id));
}

#[tokio::test]
async fn post_booking_on_occupied_slot_returns_409() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    mount_entity_lookups(&server, doctor_id, patient_id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&server)
        .await;

    let body = json!({
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": "2025-03-10",
        "appointment_time": "09:00:00",
        "reason": null,
        "notes": null
    });

    let response = test_app(&server)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_missing_appointment_returns_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = test_app(&server)
        .oneshot(
            Request::builder()
                .uri(&format!("/{}", Uuid::new_v4()))
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_appointments_with_bad_status_returns_400() {
    let server = MockServer::start().await;

    let response = test_app(&server)
        .oneshot(
            Request::builder()
                .uri("/status/no_show")
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_cancel_returns_cancelled_appointment() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([appointment_row(id, doctor_id, patient_id)])),
        )
        .mount(&server)
        .await;

    let mut cancelled = appointment_row(id, doctor_id, patient_id);
    cancelled["status"] = json!("cancelled");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled])))
        .mount(&server)
        .await;

    let response = test_app(&server)
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(&format!("/{}/cancel", id))
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let appointment: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(appointment["status"], "cancelled");
}
