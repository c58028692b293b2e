use std::sync::Arc;

use async_trait::async_trait;
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};
use appointment_cell::services::{
    AppointmentLifecycleService, AppointmentStore, EntityDirectory,
};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

mockall::mock! {
    Directory {}

    #[async_trait]
    impl EntityDirectory for Directory {
        async fn doctor_exists(
            &self,
            doctor_id: Uuid,
            auth_token: &str,
        ) -> Result<bool, AppointmentError>;

        async fn patient_exists(
            &self,
            patient_id: Uuid,
            auth_token: &str,
        ) -> Result<bool, AppointmentError>;
    }
}

const TOKEN: &str = "test-token";

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
    }
}

fn service_with(
    server: &MockServer,
    directory: MockDirectory,
) -> AppointmentLifecycleService {
    let supabase = Arc::new(SupabaseClient::new(&test_config(server)));
    let store = Arc::new(AppointmentStore::new(supabase));
    AppointmentLifecycleService::with_parts(store, Arc::new(directory))
}

fn permissive_directory() -> MockDirectory {
    let mut directory = MockDirectory::new();
    directory.expect_doctor_exists().returning(|_, _| Ok(true));
    directory.expect_patient_exists().returning(|_, _| Ok(true));
    directory
}

fn booking_request(doctor_id: Uuid, patient_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id,
        doctor_id,
        appointment_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        reason: Some("Annual check-up".to_string()),
        notes: None,
    }
}

fn appointment_row(
    id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    date: &str,
    time: &str,
    status: &str,
) -> serde_json::Value {
    json!({
        "id": id,
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": date,
        "appointment_time": time,
        "status": status,
        "reason": "Annual check-up",
        "notes": null,
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": "2025-03-01T12:00:00Z"
    })
}

async fn mount_free_slot_check(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn booking_a_free_slot_returns_scheduled_appointment() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let created_id = Uuid::new_v4();

    mount_free_slot_check(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(
            created_id, doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let appointment = service
        .book(booking_request(doctor_id, patient_id), TOKEN)
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.doctor_id, doctor_id);
}

#[tokio::test]
async fn booking_an_occupied_slot_is_rejected_without_persisting() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    // A scheduled appointment already holds the slot.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let err = service
        .book(booking_request(doctor_id, patient_id), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::SlotConflict);
}

#[tokio::test]
async fn availability_check_ignores_cancelled_appointments() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let created_id = Uuid::new_v4();

    // The occupancy query filters on status=neq.cancelled, so a slot held
    // only by a cancelled appointment comes back empty and booking goes
    // through.
    mount_free_slot_check(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(
            created_id, doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let appointment = service
        .book(booking_request(doctor_id, patient_id), TOKEN)
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn concurrent_loser_gets_slot_conflict_from_store_constraint() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    // Pre-check sees a free slot, but the partial unique index rejects the
    // insert because another writer got there first.
    mount_free_slot_check(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_slot_unique\""
        })))
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let err = service
        .book(booking_request(doctor_id, patient_id), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::SlotConflict);
}

#[tokio::test]
async fn booking_with_unknown_doctor_fails() {
    let server = MockServer::start().await;

    let mut directory = MockDirectory::new();
    directory.expect_doctor_exists().returning(|_, _| Ok(false));
    directory.expect_patient_exists().never();

    let service = service_with(&server, directory);
    let err = service
        .book(booking_request(Uuid::new_v4(), Uuid::new_v4()), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::DoctorNotFound);
}

#[tokio::test]
async fn booking_with_unknown_patient_fails() {
    let server = MockServer::start().await;

    let mut directory = MockDirectory::new();
    directory.expect_doctor_exists().returning(|_, _| Ok(true));
    directory.expect_patient_exists().returning(|_, _| Ok(false));

    let service = service_with(&server, directory);
    let err = service
        .book(booking_request(Uuid::new_v4(), Uuid::new_v4()), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::PatientNotFound);
}

#[tokio::test]
async fn cancel_forces_status_regardless_of_current_state() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    // Already completed; cancel still overwrites, by design.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "09:00:00", "completed"
        )])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "09:00:00", "cancelled"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let cancelled = service.cancel(id, TOKEN).await.unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn reschedule_to_same_slot_skips_availability_check() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"
        )])))
        .mount(&server)
        .await;

    // No occupancy query may fire when date and time are unchanged.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"
        )])))
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let request = UpdateAppointmentRequest {
        appointment_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        reason: Some("Updated reason".to_string()),
        notes: Some("Bring previous results".to_string()),
        status: AppointmentStatus::Scheduled,
    };

    let updated = service.reschedule(id, request, TOKEN).await.unwrap();
    assert_eq!(updated.id, id);
}

#[tokio::test]
async fn reschedule_excludes_itself_from_the_slot_check() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"
        )])))
        .mount(&server)
        .await;

    // Occupancy query must carry id=neq.<self> so the moved appointment
    // does not collide with itself.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .and(query_param("id", format!("neq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "10:00:00", "scheduled"
        )])))
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let request = UpdateAppointmentRequest {
        appointment_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        reason: None,
        notes: None,
        status: AppointmentStatus::Scheduled,
    };

    let updated = service.reschedule(id, request, TOKEN).await.unwrap();
    assert_eq!(
        updated.appointment_time,
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn reschedule_into_an_occupied_slot_leaves_appointment_unmodified() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(
            id, doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"
        )])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let request = UpdateAppointmentRequest {
        appointment_date: NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        reason: None,
        notes: None,
        status: AppointmentStatus::Scheduled,
    };

    let err = service.reschedule(id, request, TOKEN).await.unwrap_err();
    assert_matches!(err, AppointmentError::SlotConflict);
}

#[tokio::test]
async fn mutations_on_missing_appointments_fail_not_found() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());

    assert_matches!(
        service.cancel(id, TOKEN).await.unwrap_err(),
        AppointmentError::NotFound
    );
    assert_matches!(
        service.complete(id, TOKEN).await.unwrap_err(),
        AppointmentError::NotFound
    );
    assert_matches!(
        service.delete(id, TOKEN).await.unwrap_err(),
        AppointmentError::NotFound
    );

    let request = UpdateAppointmentRequest {
        appointment_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        reason: None,
        notes: None,
        status: AppointmentStatus::Scheduled,
    };
    assert_matches!(
        service.reschedule(id, request, TOKEN).await.unwrap_err(),
        AppointmentError::NotFound
    );
}

#[tokio::test]
async fn upcoming_patient_appointments_are_ordered_by_date_then_time() {
    let server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    let rows = json!([
        appointment_row(Uuid::new_v4(), doctor_id, patient_id, "2025-03-10", "09:00:00", "scheduled"),
        appointment_row(Uuid::new_v4(), doctor_id, patient_id, "2025-03-11", "14:00:00", "scheduled"),
        appointment_row(Uuid::new_v4(), doctor_id, patient_id, "2025-03-12", "10:00:00", "scheduled"),
    ]);

    // The mock only matches when the query asks the store for ascending
    // (date, time) ordering and a date lower bound.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param(
            "order",
            "appointment_date.asc,appointment_time.asc",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_with(&server, permissive_directory());
    let upcoming: Vec<Appointment> = service
        .upcoming_for_patient(patient_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(upcoming.len(), 3);
    assert_eq!(
        upcoming[0].appointment_date,
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    );
    assert_eq!(
        upcoming[1].appointment_time,
        NaiveTime::from_hms_opt(14, 0, 0).unwrap()
    );
    assert_eq!(
        upcoming[2].appointment_date,
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    );
}
