use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/", get(handlers::get_all_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", put(handlers::update_appointment))
        .route("/{appointment_id}", delete(handlers::delete_appointment))
        .route("/{appointment_id}/cancel", patch(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", patch(handlers::complete_appointment))
        .route("/patient/{patient_id}", get(handlers::get_patient_appointments))
        .route(
            "/patient/{patient_id}/upcoming",
            get(handlers::get_upcoming_patient_appointments),
        )
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_appointments))
        .route(
            "/doctor/{doctor_id}/upcoming",
            get(handlers::get_upcoming_doctor_appointments),
        )
        .route(
            "/doctor/{doctor_id}/date/{date}",
            get(handlers::get_doctor_appointments_by_date),
        )
        .route("/status/{status}", get(handlers::get_appointments_by_status))
        .with_state(state)
}
