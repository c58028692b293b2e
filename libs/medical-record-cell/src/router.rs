use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn medical_record_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_record))
        .route("/", get(handlers::list_records))
        .route("/search", get(handlers::search_records_by_diagnosis))
        .route("/follow-ups", get(handlers::get_upcoming_follow_ups))
        .route("/patient/{patient_id}", get(handlers::get_patient_records))
        .route(
            "/patient/{patient_id}/count",
            get(handlers::count_patient_records),
        )
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_records))
        .route("/{record_id}", get(handlers::get_record))
        .route("/{record_id}", put(handlers::update_record))
        .route("/{record_id}", delete(handlers::delete_record))
        .with_state(state)
}
