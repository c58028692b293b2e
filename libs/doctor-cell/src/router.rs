use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_doctor))
        .route("/", get(handlers::list_doctors))
        .route("/available", get(handlers::list_available_doctors))
        .route("/search", get(handlers::search_doctors))
        .route(
            "/specialization/{specialization}",
            get(handlers::get_doctors_by_specialization),
        )
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}", put(handlers::update_doctor))
        .route("/{doctor_id}", delete(handlers::delete_doctor))
        .route(
            "/{doctor_id}/availability",
            patch(handlers::toggle_doctor_availability),
        )
        .with_state(state)
}
