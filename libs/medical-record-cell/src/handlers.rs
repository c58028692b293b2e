use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateMedicalRecordRequest, UpdateMedicalRecordRequest};
use crate::services::MedicalRecordService;

#[axum::debug_handler]
pub async fn create_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateMedicalRecordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = MedicalRecordService::new(&config);

    let record = service.create_record(request, auth.token()).await?;

    Ok((StatusCode::CREATED, Json(json!(record))))
}

#[axum::debug_handler]
pub async fn get_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let record = service.get_record(record_id, auth.token()).await?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn list_records(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let records = service.list_records(auth.token()).await?;

    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn get_patient_records(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let records = service.patient_records(patient_id, auth.token()).await?;

    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn count_patient_records(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let count = service
        .count_patient_records(patient_id, auth.token())
        .await?;

    Ok(Json(json!({ "count": count })))
}

#[axum::debug_handler]
pub async fn get_doctor_records(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let records = service.doctor_records(doctor_id, auth.token()).await?;

    Ok(Json(json!(records)))
}

#[derive(Debug, serde::Deserialize)]
pub struct DiagnosisSearchQuery {
    pub keyword: String,
}

#[axum::debug_handler]
pub async fn search_records_by_diagnosis(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DiagnosisSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let records = service
        .search_by_diagnosis(&query.keyword, auth.token())
        .await?;

    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn get_upcoming_follow_ups(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let records = service.upcoming_follow_ups(auth.token()).await?;

    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn update_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(record_id): Path<Uuid>,
    Json(request): Json<UpdateMedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&config);

    let record = service
        .update_record(record_id, request, auth.token())
        .await?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn delete_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(record_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = MedicalRecordService::new(&config);

    service.delete_record(record_id, auth.token()).await?;

    Ok(StatusCode::NO_CONTENT)
}
