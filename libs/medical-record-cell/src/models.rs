use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub record_date: NaiveDate,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub test_results: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub prescription: Option<String>,
    /// Defaults to today when omitted.
    pub record_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub test_results: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMedicalRecordRequest {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub test_results: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum MedicalRecordError {
    #[error("Medical record not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<DbError> for MedicalRecordError {
    fn from(err: DbError) -> Self {
        MedicalRecordError::Store(err.to_string())
    }
}

impl From<MedicalRecordError> for AppError {
    fn from(err: MedicalRecordError) -> Self {
        match err {
            MedicalRecordError::NotFound
            | MedicalRecordError::PatientNotFound
            | MedicalRecordError::DoctorNotFound => AppError::NotFound(err.to_string()),
            MedicalRecordError::Store(msg) => AppError::Database(msg),
        }
    }
}
