use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub phone: Option<String>,
    pub consultation_fee: Option<f64>,
    pub qualifications: Option<String>,
    pub years_of_experience: Option<i32>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub phone: Option<String>,
    pub consultation_fee: Option<f64>,
    pub qualifications: Option<String>,
    pub years_of_experience: Option<i32>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub consultation_fee: Option<f64>,
    pub qualifications: Option<String>,
    pub years_of_experience: Option<i32>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSearchQuery {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub available_only: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<DbError> for DoctorError {
    fn from(err: DbError) -> Self {
        DoctorError::Store(err.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::Store(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_carries_the_title() {
        let doctor = Doctor {
            id: Uuid::new_v4(),
            first_name: "Aoife".to_string(),
            last_name: "Murphy".to_string(),
            specialization: "Cardiology".to_string(),
            phone: None,
            consultation_fee: Some(80.0),
            qualifications: None,
            years_of_experience: Some(12),
            available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(doctor.full_name(), "Dr. Aoife Murphy");
    }

    #[test]
    fn create_request_defaults_to_available() {
        let request: CreateDoctorRequest = serde_json::from_value(serde_json::json!({
            "first_name": "Aoife",
            "last_name": "Murphy",
            "specialization": "Cardiology"
        }))
        .unwrap();
        assert!(request.available);
    }
}
