use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorSearchQuery, UpdateDoctorRequest,
};

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    fn returning_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!(
            "Creating doctor record for {} {} ({})",
            request.first_name, request.last_name, request.specialization
        );

        let now = chrono::Utc::now();
        let doctor_data = json!({
            "id": Uuid::new_v4(),
            "first_name": request.first_name,
            "last_name": request.last_name,
            "specialization": request.specialization,
            "phone": request.phone,
            "consultation_fee": request.consultation_fee,
            "qualifications": request.qualifications,
            "years_of_experience": request.years_of_experience,
            "available": request.available,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(auth_token),
                Some(doctor_data),
                Some(Self::returning_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Store("Insert returned no row".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| DoctorError::Store(format!("Failed to parse doctor: {}", e)))
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| DoctorError::Store(format!("Failed to parse doctor: {}", e)))
    }

    pub async fn list_doctors(&self, auth_token: &str) -> Result<Vec<Doctor>, DoctorError> {
        self.fetch("/rest/v1/doctors?select=*", auth_token).await
    }

    pub async fn list_available_doctors(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        self.fetch("/rest/v1/doctors?available=eq.true", auth_token)
            .await
    }

    pub async fn doctors_by_specialization(
        &self,
        specialization: &str,
        available_only: bool,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        let mut path = format!(
            "/rest/v1/doctors?specialization=eq.{}",
            urlencoding::encode(specialization)
        );
        if available_only {
            path.push_str("&available=eq.true");
        }
        self.fetch(&path, auth_token).await
    }

    pub async fn search_doctors(
        &self,
        query: DoctorSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Searching doctors with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(name) = query.name {
            let pattern = urlencoding::encode(&name).into_owned();
            query_parts.push(format!(
                "or=(first_name.ilike.*{}*,last_name.ilike.*{}*)",
                pattern, pattern
            ));
        }
        if let Some(specialization) = query.specialization {
            query_parts.push(format!(
                "specialization=eq.{}",
                urlencoding::encode(&specialization)
            ));
        }
        if query.available_only.unwrap_or(false) {
            query_parts.push("available=eq.true".to_string());
        }

        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);
        query_parts.push(format!("limit={}&offset={}", limit, offset));

        let path = format!("/rest/v1/doctors?{}", query_parts.join("&"));
        self.fetch(&path, auth_token).await
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor {}", doctor_id);

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(consultation_fee) = request.consultation_fee {
            update_data.insert("consultation_fee".to_string(), json!(consultation_fee));
        }
        if let Some(qualifications) = request.qualifications {
            update_data.insert("qualifications".to_string(), json!(qualifications));
        }
        if let Some(years_of_experience) = request.years_of_experience {
            update_data.insert(
                "years_of_experience".to_string(),
                json!(years_of_experience),
            );
        }
        if let Some(available) = request.available {
            update_data.insert("available".to_string(), json!(available));
        }

        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now()));

        self.patch(doctor_id, Value::Object(update_data), auth_token)
            .await
    }

    /// Flips the availability flag; a doctor marked unavailable stops
    /// showing up in the available listings but keeps existing appointments.
    pub async fn toggle_availability(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id, auth_token).await?;

        let changes = json!({
            "available": !doctor.available,
            "updated_at": chrono::Utc::now(),
        });

        self.patch(doctor_id, changes, auth_token).await
    }

    pub async fn delete_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<(), DoctorError> {
        if !self.doctor_exists(doctor_id, auth_token).await? {
            return Err(DoctorError::NotFound);
        }

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let _removed: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(Self::returning_headers()),
            )
            .await?;

        Ok(())
    }

    pub async fn doctor_exists(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id&limit=1", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!result.is_empty())
    }

    async fn patch(
        &self,
        doctor_id: Uuid,
        changes: Value,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(changes),
                Some(Self::returning_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| DoctorError::Store(format!("Failed to parse doctor: {}", e)))
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Doctor>, DoctorError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DoctorError::Store(format!("Failed to parse doctors: {}", e)))
    }
}
