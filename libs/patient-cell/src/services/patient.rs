use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientSearchQuery, UpdatePatientRequest,
};

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
}

impl PatientService {
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

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!(
            "Creating patient record for {} {}",
            request.first_name, request.last_name
        );

        let now = chrono::Utc::now();
        let patient_data = json!({
            "id": Uuid::new_v4(),
            "first_name": request.first_name,
            "last_name": request.last_name,
            "date_of_birth": request.date_of_birth,
            "phone": request.phone,
            "address": request.address,
            "blood_group": request.blood_group,
            "emergency_contact": request.emergency_contact,
            "emergency_phone": request.emergency_phone,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                Some(auth_token),
                Some(patient_data),
                Some(Self::returning_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Store("Insert returned no row".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| PatientError::Store(format!("Failed to parse patient: {}", e)))
    }

    pub async fn get_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Fetching patient {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(PatientError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| PatientError::Store(format!("Failed to parse patient: {}", e)))
    }

    pub async fn list_patients(&self, auth_token: &str) -> Result<Vec<Patient>, PatientError> {
        self.fetch("/rest/v1/patients?select=*", auth_token).await
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient {}", patient_id);

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert("date_of_birth".to_string(), json!(date_of_birth));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(blood_group) = request.blood_group {
            update_data.insert("blood_group".to_string(), json!(blood_group));
        }
        if let Some(emergency_contact) = request.emergency_contact {
            update_data.insert("emergency_contact".to_string(), json!(emergency_contact));
        }
        if let Some(emergency_phone) = request.emergency_phone {
            update_data.insert("emergency_phone".to_string(), json!(emergency_phone));
        }

        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now()));

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(Self::returning_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or(PatientError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| PatientError::Store(format!("Failed to parse patient: {}", e)))
    }

    pub async fn delete_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<(), PatientError> {
        if !self.patient_exists(patient_id, auth_token).await? {
            return Err(PatientError::NotFound);
        }

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
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

    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Patient>, PatientError> {
        debug!("Searching patients with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(name) = query.name {
            let pattern = urlencoding::encode(&name).into_owned();
            query_parts.push(format!(
                "or=(first_name.ilike.*{}*,last_name.ilike.*{}*)",
                pattern, pattern
            ));
        }
        if let Some(blood_group) = query.blood_group {
            query_parts.push(format!(
                "blood_group=eq.{}",
                urlencoding::encode(&blood_group)
            ));
        }

        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);
        query_parts.push(format!("limit={}&offset={}", limit, offset));

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));
        self.fetch(&path, auth_token).await
    }

    pub async fn patient_exists(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}&select=id&limit=1", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!result.is_empty())
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Patient>, PatientError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PatientError::Store(format!("Failed to parse patients: {}", e)))
    }
}
