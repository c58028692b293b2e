use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    CreateMedicalRecordRequest, MedicalRecord, MedicalRecordError, UpdateMedicalRecordRequest,
};

pub struct MedicalRecordService {
    supabase: Arc<SupabaseClient>,
}

impl MedicalRecordService {
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

    pub async fn create_record(
        &self,
        request: CreateMedicalRecordRequest,
        auth_token: &str,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        debug!(
            "Creating medical record for patient {} by doctor {}",
            request.patient_id, request.doctor_id
        );

        if !self
            .id_exists("patients", request.patient_id, auth_token)
            .await?
        {
            return Err(MedicalRecordError::PatientNotFound);
        }
        if !self
            .id_exists("doctors", request.doctor_id, auth_token)
            .await?
        {
            return Err(MedicalRecordError::DoctorNotFound);
        }

        let now = chrono::Utc::now();
        let record_data = json!({
            "id": Uuid::new_v4(),
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "diagnosis": request.diagnosis,
            "prescription": request.prescription,
            "record_date": request.record_date.unwrap_or_else(|| now.date_naive()),
            "notes": request.notes,
            "symptoms": request.symptoms,
            "test_results": request.test_results,
            "follow_up_date": request.follow_up_date,
            "created_at": now
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/medical_records",
                Some(auth_token),
                Some(record_data),
                Some(Self::returning_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| MedicalRecordError::Store("Insert returned no row".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| MedicalRecordError::Store(format!("Failed to parse record: {}", e)))
    }

    pub async fn get_record(
        &self,
        record_id: Uuid,
        auth_token: &str,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        let path = format!("/rest/v1/medical_records?id=eq.{}", record_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| MedicalRecordError::Store(format!("Failed to parse record: {}", e)))
    }

    pub async fn list_records(
        &self,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        self.fetch("/rest/v1/medical_records?select=*", auth_token)
            .await
    }

    /// Most recent first, matching how charts are read.
    pub async fn patient_records(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let path = format!(
            "/rest/v1/medical_records?patient_id=eq.{}&order=record_date.desc",
            patient_id
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn doctor_records(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let path = format!("/rest/v1/medical_records?doctor_id=eq.{}", doctor_id);
        self.fetch(&path, auth_token).await
    }

    pub async fn search_by_diagnosis(
        &self,
        keyword: &str,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let path = format!(
            "/rest/v1/medical_records?diagnosis=ilike.*{}*",
            urlencoding::encode(keyword)
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn upcoming_follow_ups(
        &self,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let today = chrono::Utc::now().date_naive();
        let path = format!(
            "/rest/v1/medical_records?follow_up_date=gte.{}&order=follow_up_date.asc",
            today
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn update_record(
        &self,
        record_id: Uuid,
        request: UpdateMedicalRecordRequest,
        auth_token: &str,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        debug!("Updating medical record {}", record_id);

        let mut update_data = serde_json::Map::new();

        if let Some(diagnosis) = request.diagnosis {
            update_data.insert("diagnosis".to_string(), json!(diagnosis));
        }
        if let Some(prescription) = request.prescription {
            update_data.insert("prescription".to_string(), json!(prescription));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        if let Some(symptoms) = request.symptoms {
            update_data.insert("symptoms".to_string(), json!(symptoms));
        }
        if let Some(test_results) = request.test_results {
            update_data.insert("test_results".to_string(), json!(test_results));
        }
        if let Some(follow_up_date) = request.follow_up_date {
            update_data.insert("follow_up_date".to_string(), json!(follow_up_date));
        }

        let path = format!("/rest/v1/medical_records?id=eq.{}", record_id);
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

        let row = result
            .into_iter()
            .next()
            .ok_or(MedicalRecordError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| MedicalRecordError::Store(format!("Failed to parse record: {}", e)))
    }

    pub async fn delete_record(
        &self,
        record_id: Uuid,
        auth_token: &str,
    ) -> Result<(), MedicalRecordError> {
        if !self
            .id_exists("medical_records", record_id, auth_token)
            .await?
        {
            return Err(MedicalRecordError::NotFound);
        }

        let path = format!("/rest/v1/medical_records?id=eq.{}", record_id);
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

    pub async fn count_patient_records(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<usize, MedicalRecordError> {
        let path = format!(
            "/rest/v1/medical_records?patient_id=eq.{}&select=id",
            patient_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(result.len())
    }

    async fn id_exists(
        &self,
        table: &str,
        id: Uuid,
        auth_token: &str,
    ) -> Result<bool, MedicalRecordError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id&limit=1", table, id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!result.is_empty())
    }

    async fn fetch(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MedicalRecordError::Store(format!("Failed to parse records: {}", e)))
    }
}
