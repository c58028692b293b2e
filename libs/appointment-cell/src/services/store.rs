use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Persistence primitives for appointment records, expressed as PostgREST
/// queries against the `appointments` table.
pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn returning_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("return=representation"),
        );
        headers
    }

    pub async fn insert(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(serde_json::to_value(appointment).map_err(|e| {
                    AppointmentError::Store(format!("Failed to serialize appointment: {}", e))
                })?),
                Some(Self::returning_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Store("Insert returned no row".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Store(format!("Failed to parse appointment: {}", e)))
    }

    /// Applies a partial update; `Err(NotFound)` when no row matched the id.
    pub async fn update(
        &self,
        id: Uuid,
        changes: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
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

        let row = result.into_iter().next().ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Store(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| AppointmentError::Store(format!("Failed to parse appointment: {}", e))),
            None => Ok(None),
        }
    }

    pub async fn find_all(&self, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch("/rest/v1/appointments?select=*", auth_token).await
    }

    pub async fn find_by_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?patient_id=eq.{}", patient_id);
        self.fetch(&path, auth_token).await
    }

    pub async fn find_by_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?doctor_id=eq.{}", doctor_id);
        self.fetch(&path, auth_token).await
    }

    pub async fn find_by_status(
        &self,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?status=eq.{}", status);
        self.fetch(&path, auth_token).await
    }

    pub async fn find_by_doctor_and_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}",
            doctor_id, date
        );
        self.fetch(&path, auth_token).await
    }

    /// Appointments on or after `from`, ordered by date then time ascending.
    /// Ties on (date, time) across doctors come back in store order.
    pub async fn upcoming_for_patient(
        &self,
        patient_id: Uuid,
        from: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&appointment_date=gte.{}&order=appointment_date.asc,appointment_time.asc",
            patient_id, from
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn upcoming_for_doctor(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=gte.{}&order=appointment_date.asc,appointment_time.asc",
            doctor_id, from
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn exists(&self, id: Uuid, auth_token: &str) -> Result<bool, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select=id&limit=1", id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!result.is_empty())
    }

    pub async fn delete(&self, id: Uuid, auth_token: &str) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
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

    /// True iff a non-cancelled appointment other than `exclude` already
    /// holds the (doctor, date, time) slot.
    pub async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: chrono::NaiveTime,
        exclude: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}&status=neq.cancelled&select=id&limit=1",
            doctor_id, date, time
        );
        if let Some(excluded_id) = exclude {
            path.push_str(&format!("&id=neq.{}", excluded_id));
        }

        debug!("Checking slot occupancy: {}", path);

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
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppointmentError::Store(format!("Failed to parse appointments: {}", e)))
    }
}
