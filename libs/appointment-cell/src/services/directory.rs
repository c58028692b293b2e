use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::AppointmentError;

/// Existence checks for the entities an appointment references. Kept behind
/// a trait so the lifecycle manager can be driven by a fake in tests; the
/// real implementation delegates to the patient and doctor tables.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn doctor_exists(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError>;

    async fn patient_exists(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError>;
}

pub struct SupabaseDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn id_exists(
        &self,
        table: &str,
        id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id&limit=1", table, id);
        debug!("Looking up {} id {}", table, id);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(!result.is_empty())
    }
}

#[async_trait]
impl EntityDirectory for SupabaseDirectory {
    async fn doctor_exists(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        self.id_exists("doctors", doctor_id, auth_token).await
    }

    async fn patient_exists(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        self.id_exists("patients", patient_id, auth_token).await
    }
}
