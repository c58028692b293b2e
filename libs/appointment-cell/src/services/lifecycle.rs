use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::availability::SlotAvailabilityService;
use crate::services::directory::{EntityDirectory, SupabaseDirectory};
use crate::services::store::AppointmentStore;

/// Owns the appointment lifecycle: booking, rescheduling, cancellation,
/// completion, deletion, and the read queries. Entity validation and the
/// slot check run as preconditions; the store's uniqueness guard on
/// non-cancelled (doctor, date, time) rows backs them up under concurrency.
pub struct AppointmentLifecycleService {
    store: Arc<AppointmentStore>,
    availability: SlotAvailabilityService,
    directory: Arc<dyn EntityDirectory>,
}

impl AppointmentLifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let store = Arc::new(AppointmentStore::new(Arc::clone(&supabase)));
        let directory = Arc::new(SupabaseDirectory::new(supabase));
        Self::with_parts(store, directory)
    }

    pub fn with_parts(store: Arc<AppointmentStore>, directory: Arc<dyn EntityDirectory>) -> Self {
        let availability = SlotAvailabilityService::new(Arc::clone(&store));
        Self {
            store,
            availability,
            directory,
        }
    }

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {} at {}",
            request.patient_id, request.doctor_id, request.appointment_date,
            request.appointment_time
        );

        if !self
            .directory
            .doctor_exists(request.doctor_id, auth_token)
            .await?
        {
            return Err(AppointmentError::DoctorNotFound);
        }

        if !self
            .directory
            .patient_exists(request.patient_id, auth_token)
            .await?
        {
            return Err(AppointmentError::PatientNotFound);
        }

        let available = self
            .availability
            .is_slot_available(
                request.doctor_id,
                request.appointment_date,
                request.appointment_time,
                None,
                auth_token,
            )
            .await?;

        if !available {
            return Err(AppointmentError::SlotConflict);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            status: AppointmentStatus::Scheduled,
            reason: request.reason,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert(&appointment, auth_token).await?;

        info!("Appointment {} booked", created.id);
        Ok(created)
    }

    /// Overwrites date, time, reason, notes and status. The slot is only
    /// re-checked when the date or time actually changes, and the
    /// appointment being moved is excluded from its own check.
    pub async fn reschedule(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {}", id);

        let current = self
            .store
            .find_by_id(id, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let slot_changed = current.appointment_date != request.appointment_date
            || current.appointment_time != request.appointment_time;

        if slot_changed {
            let available = self
                .availability
                .is_slot_available(
                    current.doctor_id,
                    request.appointment_date,
                    request.appointment_time,
                    Some(id),
                    auth_token,
                )
                .await?;

            if !available {
                warn!(
                    "Reschedule of appointment {} rejected, slot occupied",
                    id
                );
                return Err(AppointmentError::SlotConflict);
            }
        }

        let changes = json!({
            "appointment_date": request.appointment_date,
            "appointment_time": request.appointment_time,
            "reason": request.reason,
            "notes": request.notes,
            "status": request.status,
            "updated_at": Utc::now(),
        });

        let updated = self.store.update(id, changes, auth_token).await?;
        info!("Appointment {} rescheduled", id);
        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid, auth_token: &str) -> Result<Appointment, AppointmentError> {
        self.set_status(id, AppointmentStatus::Cancelled, auth_token)
            .await
    }

    pub async fn complete(
        &self,
        id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.set_status(id, AppointmentStatus::Completed, auth_token)
            .await
    }

    /// Forces the status unconditionally. There is deliberately no
    /// transition table: cancelling a completed appointment or re-cancelling
    /// a cancelled one is a plain overwrite.
    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Setting appointment {} status to {}", id, status);

        if self.store.find_by_id(id, auth_token).await?.is_none() {
            return Err(AppointmentError::NotFound);
        }

        let changes = json!({
            "status": status,
            "updated_at": Utc::now(),
        });

        let updated = self.store.update(id, changes, auth_token).await?;
        info!("Appointment {} is now {}", id, status);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, auth_token: &str) -> Result<(), AppointmentError> {
        if !self.store.exists(id, auth_token).await? {
            return Err(AppointmentError::NotFound);
        }

        self.store.delete(id, auth_token).await?;
        info!("Appointment {} deleted", id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid, auth_token: &str) -> Result<Appointment, AppointmentError> {
        self.store
            .find_by_id(id, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_all(&self, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.find_all(auth_token).await
    }

    pub async fn patient_appointments(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.find_by_patient(patient_id, auth_token).await
    }

    pub async fn doctor_appointments(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.find_by_doctor(doctor_id, auth_token).await
    }

    pub async fn appointments_by_status(
        &self,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.find_by_status(status, auth_token).await
    }

    pub async fn doctor_appointments_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.store
            .find_by_doctor_and_date(doctor_id, date, auth_token)
            .await
    }

    pub async fn upcoming_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let today = Utc::now().date_naive();
        self.store
            .upcoming_for_patient(patient_id, today, auth_token)
            .await
    }

    pub async fn upcoming_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let today = Utc::now().date_naive();
        self.store
            .upcoming_for_doctor(doctor_id, today, auth_token)
            .await
    }
}
