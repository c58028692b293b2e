use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AppointmentError;
use crate::services::store::AppointmentStore;

/// Read-only check of the one hard invariant: at most one non-cancelled
/// appointment per (doctor, date, time) slot.
pub struct SlotAvailabilityService {
    store: Arc<AppointmentStore>,
}

impl SlotAvailabilityService {
    pub fn new(store: Arc<AppointmentStore>) -> Self {
        Self { store }
    }

    /// `exclude_appointment_id` is set when rescheduling so the appointment
    /// being moved does not count against itself.
    pub async fn is_slot_available(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking availability for doctor {} on {} at {}",
            doctor_id, date, time
        );

        let taken = self
            .store
            .slot_taken(doctor_id, date, time, exclude_appointment_id, auth_token)
            .await?;

        if taken {
            warn!(
                "Slot already occupied for doctor {} on {} at {}",
                doctor_id, date, time
            );
        }

        Ok(!taken)
    }
}
