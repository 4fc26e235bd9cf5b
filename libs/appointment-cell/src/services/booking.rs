use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::scheduling::{Appointment, ResourceKind};
use shared_store::{SchedulingStore, StoreError};

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::services::quota::{QuotaDecision, QuotaGateService};

/// The booking engine: validates a booking request against the availability
/// store and the tenant's quota, then reserves the slot and creates the
/// appointment in one store transaction.
pub struct AppointmentBookingService {
    store: Arc<SchedulingStore>,
    quota_gate: QuotaGateService,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        let quota_gate = QuotaGateService::new(Arc::clone(&store));
        Self { store, quota_gate }
    }

    /// Book a slot for a patient.
    ///
    /// On `SlotTaken` the caller is expected to re-query open slots and retry
    /// with a different one; the engine never silently picks an alternate.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        tenant_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking slot {} for patient {} with provider {}",
            request.slot_id, request.patient_id, request.provider_id
        );

        // Step 1: the slot must exist, belong to the requested provider and
        // lie in the future. This is a pre-check on a snapshot; the store
        // re-validates state inside the booking transaction.
        let slot = self
            .store
            .get_slot(request.slot_id)
            .await
            .ok_or_else(|| AppointmentError::InvalidSlot("unknown slot".to_string()))?;

        if slot.provider_id != request.provider_id {
            return Err(AppointmentError::InvalidSlot(
                "slot does not belong to the requested provider".to_string(),
            ));
        }
        if slot.start_time <= Utc::now() {
            return Err(AppointmentError::InvalidSlot(
                "slot is in the past".to_string(),
            ));
        }

        // Step 2: quota gate, read immediately before the reservation.
        if let QuotaDecision::Denied {
            kind,
            current,
            limit,
        } = self
            .quota_gate
            .check_and_reserve(tenant_id, ResourceKind::Appointments)
            .await
        {
            return Err(AppointmentError::QuotaExceeded {
                kind,
                current,
                limit,
            });
        }

        // Steps 3+4: one atomic unit. Reservation, appointment creation and
        // the usage-counter increment commit together or not at all.
        let appointment = self
            .store
            .book_slot(
                request.slot_id,
                request.patient_id,
                request.provider_id,
                tenant_id,
                request.notes,
            )
            .await
            .map_err(|e| match e {
                StoreError::SlotTaken => {
                    warn!("Slot {} taken by a concurrent booking", request.slot_id);
                    AppointmentError::SlotTaken
                }
                StoreError::NotFound(_) => {
                    AppointmentError::InvalidSlot("unknown slot".to_string())
                }
                other => AppointmentError::PersistenceFailure(other.to_string()),
            })?;

        info!(
            "Appointment {} booked for patient {} at {}",
            appointment.id, appointment.patient_id, appointment.start_time
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.store
            .get_appointment(appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)
    }
}
