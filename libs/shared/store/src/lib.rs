//! Scheduling persistence layer.
//!
//! `SchedulingStore` is the constructed store resource handed to every
//! service (open at process start, dropped at shutdown). Each mutating
//! method is a single atomic unit: slot reservation is a conditional write
//! on slot state, and the multi-document operations (booking, finalization,
//! transition-with-release) commit or change nothing. Callers must never
//! read state and write it back across two calls.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityRule, AvailabilitySlot, BillingSummary,
    ClinicalRecord, ResourceKind, SlotState, TenantPlan,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(&'static str),

    #[error("slot is already booked")]
    SlotTaken,

    #[error("appointment already finalized")]
    AlreadyFinalized,

    #[error("appointment is {current}, expected scheduled")]
    InvalidState { current: AppointmentStatus },

    #[error("persistence failure: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct StoreState {
    rules: HashMap<Uuid, Vec<AvailabilityRule>>,
    slots: HashMap<Uuid, AvailabilitySlot>,
    appointments: HashMap<Uuid, Appointment>,
    clinical_records: HashMap<Uuid, ClinicalRecord>,
    plans: HashMap<Uuid, TenantPlan>,
    usage: HashMap<(Uuid, ResourceKind), i64>,
}

pub struct SchedulingStore {
    state: Mutex<StoreState>,
}

impl SchedulingStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    // ==========================================================================
    // AVAILABILITY RULES
    // ==========================================================================

    /// Replace the provider's rule set wholesale.
    pub async fn replace_rules(&self, provider_id: Uuid, rules: Vec<AvailabilityRule>) {
        let mut state = self.state.lock().await;
        debug!("Replacing {} availability rules for provider {}", rules.len(), provider_id);
        state.rules.insert(provider_id, rules);
    }

    pub async fn active_rules(&self, provider_id: Uuid) -> Vec<AvailabilityRule> {
        let state = self.state.lock().await;
        state
            .rules
            .get(&provider_id)
            .map(|rules| rules.iter().filter(|r| r.is_active).cloned().collect())
            .unwrap_or_default()
    }

    // ==========================================================================
    // SLOTS
    // ==========================================================================

    /// Insert generated slots, skipping any that would duplicate or overlap an
    /// existing slot for the same provider. Booked slots therefore block
    /// regeneration from producing a colliding replacement.
    pub async fn insert_slots(&self, slots: Vec<AvailabilitySlot>) -> usize {
        let mut state = self.state.lock().await;
        let mut inserted = 0;

        for slot in slots {
            let collides = state.slots.values().any(|existing| {
                existing.provider_id == slot.provider_id
                    && existing.overlaps(slot.start_time, slot.end_time)
            });
            if collides {
                continue;
            }
            state.slots.insert(slot.id, slot);
            inserted += 1;
        }

        debug!("Inserted {} slots", inserted);
        inserted
    }

    /// Remove all open slots for the provider starting after `after`.
    /// Booked slots are left untouched.
    pub async fn delete_open_slots_after(&self, provider_id: Uuid, after: DateTime<Utc>) -> usize {
        let mut state = self.state.lock().await;
        let before = state.slots.len();
        state.slots.retain(|_, slot| {
            !(slot.provider_id == provider_id
                && slot.state == SlotState::Open
                && slot.start_time > after)
        });
        let removed = before - state.slots.len();
        debug!("Removed {} open slots for provider {}", removed, provider_id);
        removed
    }

    /// Read-only query: open slots for a provider, ascending by start time.
    pub async fn list_open_slots(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<AvailabilitySlot> {
        let state = self.state.lock().await;
        let mut slots: Vec<AvailabilitySlot> = state
            .slots
            .values()
            .filter(|slot| {
                slot.provider_id == provider_id
                    && slot.state == SlotState::Open
                    && slot.start_time >= from
                    && slot.start_time < to
            })
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        slots
    }

    pub async fn get_slot(&self, slot_id: Uuid) -> Option<AvailabilitySlot> {
        let state = self.state.lock().await;
        state.slots.get(&slot_id).cloned()
    }

    // ==========================================================================
    // BOOKING TRANSACTION
    // ==========================================================================

    /// Atomically reserve a slot and create the bound appointment.
    ///
    /// The slot-state check and the appointment insert happen in one critical
    /// section: of N concurrent callers targeting the same open slot, exactly
    /// one succeeds and the rest observe `SlotTaken`. The tenant's
    /// appointment counter is incremented in the same unit, so a reserved
    /// slot can never exist without its appointment or counter entry.
    pub async fn book_slot(
        &self,
        slot_id: Uuid,
        patient_id: Uuid,
        provider_id: Uuid,
        tenant_id: Uuid,
        notes: Option<String>,
    ) -> Result<Appointment, StoreError> {
        let mut state = self.state.lock().await;

        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or(StoreError::NotFound("slot"))?;

        if slot.provider_id != provider_id {
            return Err(StoreError::NotFound("slot"));
        }
        if slot.state != SlotState::Open {
            warn!("Booking lost race for slot {}", slot_id);
            return Err(StoreError::SlotTaken);
        }

        slot.state = SlotState::Booked;
        let (start_time, end_time) = (slot.start_time, slot.end_time);

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            provider_id,
            tenant_id,
            slot_id,
            start_time,
            end_time,
            status: AppointmentStatus::Scheduled,
            reason: None,
            notes,
            clinical_record_id: None,
            billing: None,
            created_at: now,
            updated_at: now,
        };
        state.appointments.insert(appointment.id, appointment.clone());
        *state
            .usage
            .entry((tenant_id, ResourceKind::Appointments))
            .or_insert(0) += 1;

        info!("Booked slot {} as appointment {}", slot_id, appointment.id);
        Ok(appointment)
    }

    // ==========================================================================
    // APPOINTMENTS
    // ==========================================================================

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Option<Appointment> {
        let state = self.state.lock().await;
        state.appointments.get(&appointment_id).cloned()
    }

    /// Atomically move a scheduled appointment to a terminal non-completed
    /// status and release its bound slot back to open. The status
    /// precondition is checked inside the same critical section that writes
    /// the new status, so the loser of a concurrent cancel/finalize race
    /// observes the state the winner left behind.
    pub async fn transition_and_release(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<Appointment, StoreError> {
        let mut state = self.state.lock().await;

        let appointment = state
            .appointments
            .get_mut(&appointment_id)
            .ok_or(StoreError::NotFound("appointment"))?;

        if appointment.status != AppointmentStatus::Scheduled {
            return Err(StoreError::InvalidState {
                current: appointment.status,
            });
        }

        let slot_id = appointment.slot_id;
        appointment.status = new_status;
        if reason.is_some() {
            appointment.reason = reason;
        }
        if notes.is_some() {
            appointment.notes = notes;
        }
        appointment.updated_at = Utc::now();
        let updated = appointment.clone();

        // The slot may have been regenerated away in the meantime; releasing
        // is then a no-op.
        if let Some(slot) = state.slots.get_mut(&slot_id) {
            slot.state = SlotState::Open;
        }

        info!("Appointment {} transitioned to {}", appointment_id, new_status);
        Ok(updated)
    }

    /// The finalization transaction: persist the clinical record, bind it and
    /// the billing summary to the appointment, and mark it completed — all or
    /// nothing. The slot stays booked; completed appointments represent
    /// consumed time.
    pub async fn finalize_appointment(
        &self,
        appointment_id: Uuid,
        record: ClinicalRecord,
        billing: BillingSummary,
    ) -> Result<(Appointment, ClinicalRecord), StoreError> {
        let mut state = self.state.lock().await;

        let appointment = state
            .appointments
            .get_mut(&appointment_id)
            .ok_or(StoreError::NotFound("appointment"))?;

        if appointment.status == AppointmentStatus::Completed
            || appointment.clinical_record_id.is_some()
        {
            return Err(StoreError::AlreadyFinalized);
        }
        if appointment.status != AppointmentStatus::Scheduled {
            return Err(StoreError::InvalidState {
                current: appointment.status,
            });
        }

        appointment.status = AppointmentStatus::Completed;
        appointment.clinical_record_id = Some(record.id);
        appointment.billing = Some(billing);
        appointment.updated_at = Utc::now();
        let updated = appointment.clone();

        state.clinical_records.insert(record.id, record.clone());

        info!(
            "Appointment {} finalized with clinical record {}",
            appointment_id, record.id
        );
        Ok((updated, record))
    }

    pub async fn get_clinical_record(&self, record_id: Uuid) -> Option<ClinicalRecord> {
        let state = self.state.lock().await;
        state.clinical_records.get(&record_id).cloned()
    }

    // ==========================================================================
    // TENANT PLANS AND USAGE COUNTERS
    // ==========================================================================

    pub async fn set_tenant_plan(&self, tenant_id: Uuid, plan: TenantPlan) {
        let mut state = self.state.lock().await;
        state.plans.insert(tenant_id, plan);
    }

    /// Current usage counter and the plan limit for the resource kind.
    /// A tenant without a stored plan is unlimited.
    pub async fn usage_and_limit(
        &self,
        tenant_id: Uuid,
        kind: ResourceKind,
    ) -> (i64, Option<i64>) {
        let state = self.state.lock().await;
        let count = state.usage.get(&(tenant_id, kind)).copied().unwrap_or(0);
        let limit = state
            .plans
            .get(&tenant_id)
            .and_then(|plan| plan.limit_for(kind));
        (count, limit)
    }
}

impl Default for SchedulingStore {
    fn default() -> Self {
        Self::new()
    }
}
