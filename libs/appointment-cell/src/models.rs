use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::scheduling::{AppointmentStatus, ChargeItem, ResourceKind};

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub slot_id: Uuid,
    pub notes: Option<String>,
}

/// Direct status update. Only cancellation and no-show go through here;
/// completion is reserved for the finalize operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Consultation outcome submitted at finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalInput {
    pub chief_complaint: String,
    pub diagnosis: String,
    pub consultation_fee: f64,
    #[serde(default)]
    pub treatments: Vec<ChargeItem>,
    #[serde(default)]
    pub tests: Vec<ChargeItem>,
    #[serde(default)]
    pub discount: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub appointment_id: Uuid,
    pub clinical_record_id: Uuid,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Slot already taken")]
    SlotTaken,

    #[error("Quota exceeded for {kind}: {current} of {limit} used")]
    QuotaExceeded {
        kind: ResourceKind,
        current: i64,
        limit: i64,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment already finalized")]
    AlreadyFinalized,

    #[error("Appointment is {0}, expected scheduled")]
    InvalidState(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}
