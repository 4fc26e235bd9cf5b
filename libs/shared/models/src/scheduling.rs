use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// AVAILABILITY RECORDS
// ==============================================================================

/// Recurring weekly availability pattern for one provider.
/// Rules are replaced wholesale on schedule updates, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub provider_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i64,
    pub is_active: bool,
}

/// Concrete bookable unit generated from a rule. Unique per
/// (provider_id, start_time); time bounds are never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: SlotState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Open,
    Booked,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Open => write!(f, "open"),
            SlotState::Booked => write!(f, "booked"),
        }
    }
}

impl AvailabilitySlot {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

// ==============================================================================
// APPOINTMENT RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub tenant_id: Uuid,
    /// The slot this booking consumed. Time bounds below are copied from the
    /// slot at creation, not read back from it.
    pub slot_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub clinical_record_id: Option<Uuid>,
    pub billing: Option<BillingSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

// ==============================================================================
// CLINICAL AND BILLING RECORDS
// ==============================================================================

/// Consultation note created exactly once, atomically with the appointment's
/// transition to completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub chief_complaint: String,
    pub diagnosis: String,
    pub treatments: Vec<ChargeItem>,
    pub tests: Vec<ChargeItem>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Priced line item ordered during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeItem {
    pub name: String,
    pub price: f64,
}

/// Derived at finalization time; never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSummary {
    pub consultation_fee: f64,
    pub treatment_total: f64,
    pub test_total: f64,
    pub discount: f64,
    pub total: f64,
}

// ==============================================================================
// QUOTA RECORDS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Users,
    Appointments,
    Patients,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Users => write!(f, "users"),
            ResourceKind::Appointments => write!(f, "appointments"),
            ResourceKind::Patients => write!(f, "patients"),
        }
    }
}

/// Plan limits for a tenant. `None` is the unlimited sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantPlan {
    pub user_limit: Option<i64>,
    pub appointment_limit: Option<i64>,
    pub patient_limit: Option<i64>,
}

impl TenantPlan {
    pub fn limit_for(&self, kind: ResourceKind) -> Option<i64> {
        match kind {
            ResourceKind::Users => self.user_limit,
            ResourceKind::Appointments => self.appointment_limit,
            ResourceKind::Patients => self.patient_limit,
        }
    }
}
