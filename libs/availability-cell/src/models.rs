use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::scheduling::AvailabilitySlot;

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// One weekly rule as submitted by the provider. Validated before any write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleInput {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateScheduleRequest {
    pub provider_id: Uuid,
    pub horizon_days: Option<i64>,
    pub rules: Vec<RuleInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateScheduleResponse {
    pub provider_id: Uuid,
    pub slots_removed: usize,
    pub slots_created: usize,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub provider_id: Uuid,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub provider_id: Uuid,
    pub slots: Vec<AvailabilitySlot>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Invalid availability rule: {0}")]
    InvalidRule(String),

    #[error("More than one active rule for weekday {0}")]
    DuplicateWeekday(u8),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}
