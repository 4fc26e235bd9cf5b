use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{AvailabilitySlot, SlotState, TenantPlan};
use shared_store::SchedulingStore;

use crate::state::AppState;

/// Test state with an empty store and notifications disabled.
pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(AppConfig::default()))
}

/// Test state pointing the notifier at a webhook (wiremock) endpoint.
pub fn test_state_with_webhook(webhook_url: &str) -> Arc<AppState> {
    let config = AppConfig {
        notify_webhook_url: Some(webhook_url.to_string()),
        ..AppConfig::default()
    };
    Arc::new(AppState::new(config))
}

/// Seed one open slot for the provider, `offset_hours` from now, and return
/// its id.
pub async fn seed_open_slot(
    store: &SchedulingStore,
    provider_id: Uuid,
    offset_hours: i64,
) -> Uuid {
    let start = Utc::now() + Duration::hours(offset_hours);
    let slot = AvailabilitySlot {
        id: Uuid::new_v4(),
        provider_id,
        start_time: start,
        end_time: start + Duration::minutes(30),
        state: SlotState::Open,
    };
    let slot_id = slot.id;
    store.insert_slots(vec![slot]).await;
    slot_id
}

/// Give the tenant a plan capped at `appointment_limit` appointments.
pub async fn seed_capped_plan(store: &SchedulingStore, tenant_id: Uuid, appointment_limit: i64) {
    store
        .set_tenant_plan(
            tenant_id,
            TenantPlan {
                appointment_limit: Some(appointment_limit),
                ..TenantPlan::default()
            },
        )
        .await;
}
