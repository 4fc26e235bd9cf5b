use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use shared_models::auth::{Principal, Role};
use shared_models::error::AppError;
use shared_utils::state::AppState;

use crate::models::{
    AvailabilityError, GenerateScheduleRequest, GenerateScheduleResponse, SlotsQuery,
    SlotsResponse,
};
use crate::services::availability::AvailabilityService;

/// Replace a provider's weekly schedule and regenerate its bookable slots.
#[axum::debug_handler]
pub async fn generate_schedule(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<GenerateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    // Front desk staff can book but not edit the weekly schedule.
    if principal.role == Role::FrontDesk {
        return Err(AppError::Auth(
            "Not authorized to manage provider schedules".to_string(),
        ));
    }

    let horizon_days = request
        .horizon_days
        .unwrap_or(state.config.slot_horizon_days);

    let service = AvailabilityService::new(Arc::clone(&state.store));
    let (slots_removed, slots_created) = service
        .regenerate_schedule(request.provider_id, request.rules, horizon_days)
        .await
        .map_err(map_availability_error)?;

    Ok(Json(json!({
        "success": true,
        "schedule": GenerateScheduleResponse {
            provider_id: request.provider_id,
            slots_removed,
            slots_created,
        },
    })))
}

/// Open slots for a provider, ascending by start time.
#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Extension(_principal): Extension<Principal>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let from = query.from.unwrap_or_else(Utc::now);
    let to = query
        .to
        .unwrap_or_else(|| from + Duration::days(state.config.slot_horizon_days));

    let service = AvailabilityService::new(Arc::clone(&state.store));
    let slots = service
        .list_open_slots(query.provider_id, from, to)
        .await
        .map_err(map_availability_error)?;

    Ok(Json(SlotsResponse {
        provider_id: query.provider_id,
        slots,
    }))
}

fn map_availability_error(e: AvailabilityError) -> AppError {
    match e {
        AvailabilityError::InvalidRule(msg) => AppError::BadRequest(msg),
        AvailabilityError::DuplicateWeekday(day) => AppError::BadRequest(format!(
            "More than one active rule for weekday {}",
            day
        )),
        AvailabilityError::InvalidQuery(msg) => AppError::BadRequest(msg),
    }
}
