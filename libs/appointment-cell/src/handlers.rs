use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_models::scheduling::Appointment;
use shared_utils::state::AppState;

use crate::models::{
    AppointmentError, BookAppointmentRequest, ClinicalInput, FinalizeResponse,
    UpdateAppointmentStatusRequest,
};
use crate::services::booking::AppointmentBookingService;
use crate::services::finalize::ConsultationFinalizerService;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Book a slot. The appointment is created under the caller's tenant; the
/// confirmation notification goes out only after the transaction committed
/// and never affects the result.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(Arc::clone(&state.store));

    let appointment = booking_service
        .book_appointment(request, principal.tenant_id)
        .await
        .map_err(map_appointment_error)?;

    // Fire-and-forget: a slow webhook must not delay the booking response.
    let notifier = state.notifier.clone();
    let event = json!({
        "appointment_id": appointment.id,
        "patient_id": appointment.patient_id,
        "provider_id": appointment.provider_id,
        "start_time": appointment.start_time,
    });
    tokio::spawn(async move {
        notifier.send("appointment.booked", event).await;
    });

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Appointment>, AppError> {
    let booking_service = AppointmentBookingService::new(Arc::clone(&state.store));

    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    authorize_tenant(&principal, &appointment)?;
    Ok(Json(appointment))
}

/// Cancel or mark no-show. The bound slot goes back to open in the same
/// atomic update.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(Arc::clone(&state.store));
    let current = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    authorize_tenant(&principal, &current)?;

    let lifecycle_service = AppointmentLifecycleService::new(Arc::clone(&state.store));
    let updated = lifecycle_service
        .update_status(appointment_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated,
    })))
}

/// Complete a consultation: clinical record, billing and status change in
/// one transaction.
#[axum::debug_handler]
pub async fn finalize_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<ClinicalInput>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(Arc::clone(&state.store));
    let current = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    authorize_tenant(&principal, &current)?;

    let finalizer = ConsultationFinalizerService::new(Arc::clone(&state.store));
    let (appointment, record) = finalizer
        .finalize(appointment_id, input)
        .await
        .map_err(map_appointment_error)?;

    let notifier = state.notifier.clone();
    let event = json!({
        "appointment_id": appointment.id,
        "clinical_record_id": record.id,
        "total": appointment.billing.as_ref().map(|b| b.total),
    });
    tokio::spawn(async move {
        notifier.send("appointment.finalized", event).await;
    });

    Ok(Json(json!({
        "success": true,
        "result": FinalizeResponse {
            appointment_id: appointment.id,
            clinical_record_id: record.id,
        },
        "billing": appointment.billing,
    })))
}

fn authorize_tenant(principal: &Principal, appointment: &Appointment) -> Result<(), AppError> {
    if !principal.can_access_tenant(appointment.tenant_id) {
        return Err(AppError::Auth(
            "Not authorized to access this appointment".to_string(),
        ));
    }
    Ok(())
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::InvalidSlot(msg) => AppError::BadRequest(format!("Invalid slot: {}", msg)),
        AppointmentError::SlotTaken => AppError::Conflict(
            "Slot already taken, re-query open slots and pick another".to_string(),
        ),
        AppointmentError::QuotaExceeded { .. } => AppError::QuotaExceeded(e.to_string()),
        AppointmentError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
        AppointmentError::AlreadyFinalized => {
            AppError::Conflict("Appointment already finalized".to_string())
        }
        AppointmentError::InvalidState(current) => {
            AppError::Conflict(format!("Appointment is {}, expected scheduled", current))
        }
        AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
        AppointmentError::PersistenceFailure(msg) => AppError::Internal(msg),
    }
}
