use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::scheduling::{Appointment, AppointmentStatus};
use shared_store::{SchedulingStore, StoreError};

use crate::models::{AppointmentError, UpdateAppointmentStatusRequest};

/// The appointment state machine. Scheduled is the only non-terminal state;
/// completion is reachable exclusively through the finalizer, so direct
/// updates may only target cancelled or no-show.
pub struct AppointmentLifecycleService {
    store: Arc<SchedulingStore>,
}

impl AppointmentLifecycleService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    /// All valid next statuses for a given current status.
    pub fn get_valid_transitions(current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::NoShow => vec![],
        }
    }

    pub fn validate_status_transition(
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, new);

        if !Self::get_valid_transitions(current).contains(new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(AppointmentError::InvalidTransition {
                from: *current,
                to: *new,
            });
        }
        Ok(())
    }

    /// Apply a direct status update (cancellation or no-show) and release the
    /// bound slot back to open in the same atomic store update. The store
    /// re-checks the scheduled precondition inside its critical section, so
    /// a race against finalization resolves to a typed conflict here.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        match request.status {
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow => {}
            AppointmentStatus::Completed => {
                return Err(AppointmentError::ValidationError(
                    "Completion happens through finalization, not a status update".to_string(),
                ));
            }
            AppointmentStatus::Scheduled => {
                return Err(AppointmentError::ValidationError(
                    "Cannot revert an appointment to scheduled".to_string(),
                ));
            }
        }

        let updated = self
            .store
            .transition_and_release(
                appointment_id,
                request.status,
                request.reason,
                request.notes,
            )
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => AppointmentError::NotFound,
                StoreError::InvalidState { current } => AppointmentError::InvalidTransition {
                    from: current,
                    to: request.status,
                },
                other => AppointmentError::PersistenceFailure(other.to_string()),
            })?;

        info!(
            "Appointment {} moved to {}, slot released",
            appointment_id, updated.status
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn scheduled_can_reach_all_terminal_states() {
        let from = AppointmentStatus::Scheduled;
        for to in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(AppointmentLifecycleService::validate_status_transition(&from, &to).is_ok());
        }
    }

    #[test]
    fn terminal_states_allow_no_transitions() {
        for from in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            for to in [
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ] {
                assert_matches!(
                    AppointmentLifecycleService::validate_status_transition(&from, &to),
                    Err(AppointmentError::InvalidTransition { .. })
                );
            }
        }
    }
}
