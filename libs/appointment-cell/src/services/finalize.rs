use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::scheduling::{Appointment, BillingSummary, ClinicalRecord};
use shared_store::{SchedulingStore, StoreError};

use crate::models::{AppointmentError, ClinicalInput};

/// The consultation finalizer: clinical record creation, billing computation
/// and the transition to completed, committed as one unit of work.
pub struct ConsultationFinalizerService {
    store: Arc<SchedulingStore>,
}

impl ConsultationFinalizerService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    /// Finalize a scheduled appointment. Idempotency guard: a second call
    /// for the same appointment fails with `AlreadyFinalized` and creates
    /// neither a duplicate clinical record nor a second billing total. The
    /// slot stays booked; completed appointments represent consumed time.
    pub async fn finalize(
        &self,
        appointment_id: Uuid,
        input: ClinicalInput,
    ) -> Result<(Appointment, ClinicalRecord), AppointmentError> {
        validate_clinical_input(&input)?;

        let billing = compute_billing(&input);
        let record = ClinicalRecord {
            id: Uuid::new_v4(),
            appointment_id,
            chief_complaint: input.chief_complaint,
            diagnosis: input.diagnosis,
            treatments: input.treatments,
            tests: input.tests,
            notes: input.notes,
            created_at: Utc::now(),
        };

        debug!(
            "Finalizing appointment {} (total {:.2})",
            appointment_id, billing.total
        );

        let (appointment, record) = self
            .store
            .finalize_appointment(appointment_id, record, billing)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => AppointmentError::NotFound,
                StoreError::AlreadyFinalized => AppointmentError::AlreadyFinalized,
                StoreError::InvalidState { current } => AppointmentError::InvalidState(current),
                other => AppointmentError::PersistenceFailure(other.to_string()),
            })?;

        info!(
            "Appointment {} completed with clinical record {}",
            appointment.id, record.id
        );
        Ok((appointment, record))
    }
}

/// Consultation fee plus ordered treatments plus priced tests, minus the
/// discount, floored at zero.
pub fn compute_billing(input: &ClinicalInput) -> BillingSummary {
    let treatment_total: f64 = input.treatments.iter().map(|item| item.price).sum();
    let test_total: f64 = input.tests.iter().map(|item| item.price).sum();
    let total =
        (input.consultation_fee + treatment_total + test_total - input.discount).max(0.0);

    BillingSummary {
        consultation_fee: input.consultation_fee,
        treatment_total,
        test_total,
        discount: input.discount,
        total,
    }
}

fn validate_clinical_input(input: &ClinicalInput) -> Result<(), AppointmentError> {
    if input.chief_complaint.trim().is_empty() {
        return Err(AppointmentError::ValidationError(
            "chief complaint is required".to_string(),
        ));
    }
    if input.consultation_fee < 0.0 {
        return Err(AppointmentError::ValidationError(
            "consultation fee cannot be negative".to_string(),
        ));
    }
    if input.discount < 0.0 {
        return Err(AppointmentError::ValidationError(
            "discount cannot be negative".to_string(),
        ));
    }
    if input
        .treatments
        .iter()
        .chain(input.tests.iter())
        .any(|item| item.price < 0.0)
    {
        return Err(AppointmentError::ValidationError(
            "line item prices cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::scheduling::ChargeItem;

    fn input(fee: f64, treatments: Vec<f64>, tests: Vec<f64>, discount: f64) -> ClinicalInput {
        ClinicalInput {
            chief_complaint: "fever".to_string(),
            diagnosis: "viral infection".to_string(),
            consultation_fee: fee,
            treatments: treatments
                .into_iter()
                .map(|price| ChargeItem {
                    name: "treatment".to_string(),
                    price,
                })
                .collect(),
            tests: tests
                .into_iter()
                .map(|price| ChargeItem {
                    name: "test".to_string(),
                    price,
                })
                .collect(),
            discount,
            notes: None,
        }
    }

    #[test]
    fn billing_sums_fee_treatments_and_tests_minus_discount() {
        let billing = compute_billing(&input(500.0, vec![200.0], vec![], 100.0));
        assert_eq!(billing.total, 600.0);
        assert_eq!(billing.treatment_total, 200.0);
        assert_eq!(billing.test_total, 0.0);
    }

    #[test]
    fn billing_total_is_floored_at_zero() {
        let billing = compute_billing(&input(100.0, vec![], vec![], 500.0));
        assert_eq!(billing.total, 0.0);
        // The discount itself is recorded as submitted.
        assert_eq!(billing.discount, 500.0);
    }

    #[test]
    fn negative_fee_is_rejected() {
        let result = validate_clinical_input(&input(-1.0, vec![], vec![], 0.0));
        assert!(result.is_err());
    }
}
