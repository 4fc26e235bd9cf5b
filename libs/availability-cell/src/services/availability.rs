use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::scheduling::{AvailabilityRule, AvailabilitySlot, SlotState};
use shared_store::SchedulingStore;

use crate::models::{AvailabilityError, RuleInput};

/// A rule's slot duration can never exceed one civil day.
pub const MAX_SLOT_DURATION_MINUTES: i64 = 24 * 60;

/// Upper bound on the generation horizon (ten years).
pub const MAX_HORIZON_DAYS: i64 = 3650;

pub struct AvailabilityService {
    store: Arc<SchedulingStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    /// Replace the provider's weekly schedule and rebuild its future slots.
    ///
    /// Destructive-and-rebuild: all not-yet-booked future slots are removed
    /// and regenerated from the submitted rule set, so the visible schedule
    /// always reflects the latest rules. Booked slots and their appointments
    /// are left untouched, and newly expanded slots that would collide with
    /// a surviving booked slot are skipped at insert time.
    pub async fn regenerate_schedule(
        &self,
        provider_id: Uuid,
        inputs: Vec<RuleInput>,
        horizon_days: i64,
    ) -> Result<(usize, usize), AvailabilityError> {
        validate_rules(&inputs)?;
        if !(1..=MAX_HORIZON_DAYS).contains(&horizon_days) {
            return Err(AvailabilityError::InvalidRule(format!(
                "horizon_days must be between 1 and {}, got {}",
                MAX_HORIZON_DAYS, horizon_days
            )));
        }

        let now = Utc::now();
        let rules: Vec<AvailabilityRule> = inputs
            .into_iter()
            .map(|input| AvailabilityRule {
                id: Uuid::new_v4(),
                provider_id,
                day_of_week: input.day_of_week,
                start_time: input.start_time,
                end_time: input.end_time,
                slot_duration_minutes: input.slot_duration_minutes,
                is_active: input.is_active,
            })
            .collect();

        self.store.replace_rules(provider_id, rules.clone()).await;
        let removed = self.store.delete_open_slots_after(provider_id, now).await;

        let mut slots = Vec::new();
        let today = now.date_naive();
        for offset in 0..horizon_days {
            let date = today + Duration::days(offset);
            let weekday = date.weekday().num_days_from_sunday() as u8;

            // At most one active rule per weekday, enforced by validation.
            let Some(rule) = rules
                .iter()
                .find(|r| r.is_active && r.day_of_week == weekday)
            else {
                continue;
            };

            for (start, end) in expand_rule_for_date(rule, date) {
                if start <= now {
                    continue;
                }
                slots.push(AvailabilitySlot {
                    id: Uuid::new_v4(),
                    provider_id,
                    start_time: start,
                    end_time: end,
                    state: SlotState::Open,
                });
            }
        }

        let created = self.store.insert_slots(slots).await;
        info!(
            "Regenerated schedule for provider {}: {} slots removed, {} created",
            provider_id, removed, created
        );
        Ok((removed, created))
    }

    /// Open slots for a provider in ascending start-time order.
    pub async fn list_open_slots(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityError> {
        if from >= to {
            return Err(AvailabilityError::InvalidQuery(
                "'from' must be before 'to'".to_string(),
            ));
        }
        debug!("Listing open slots for provider {} in [{}, {})", provider_id, from, to);
        Ok(self.store.list_open_slots(provider_id, from, to).await)
    }
}

/// Reject malformed rule sets before anything is written. A rule with
/// start >= end is a validation error here, never a silent skip during
/// generation.
pub fn validate_rules(inputs: &[RuleInput]) -> Result<(), AvailabilityError> {
    let mut seen_weekdays = [false; 7];

    for input in inputs {
        if input.day_of_week > 6 {
            return Err(AvailabilityError::InvalidRule(format!(
                "day_of_week must be 0-6, got {}",
                input.day_of_week
            )));
        }
        if input.start_time >= input.end_time {
            return Err(AvailabilityError::InvalidRule(format!(
                "start time {} must be before end time {}",
                input.start_time, input.end_time
            )));
        }
        if input.slot_duration_minutes <= 0 {
            return Err(AvailabilityError::InvalidRule(
                "slot duration must be positive".to_string(),
            ));
        }
        if input.slot_duration_minutes > MAX_SLOT_DURATION_MINUTES {
            return Err(AvailabilityError::InvalidRule(format!(
                "slot duration must be at most {} minutes, got {}",
                MAX_SLOT_DURATION_MINUTES, input.slot_duration_minutes
            )));
        }
        if input.is_active {
            let day = input.day_of_week as usize;
            if seen_weekdays[day] {
                return Err(AvailabilityError::DuplicateWeekday(input.day_of_week));
            }
            seen_weekdays[day] = true;
        }
    }

    Ok(())
}

/// Expand one rule into consecutive fixed-duration periods on a calendar
/// date. A trailing remainder shorter than the slot duration is dropped.
/// Rule civil times are interpreted as UTC (stored instants are UTC).
fn expand_rule_for_date(
    rule: &AvailabilityRule,
    date: NaiveDate,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let duration = Duration::minutes(rule.slot_duration_minutes);
    let window_start = date.and_time(rule.start_time).and_utc();
    let window_end = date.and_time(rule.end_time).and_utc();

    let mut periods = Vec::new();
    let mut cursor = window_start;
    while cursor + duration <= window_end {
        periods.push((cursor, cursor + duration));
        cursor += duration;
    }
    periods
}
