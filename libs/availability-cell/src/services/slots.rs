use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use shared_database::SchedulingStore;
use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_models::scheduling::{day_of_week, AvailabilityRule, SlotTime};
use shared_utils::{authorize, AppState, Clock, Operation};

use crate::models::AvailableSlotsResponse;

/// Times offerable on `date`.
///
/// Empty when `date` is before `today`, when no rule covers the weekday or
/// when the rule is inactive. Otherwise the rule's times minus `occupied`,
/// ascending.
pub fn resolve(
    date: NaiveDate,
    rule: Option<&AvailabilityRule>,
    occupied: &[SlotTime],
    today: NaiveDate,
) -> Vec<SlotTime> {
    if date < today {
        return Vec::new();
    }

    let rule = match rule {
        Some(rule) if rule.is_active && rule.day_of_week == day_of_week(date) => rule,
        _ => return Vec::new(),
    };

    let occupied: HashSet<&SlotTime> = occupied.iter().collect();
    let mut slots: Vec<SlotTime> = rule
        .times
        .iter()
        .filter(|time| !occupied.contains(time))
        .copied()
        .collect();
    slots.sort();
    slots.dedup();
    slots
}

/// The rule for the weekday of `date`, if any.
pub fn rule_for(rules: &[AvailabilityRule], date: NaiveDate) -> Option<&AvailabilityRule> {
    let day = day_of_week(date);
    rules.iter().find(|rule| rule.day_of_week == day)
}

pub struct SlotService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

impl SlotService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
        }
    }

    pub async fn available_slots(
        &self,
        principal: &Principal,
        date: NaiveDate,
    ) -> Result<AvailableSlotsResponse, AppError> {
        authorize(Some(principal), Operation::ReadSlots)?;

        let rules = self.store.availability().await?;
        let occupied: Vec<SlotTime> = self
            .store
            .appointments_on_date(date)
            .await?
            .into_iter()
            .filter(|a| a.status.occupies_slot())
            .map(|a| a.time)
            .collect();

        let slots = resolve(date, rule_for(&rules, date), &occupied, self.clock.today());
        debug!("{} slots available on {}", slots.len(), date);

        Ok(AvailableSlotsResponse {
            date,
            day_of_week: day_of_week(date),
            slots,
        })
    }
}
