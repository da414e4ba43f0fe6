use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use shared_database::SchedulingStore;
use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_models::scheduling::{AvailabilityRule, SlotTime};
use shared_utils::{authorize, AppState, Operation};

use crate::models::{AvailabilityError, AvailabilityRuleInput};

/// The practitioner's weekly template.
pub struct AvailabilityStore {
    store: Arc<dyn SchedulingStore>,
}

impl AvailabilityStore {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    /// All rules, ordered by day of week.
    pub async fn get(&self, principal: &Principal) -> Result<Vec<AvailabilityRule>, AppError> {
        authorize(Some(principal), Operation::ReadAvailability)?;
        let rules = self.store.availability().await?;
        debug!("Loaded {} availability rules", rules.len());
        Ok(rules)
    }

    /// Validates and swaps in a whole new weekly template.
    pub async fn replace_all(
        &self,
        principal: &Principal,
        input: Vec<AvailabilityRuleInput>,
    ) -> Result<Vec<AvailabilityRule>, AppError> {
        authorize(Some(principal), Operation::ReplaceAvailability)?;

        let rules = normalize_rules(input)?;
        let stored = self
            .store
            .replace_availability(rules)
            .await
            .map_err(AvailabilityError::from)?;

        info!(
            "Availability template replaced by {} ({} days, {} active)",
            principal.user_id,
            stored.len(),
            stored.iter().filter(|r| r.is_active).count()
        );
        Ok(stored)
    }
}

/// Checks day range, rejects duplicate days and malformed times, and sorts
/// each day's times ascending without duplicates.
pub fn normalize_rules(input: Vec<AvailabilityRuleInput>) -> Result<Vec<AvailabilityRule>, AvailabilityError> {
    let mut seen = BTreeSet::new();
    let mut rules = Vec::with_capacity(input.len());

    for entry in input {
        let day = u8::try_from(entry.day_of_week)
            .ok()
            .filter(|d| *d <= 6)
            .ok_or(AvailabilityError::InvalidDay(entry.day_of_week))?;

        if !seen.insert(day) {
            return Err(AvailabilityError::DuplicateDay(day));
        }

        let times: BTreeSet<SlotTime> = entry
            .times
            .iter()
            .map(|t| SlotTime::parse(t.trim()))
            .collect::<Result<_, _>>()
            .map_err(AvailabilityError::InvalidTime)?;

        rules.push(AvailabilityRule {
            day_of_week: day,
            times: times.into_iter().collect(),
            is_active: entry.is_active,
        });
    }

    rules.sort_by_key(|r| r.day_of_week);
    Ok(rules)
}
