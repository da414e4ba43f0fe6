use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::scheduling::SlotTime;

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// One day of a submitted weekly template. Values are validated by
/// [`crate::services::store::normalize_rules`] before anything is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRuleInput {
    #[serde(alias = "dayOfWeek")]
    pub day_of_week: i64,
    pub times: Vec<String>,
    #[serde(default = "default_active", alias = "isActive")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AvailableSlotsResponse {
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub slots: Vec<SlotTime>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Day of week must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidDay(i64),

    #[error("Day of week {0} appears more than once")]
    DuplicateDay(u8),

    #[error("{0}")]
    InvalidTime(String),

    #[error("{0}")]
    InvalidDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Store(store) => store.into(),
            other => AppError::Validation(other.to_string()),
        }
    }
}
