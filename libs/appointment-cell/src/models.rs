use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::scheduling::{AppointmentStatus, SlotTime};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Date, time and client id arrive as raw strings so their format
/// errors can name the offending field.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("A client_id is required when booking on behalf of a patient")]
    MissingClient,

    #[error("Invalid client id: {0}")]
    InvalidClient(String),

    #[error("{0}")]
    InvalidDate(String),

    #[error("{0}")]
    InvalidTime(String),

    #[error("Cannot book a date in the past: {0}")]
    PastDate(NaiveDate),

    #[error("{time} is not offered on {date}")]
    SlotNotOffered { date: NaiveDate, time: SlotTime },

    #[error("Unknown appointment status: {0}")]
    InvalidStatus(String),

    #[error("Cannot change appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("This time slot is already booked")]
    ConflictDetected,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound | AppointmentError::PatientNotFound => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::InvalidStatusTransition { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            AppointmentError::ConflictDetected => AppError::Conflict(err.to_string()),
            AppointmentError::Store(store) => store.into(),
            AppointmentError::MissingClient
            | AppointmentError::InvalidClient(_)
            | AppointmentError::InvalidDate(_)
            | AppointmentError::InvalidTime(_)
            | AppointmentError::PastDate(_)
            | AppointmentError::SlotNotOffered { .. }
            | AppointmentError::InvalidStatus(_) => AppError::Validation(err.to_string()),
        }
    }
}
