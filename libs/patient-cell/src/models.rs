use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::scheduling::{Appointment, UserProfile};

/// Practitioner view of one patient: full profile including private notes,
/// plus the patient's appointments newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendNoteRequest {
    pub note: String,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Note must not be empty")]
    EmptyNote,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::EmptyNote => AppError::Validation(err.to_string()),
            PatientError::Store(StoreError::NotFound(_)) => {
                AppError::NotFound(PatientError::NotFound.to_string())
            }
            PatientError::Store(store) => store.into(),
        }
    }
}
