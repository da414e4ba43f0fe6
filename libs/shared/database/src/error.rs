use sqlx::Error as SqlxError;
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::scheduling::AppointmentStatus;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Database configuration error: {0}")]
    Configuration(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("The slot of appointment {0} is already scheduled")]
    SlotTaken(Uuid),

    #[error("Appointment {id} is no longer {expected}")]
    StatusChanged { id: Uuid, expected: AppointmentStatus },

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            StoreError::SlotTaken(_) => {
                AppError::Conflict("This time slot is already booked".to_string())
            }
            StoreError::StatusChanged { .. } => {
                AppError::Conflict("Appointment was modified concurrently, please retry".to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}
