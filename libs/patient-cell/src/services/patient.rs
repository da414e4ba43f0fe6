use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::auth::{Principal, Role};
use shared_models::error::AppError;
use shared_models::scheduling::UserProfile;
use shared_utils::{authorize, AppState, Operation};

use crate::models::{PatientDetail, PatientError};

pub struct PatientService {
    store: Arc<dyn SchedulingStore>,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn list_patients(&self, principal: &Principal) -> Result<Vec<UserProfile>, AppError> {
        authorize(Some(principal), Operation::ListPatients)?;
        let patients = self.store.users_by_role(Role::Patient).await?;
        debug!("Listed {} patients", patients.len());
        Ok(patients)
    }

    pub async fn get_patient(&self, principal: &Principal, patient_id: Uuid) -> Result<PatientDetail, AppError> {
        authorize(Some(principal), Operation::ViewPatient)?;

        let profile = self.find_patient(patient_id).await?;
        let appointments = self
            .store
            .appointments_by_client(patient_id)
            .await
            .map_err(PatientError::from)?;

        Ok(PatientDetail { profile, appointments })
    }

    /// Appends a line to the patient's private notes.
    pub async fn append_note(
        &self,
        principal: &Principal,
        patient_id: Uuid,
        note: &str,
    ) -> Result<UserProfile, AppError> {
        let principal = authorize(Some(principal), Operation::AppendPatientNote)?;

        let note = note.trim();
        if note.is_empty() {
            return Err(PatientError::EmptyNote.into());
        }

        self.find_patient(patient_id).await?;
        let updated = self
            .store
            .append_private_note(patient_id, note)
            .await
            .map_err(PatientError::from)?;

        info!("Private note added to patient {} by {}", patient_id, principal.user_id);
        Ok(updated)
    }

    async fn find_patient(&self, patient_id: Uuid) -> Result<UserProfile, PatientError> {
        match self.store.get_user(patient_id).await? {
            Some(user) if user.role == Role::Patient => Ok(user),
            _ => Err(PatientError::NotFound),
        }
    }
}
