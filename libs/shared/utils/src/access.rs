use shared_models::auth::{Principal, Role};
use shared_models::error::AppError;

/// Operations guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RequestAppointment,
    ListOwnAppointments,
    ReadAvailability,
    ReadSlots,
    ListAllAppointments,
    ViewAppointment,
    SetAppointmentStatus,
    ReplaceAvailability,
    ListPatients,
    ViewPatient,
    AppendPatientNote,
}

impl Operation {
    fn allowed_for(self, role: Role) -> bool {
        match (role, self) {
            (Role::Practitioner, _) => true,
            (
                Role::Patient,
                Operation::RequestAppointment
                | Operation::ListOwnAppointments
                | Operation::ReadAvailability
                | Operation::ReadSlots,
            ) => true,
            (Role::Patient, _) => false,
        }
    }
}

/// Decides whether `principal` may perform `operation`.
///
/// A missing principal is `Unauthorized`; a principal whose role does not
/// grant the operation is `Forbidden`.
pub fn authorize(principal: Option<&Principal>, operation: Operation) -> Result<&Principal, AppError> {
    let principal = principal
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    if operation.allowed_for(principal.role) {
        Ok(principal)
    } else {
        tracing::warn!(
            "User {} with role {} denied {:?}",
            principal.user_id, principal.role, operation
        );
        Err(AppError::Forbidden("Access denied".to_string()))
    }
}
