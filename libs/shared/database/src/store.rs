use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::auth::Role;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, AppointmentWithClient, AvailabilityRule, NewAppointment,
    UserProfile,
};

use crate::error::StoreResult;

/// Persistence collaborator for users, appointments and the weekly template.
///
/// Listing queries return appointments newest first by `(date, time)` and
/// availability rules ordered by day of week.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn insert_user(&self, user: UserProfile) -> StoreResult<UserProfile>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;

    async fn users_by_role(&self, role: Role) -> StoreResult<Vec<UserProfile>>;

    /// Appends a line to the user's private notes. `NotFound` if the user is absent.
    async fn append_private_note(&self, id: Uuid, note: &str) -> StoreResult<UserProfile>;

    async fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment>;

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>>;

    async fn get_appointment_with_client(&self, id: Uuid) -> StoreResult<Option<AppointmentWithClient>>;

    async fn appointments_by_client(&self, client_id: Uuid) -> StoreResult<Vec<Appointment>>;

    async fn appointments_with_clients(&self) -> StoreResult<Vec<AppointmentWithClient>>;

    async fn appointments_on_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    /// Compare-and-set of an appointment status.
    ///
    /// Fails with `StatusChanged` when the stored status is not `expected`,
    /// and with `SlotTaken` when `new_status` is `Scheduled` while another
    /// appointment already holds the same date and time as `Scheduled`.
    /// The check and the write are a single atomic step.
    async fn update_appointment_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> StoreResult<Appointment>;

    async fn availability(&self) -> StoreResult<Vec<AvailabilityRule>>;

    /// Replaces the whole weekly template in one atomic step.
    async fn replace_availability(&self, rules: Vec<AvailabilityRule>) -> StoreResult<Vec<AvailabilityRule>>;

    async fn health_check(&self) -> StoreResult<bool>;
}

pub(crate) fn join_note(existing: Option<&str>, note: &str) -> String {
    match existing {
        Some(current) if !current.trim().is_empty() => format!("{}\n{}", current, note),
        _ => note.to_string(),
    }
}
