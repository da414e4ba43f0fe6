use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::Role;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, AppointmentWithClient, AvailabilityRule, NewAppointment,
    UserProfile,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{join_note, SchedulingStore};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, UserProfile>,
    appointments: HashMap<Uuid, Appointment>,
    availability: BTreeMap<u8, AvailabilityRule>,
}

impl MemoryState {
    fn with_client(&self, appointment: &Appointment) -> AppointmentWithClient {
        AppointmentWithClient {
            appointment: appointment.clone(),
            client: self.users.get(&appointment.client_id).map(UserProfile::summary),
        }
    }
}

/// Process-local store. All collections sit behind one lock, so every
/// multi-row operation observes and mutates a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn insert_user(&self, user: UserProfile) -> StoreResult<UserProfile> {
        let mut state = self.state.write().await;
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn users_by_role(&self, role: Role) -> StoreResult<Vec<UserProfile>> {
        let state = self.state.read().await;
        let mut users: Vec<UserProfile> = state
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(users)
    }

    async fn append_private_note(&self, id: Uuid, note: &str) -> StoreResult<UserProfile> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        user.private_notes = Some(join_note(user.private_notes.as_deref(), note));
        Ok(user.clone())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let created = Appointment {
            id: Uuid::new_v4(),
            client_id: appointment.client_id,
            date: appointment.date,
            time: appointment.time,
            notes: appointment.notes,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        };

        let mut state = self.state.write().await;
        state.appointments.insert(created.id, created.clone());
        debug!("Stored appointment {}", created.id);
        Ok(created)
    }

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn get_appointment_with_client(&self, id: Uuid) -> StoreResult<Option<AppointmentWithClient>> {
        let state = self.state.read().await;
        Ok(state.appointments.get(&id).map(|a| state.with_client(a)))
    }

    async fn appointments_by_client(&self, client_id: Uuid) -> StoreResult<Vec<Appointment>> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.client_id == client_id)
            .cloned()
            .collect();
        appointments.sort_by(Appointment::newest_first);
        Ok(appointments)
    }

    async fn appointments_with_clients(&self) -> StoreResult<Vec<AppointmentWithClient>> {
        let state = self.state.read().await;
        let mut appointments: Vec<&Appointment> = state.appointments.values().collect();
        appointments.sort_by(|a, b| Appointment::newest_first(a, b));
        Ok(appointments.into_iter().map(|a| state.with_client(a)).collect())
    }

    async fn appointments_on_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.date == date)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.time);
        Ok(appointments)
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        let mut state = self.state.write().await;

        let current = state
            .appointments
            .get(&id)
            .ok_or_else(|| StoreError::NotFound("Appointment".to_string()))?;

        if current.status != expected {
            return Err(StoreError::StatusChanged { id, expected });
        }

        if new_status == AppointmentStatus::Scheduled {
            let slot_taken = state.appointments.values().any(|other| {
                other.id != id
                    && other.date == current.date
                    && other.time == current.time
                    && other.status == AppointmentStatus::Scheduled
            });
            if slot_taken {
                return Err(StoreError::SlotTaken(id));
            }
        }

        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Appointment".to_string()))?;
        appointment.status = new_status;
        Ok(appointment.clone())
    }

    async fn availability(&self) -> StoreResult<Vec<AvailabilityRule>> {
        Ok(self.state.read().await.availability.values().cloned().collect())
    }

    async fn replace_availability(&self, rules: Vec<AvailabilityRule>) -> StoreResult<Vec<AvailabilityRule>> {
        let replacement: BTreeMap<u8, AvailabilityRule> =
            rules.into_iter().map(|rule| (rule.day_of_week, rule)).collect();

        let mut state = self.state.write().await;
        state.availability = replacement;
        Ok(state.availability.values().cloned().collect())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
