use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::services::slots::rule_for;
use shared_database::SchedulingStore;
use shared_models::auth::{Principal, Role};
use shared_models::error::AppError;
use shared_models::scheduling::{
    parse_calendar_date, Appointment, AppointmentStatus, AppointmentWithClient, NewAppointment,
    SlotTime,
};
use shared_utils::{authorize, AppState, Clock, Operation};

use crate::models::{AppointmentError, CreateAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentBookingService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Creates a `pending` appointment.
    ///
    /// Patients always book for themselves, whatever `client_id` says, and only
    /// on a time the active template offers. The practitioner books for an
    /// existing patient on any time. Either way a slot already `scheduled` is
    /// refused; competing `pending` requests are allowed and settled on
    /// confirmation.
    pub async fn request_appointment(
        &self,
        principal: &Principal,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let principal = authorize(Some(principal), Operation::RequestAppointment)?;
        debug!("Appointment request from {} for {} {}", principal.user_id, request.date, request.time);

        let client_id = self.resolve_client(principal, request.client_id.as_deref()).await?;

        let date = parse_calendar_date(request.date.trim()).map_err(AppointmentError::InvalidDate)?;
        let time = SlotTime::parse(request.time.trim()).map_err(AppointmentError::InvalidTime)?;

        if date < self.clock.today() {
            return Err(AppointmentError::PastDate(date).into());
        }

        if principal.role == Role::Patient {
            let rules = self.store.availability().await?;
            let offered = rule_for(&rules, date)
                .map(|rule| rule.is_active && rule.times.contains(&time))
                .unwrap_or(false);
            if !offered {
                return Err(AppointmentError::SlotNotOffered { date, time }.into());
            }
        }

        let taken = self
            .store
            .appointments_on_date(date)
            .await?
            .iter()
            .any(|a| a.time == time && a.status == AppointmentStatus::Scheduled);
        if taken {
            warn!("Rejected request for already scheduled slot {} {}", date, time);
            return Err(AppointmentError::ConflictDetected.into());
        }

        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let appointment = self
            .store
            .insert_appointment(NewAppointment { client_id, date, time, notes })
            .await
            .map_err(AppointmentError::from)?;

        info!(
            "Appointment {} requested for client {} on {} at {}",
            appointment.id, client_id, date, time
        );
        Ok(appointment)
    }

    async fn resolve_client(&self, principal: &Principal, requested: Option<&str>) -> Result<Uuid, AppError> {
        if principal.role == Role::Patient {
            if let Some(requested) = requested {
                if requested != principal.user_id.to_string() {
                    warn!(
                        "Patient {} tried to book for client {}; using own identity",
                        principal.user_id, requested
                    );
                }
            }
            return Ok(principal.user_id);
        }

        let raw = requested
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppointmentError::MissingClient)?;
        let client_id = Uuid::parse_str(raw).map_err(|_| AppointmentError::InvalidClient(raw.to_string()))?;

        match self.store.get_user(client_id).await? {
            Some(user) if user.role == Role::Patient => Ok(client_id),
            _ => Err(AppointmentError::PatientNotFound.into()),
        }
    }

    /// Moves an appointment along its lifecycle. Confirmation is settled by the
    /// store in one atomic step, so a lost race surfaces as a conflict.
    pub async fn set_status(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        new_status: &str,
    ) -> Result<Appointment, AppError> {
        let principal = authorize(Some(principal), Operation::SetAppointmentStatus)?;

        let new_status: AppointmentStatus = new_status
            .trim()
            .parse()
            .map_err(|_| AppointmentError::InvalidStatus(new_status.to_string()))?;

        let current = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle
            .validate_status_transition(current.status, new_status)?;

        let updated = self
            .store
            .update_appointment_status(appointment_id, current.status, new_status)
            .await
            .map_err(|e| {
                warn!("Status change of {} to {} failed: {}", appointment_id, new_status, e);
                AppointmentError::from(e)
            })?;

        info!(
            "Appointment {} moved {} -> {} by {}",
            appointment_id, current.status, updated.status, principal.user_id
        );
        Ok(updated)
    }

    /// The caller's own appointments, newest first.
    pub async fn list_for_patient(&self, principal: &Principal) -> Result<Vec<Appointment>, AppError> {
        let principal = authorize(Some(principal), Operation::ListOwnAppointments)?;
        Ok(self.store.appointments_by_client(principal.user_id).await?)
    }

    /// Every appointment with its owner's summary, newest first.
    pub async fn list_all(&self, principal: &Principal) -> Result<Vec<AppointmentWithClient>, AppError> {
        authorize(Some(principal), Operation::ListAllAppointments)?;
        Ok(self.store.appointments_with_clients().await?)
    }

    pub async fn get_with_client(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
    ) -> Result<AppointmentWithClient, AppError> {
        authorize(Some(principal), Operation::ViewAppointment)?;
        self.store
            .get_appointment_with_client(appointment_id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound.into())
    }
}
