use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::{AppState, JsonBody};

use crate::models::{CreateAppointmentRequest, UpdateStatusRequest};
use crate::services::AppointmentBookingService;

/// Practitioners see every appointment with its client; patients see their own.
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    if principal.is_practitioner() {
        let appointments = service.list_all(&principal).await?;
        Ok(Json(json!(appointments)))
    } else {
        let appointments = service.list_for_patient(&principal).await?;
        Ok(Json(json!(appointments)))
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .request_appointment(&principal, request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .get_with_client(&principal, appointment_id)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .set_status(&principal, appointment_id, &request.status)
        .await?;

    Ok(Json(json!(appointment)))
}
