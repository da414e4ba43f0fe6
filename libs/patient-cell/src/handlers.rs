use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::{AppState, JsonBody};

use crate::models::AppendNoteRequest;
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(&state).list_patients(&principal).await?;
    Ok(Json(json!(patients)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&state)
        .get_patient(&principal, patient_id)
        .await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn append_patient_note(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<AppendNoteRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&state)
        .append_note(&principal, patient_id, &request.note)
        .await?;
    Ok(Json(json!(patient)))
}
