use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_models::scheduling::parse_calendar_date;
use shared_utils::{AppState, JsonBody};

use crate::models::{AvailabilityError, AvailabilityRuleInput, SlotQuery};
use crate::services::{AvailabilityStore, SlotService};

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let rules = AvailabilityStore::new(&state).get(&principal).await?;
    Ok(Json(json!(rules)))
}

#[axum::debug_handler]
pub async fn replace_availability(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    JsonBody(rules): JsonBody<Vec<AvailabilityRuleInput>>,
) -> Result<Json<Value>, AppError> {
    let stored = AvailabilityStore::new(&state)
        .replace_all(&principal, rules)
        .await?;
    Ok(Json(json!(stored)))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_calendar_date(&query.date).map_err(AvailabilityError::InvalidDate)?;
    let response = SlotService::new(&state)
        .available_slots(&principal, date)
        .await?;
    Ok(Json(json!(response)))
}
