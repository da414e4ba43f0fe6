use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use availability_cell::availability_routes;
use patient_cell::patient_routes;
use shared_utils::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Agenda API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/patients", patient_routes(state))
}
