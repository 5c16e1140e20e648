//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::store::StoreState;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store.state();
    let status = match store {
        StoreState::Ready => "healthy",
        StoreState::Degraded => "degraded",
        _ => "unavailable",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        backend: state.store.backend_tag(),
    })
}
