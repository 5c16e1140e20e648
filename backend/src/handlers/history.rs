//! HTTP handlers for history, direct saves and the audit trail

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{AuditEntry, LineItem, LineItemInput};

use crate::error::AppResult;
use crate::services::history::DEFAULT_AUDIT_LIMIT;
use crate::services::{
    DirectSaveOutcome, HistoryService, InventoryService, SubmissionService,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// History, newest first
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<LineItem>> {
    let service = HistoryService::new(state.store);
    Json(service.get_history(query.limit).await)
}

/// Save a purchase or delivery directly, without a draft
pub async fn save_direct(
    State(state): State<AppState>,
    Json(input): Json<LineItemInput>,
) -> AppResult<(StatusCode, Json<DirectSaveOutcome>)> {
    let item = input.into_line_item(Utc::now())?;
    let service = SubmissionService::new(state.store, state.submission_endpoint);
    let outcome = service.save_direct(item).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// End-of-day reset: history and inventory together
pub async fn end_of_day_reset(State(state): State<AppState>) -> AppResult<StatusCode> {
    let inventory = InventoryService::new(state.store.clone());
    let service = HistoryService::new(state.store);
    service.end_of_day_reset(&inventory).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_audit_log(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let service = HistoryService::new(state.store);
    let entries = service
        .get_audit_log(query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
        .await?;
    Ok(Json(entries))
}
