//! HTTP handlers for unloading and purchase drafts

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use shared::{Draft, DraftKind, DraftSummary, LineItem, LineItemInput};

use crate::error::{AppError, AppResult};
use crate::services::{DraftService, SubmissionReceipt, SubmissionService};
use crate::AppState;

/// Validate operator input into an item of the draft's movement type
fn draft_item(kind: DraftKind, mut input: LineItemInput) -> AppResult<LineItem> {
    input.item_type = kind.item_type();
    if kind == DraftKind::Purchase {
        input.source = None;
    }
    Ok(input.into_line_item(Utc::now())?)
}

fn submission(state: &AppState) -> SubmissionService {
    SubmissionService::new(state.store.clone(), state.submission_endpoint.clone())
}

/// List draft summaries, most recently touched first
pub async fn list_drafts(
    State(state): State<AppState>,
    Path(kind): Path<DraftKind>,
) -> Json<Vec<DraftSummary>> {
    let service = DraftService::new(state.store, kind);
    Json(service.get_all_drafts_array().await)
}

/// Get a draft; unknown keys yield a fresh empty draft
pub async fn get_draft(
    State(state): State<AppState>,
    Path((kind, key)): Path<(DraftKind, String)>,
) -> Json<Draft> {
    let service = DraftService::new(state.store, kind);
    Json(service.get_draft(&key).await)
}

pub async fn delete_draft(
    State(state): State<AppState>,
    Path((kind, key)): Path<(DraftKind, String)>,
) -> AppResult<StatusCode> {
    let service = DraftService::new(state.store, kind);
    service.delete_draft(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add an item. Unloading items are checked against today's stock first.
pub async fn add_item(
    State(state): State<AppState>,
    Path((kind, key)): Path<(DraftKind, String)>,
    Json(input): Json<LineItemInput>,
) -> AppResult<(StatusCode, Json<Draft>)> {
    let item = draft_item(kind, input)?;
    let draft = match kind {
        DraftKind::Unloading => submission(&state).add_unloading_item(&key, item).await?,
        DraftKind::Purchase => {
            DraftService::new(state.store, kind)
                .add_item_to_draft(&key, item)
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(draft)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((kind, key, item_id)): Path<(DraftKind, String, String)>,
    Json(input): Json<LineItemInput>,
) -> AppResult<Json<Draft>> {
    let item = draft_item(kind, input)?;
    let draft = match kind {
        DraftKind::Unloading => {
            submission(&state)
                .update_unloading_item(&key, &item_id, item)
                .await?
        }
        DraftKind::Purchase => {
            DraftService::new(state.store, kind)
                .update_item_in_draft(&key, &item_id, item)
                .await?
        }
    };
    draft
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Item {} in draft {}", item_id, key)))
}

/// Remove an item; the returned draft is gone from storage when it is empty
pub async fn remove_item(
    State(state): State<AppState>,
    Path((kind, key, item_id)): Path<(DraftKind, String, String)>,
) -> AppResult<Json<Draft>> {
    let service = DraftService::new(state.store, kind);
    service
        .remove_item_from_draft(&key, &item_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Item {} in draft {}", item_id, key)))
}

/// Send a draft to the workflow webhook
pub async fn submit_draft(
    State(state): State<AppState>,
    Path((kind, key)): Path<(DraftKind, String)>,
) -> AppResult<Json<SubmissionReceipt>> {
    let receipt = submission(&state).submit_draft(kind, &key).await?;
    Ok(Json(receipt))
}
