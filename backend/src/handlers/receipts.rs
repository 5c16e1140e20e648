//! HTTP handlers for receipt scanning

use axum::{extract::State, Json};
use chrono::Utc;
use shared::{Draft, LineItemInput};

use crate::error::AppResult;
use crate::services::{ReceiptImage, ReceiptService, ScannedReceipt};
use crate::AppState;

fn receipt_service(state: AppState) -> ReceiptService {
    let location = state.config.receipts.default_location.clone();
    ReceiptService::new(state.store, state.recognizer, location)
}

/// Recognise a receipt photo into reviewable purchase items
pub async fn scan_receipt(
    State(state): State<AppState>,
    Json(image): Json<ReceiptImage>,
) -> AppResult<Json<ScannedReceipt>> {
    let scanned = receipt_service(state).scan(&image).await?;
    Ok(Json(scanned))
}

/// Add reviewed receipt items to the receipt location's purchase draft
pub async fn confirm_receipt(
    State(state): State<AppState>,
    Json(inputs): Json<Vec<LineItemInput>>,
) -> AppResult<Json<Draft>> {
    let now = Utc::now();
    let items = inputs
        .into_iter()
        .map(|input| input.into_line_item(now))
        .collect::<Result<Vec<_>, _>>()?;
    let draft = receipt_service(state).confirm(items).await?;
    Ok(Json(draft))
}
