//! HTTP handlers for the inventory ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{Availability, StockRecord, Unit};

use crate::services::InventoryService;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub product_name: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Unit,
}

/// All stock records
pub async fn list_stock(State(state): State<AppState>) -> Json<Vec<StockRecord>> {
    let service = InventoryService::new(state.store);
    Json(service.get_all_stock().await)
}

pub async fn get_stock(
    State(state): State<AppState>,
    Path((product_name, unit)): Path<(String, Unit)>,
) -> Json<StockRecord> {
    let service = InventoryService::new(state.store);
    Json(service.get_stock(&product_name, unit).await)
}

pub async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Json<Availability> {
    let service = InventoryService::new(state.store);
    Json(
        service
            .check_availability(&query.product_name, query.quantity, query.unit)
            .await,
    )
}
