//! Line item model: one product movement

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{ItemType, StockSource, Unit};

/// One product movement (purchase, unloading or delivery).
///
/// Mutable while held in a draft, immutable once written to history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Opaque unique token
    pub id: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    #[serde(default)]
    pub price_per_unit: Decimal,
    /// quantity × price_per_unit, rounded to 2 decimals
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub location: String,
    /// Creation instant
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Only set for unloading items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<StockSource>,
    /// Stamped when the item is edited inside a draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LineItem {
    /// Generate a fresh item id
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Replace the content of this item with `edit`, keeping its provenance
    /// (`id` and creation `timestamp`).
    pub fn apply_edit(&mut self, edit: LineItem, at: DateTime<Utc>) {
        let id = std::mem::take(&mut self.id);
        let timestamp = self.timestamp;
        *self = LineItem {
            id,
            timestamp,
            updated_at: Some(at),
            ..edit
        };
    }

    /// Whether this unloading item draws on today's purchased stock
    pub fn draws_on_purchases(&self) -> bool {
        self.source.as_ref().is_some_and(StockSource::is_purchase)
    }
}

/// Round a money amount to 2 decimal places, halves away from zero
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Line total: quantity × price, rounded to 2 decimals
pub fn line_total(quantity: Decimal, price_per_unit: Decimal) -> Decimal {
    round_amount(quantity * price_per_unit)
}
