//! Batch payload sent to the workflow webhook when a draft is submitted

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{round_amount, Draft, DraftKind, LineItem};
use crate::types::{ItemType, StockSource, Unit};

/// One submitted draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    #[serde(rename = "type")]
    pub batch_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    pub total_items: usize,
    pub total_amount: Decimal,
    pub items: Vec<BatchItem>,
    pub created_at: DateTime<Utc>,
}

/// Line of a batch payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<StockSource>,
}

impl BatchPayload {
    /// Build the payload for a draft.
    ///
    /// Unloading lines always carry a source; a missing one means today's
    /// purchases.
    pub fn from_draft(draft: &Draft, created_at: DateTime<Utc>) -> Self {
        let total: Decimal = draft.items.iter().map(|item| item.total_amount).sum();
        let items = draft
            .items
            .iter()
            .map(|item| BatchItem::from_line(item, draft.kind))
            .collect();

        let (store_name, location_name) = match draft.kind {
            DraftKind::Unloading => (Some(draft.key.clone()), None),
            DraftKind::Purchase => (None, Some(draft.key.clone())),
        };

        Self {
            batch_type: draft.kind.item_type(),
            store_name,
            location_name,
            total_items: draft.items.len(),
            total_amount: round_amount(total),
            items,
            created_at,
        }
    }

    /// Name of the store or location this batch belongs to
    pub fn key(&self) -> Option<&str> {
        self.store_name
            .as_deref()
            .or(self.location_name.as_deref())
    }
}

impl BatchItem {
    fn from_line(item: &LineItem, kind: DraftKind) -> Self {
        let source = match kind {
            DraftKind::Unloading => Some(item.source.clone().unwrap_or(StockSource::Purchase)),
            DraftKind::Purchase => None,
        };
        Self {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit: item.unit,
            price_per_unit: item.price_per_unit,
            total_amount: item.total_amount,
            timestamp: item.timestamp,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(name: &str, total: &str, source: Option<StockSource>) -> LineItem {
        LineItem {
            id: LineItem::new_id(),
            product_name: name.to_string(),
            quantity: Decimal::ONE,
            unit: Unit::Piece,
            price_per_unit: Decimal::from_str(total).unwrap(),
            total_amount: Decimal::from_str(total).unwrap(),
            location: "Гравітон".to_string(),
            timestamp: Utc::now(),
            item_type: ItemType::Unloading,
            source,
            updated_at: None,
        }
    }

    #[test]
    fn test_unloading_payload_defaults_source() {
        let mut draft = Draft::new(DraftKind::Unloading, "Гравітон");
        draft.items.push(item("Лимон", "10.10", None));
        draft.items.push(item(
            "Картопля",
            "5.205",
            Some(StockSource::Warehouse("Склад№2".to_string())),
        ));

        let payload = BatchPayload::from_draft(&draft, Utc::now());
        assert_eq!(payload.batch_type, ItemType::Unloading);
        assert_eq!(payload.key(), Some("Гравітон"));
        assert_eq!(payload.total_items, 2);
        assert_eq!(payload.total_amount, Decimal::from_str("15.31").unwrap());
        assert_eq!(payload.items[0].source, Some(StockSource::Purchase));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["storeName"], "Гравітон");
        assert_eq!(json["items"][1]["source"], "Склад№2");
    }

    #[test]
    fn test_purchase_payload_has_no_source() {
        let mut draft = Draft::new(DraftKind::Purchase, "Метро");
        draft.items.push(item("Кава", "99", None));

        let json = serde_json::to_value(BatchPayload::from_draft(&draft, Utc::now())).unwrap();
        assert_eq!(json["type"], "Purchase");
        assert_eq!(json["locationName"], "Метро");
        assert!(json["items"][0].get("source").is_none());
    }
}
