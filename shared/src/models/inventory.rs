//! Inventory ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Unit;

/// Composite key of a stock record: `productName_unit`
pub fn stock_key(product_name: &str, unit: Unit) -> String {
    format!("{}_{}", product_name, unit.as_str())
}

/// Running balance of today's purchased stock for one (product, unit) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub key: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub unit: Unit,
    /// Never negative
    pub quantity: Decimal,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StockRecord {
    /// Zero-valued record for a pair that has not been seen yet
    pub fn empty(product_name: &str, unit: Unit) -> Self {
        Self {
            key: stock_key(product_name, unit),
            product_name: product_name.to_string(),
            unit,
            quantity: Decimal::ZERO,
            last_updated: None,
        }
    }

    /// Increase the balance
    pub fn credit(&mut self, quantity: Decimal, at: DateTime<Utc>) -> Decimal {
        self.quantity += quantity;
        self.last_updated = Some(at);
        self.quantity
    }

    /// Decrease the balance, clamping at zero
    pub fn debit(&mut self, quantity: Decimal, at: DateTime<Utc>) -> Decimal {
        self.quantity = (self.quantity - quantity).max(Decimal::ZERO);
        self.last_updated = Some(at);
        self.quantity
    }
}

/// Outcome of an availability check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: bool,
    pub stock: Decimal,
    pub requested: Decimal,
    pub shortage: Decimal,
}

impl Availability {
    /// Compare a requested quantity against the current balance
    pub fn evaluate(stock: Decimal, requested: Decimal) -> Self {
        let available = stock >= requested;
        Self {
            available,
            stock,
            requested,
            shortage: if available {
                Decimal::ZERO
            } else {
                requested - stock
            },
        }
    }

    /// Warehouse products are not tracked; their source is chosen by hand
    pub fn untracked(requested: Decimal) -> Self {
        Self {
            available: true,
            stock: Decimal::ZERO,
            requested,
            shortage: Decimal::ZERO,
        }
    }

    /// Reported when the ledger could not be read
    pub fn unknown(requested: Decimal) -> Self {
        Self {
            available: false,
            stock: Decimal::ZERO,
            requested,
            shortage: requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_key() {
        assert_eq!(stock_key("Картопля", Unit::Kg), "Картопля_kg");
        assert_eq!(stock_key("Кава", Unit::Pack), "Кава_pack");
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        let mut record = StockRecord::empty("Potato", Unit::Kg);
        record.credit(Decimal::from(10), Utc::now());
        let left = record.debit(Decimal::from(15), Utc::now());
        assert_eq!(left, Decimal::ZERO);
        assert_eq!(record.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_availability_shortage() {
        let check = Availability::evaluate(Decimal::from(3), Decimal::from(5));
        assert!(!check.available);
        assert_eq!(check.shortage, Decimal::from(2));

        let check = Availability::evaluate(Decimal::from(5), Decimal::from(5));
        assert!(check.available);
        assert_eq!(check.shortage, Decimal::ZERO);
    }
}
