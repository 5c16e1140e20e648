//! Common types used across the tracker

use serde::{Deserialize, Serialize};

/// Unit of measure for a product movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Piece,
    Pack,
    Box,
    Bunch,
    Other,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Kg,
        Unit::Piece,
        Unit::Pack,
        Unit::Box,
        Unit::Bunch,
        Unit::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Piece => "piece",
            Unit::Pack => "pack",
            Unit::Box => "box",
            Unit::Bunch => "bunch",
            Unit::Other => "other",
        }
    }

    /// Display label shown to staff
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Kg => "кг",
            Unit::Piece => "шт",
            Unit::Pack => "упаковка",
            Unit::Box => "ящик",
            Unit::Bunch => "пучок",
            Unit::Other => "інше",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "kg" => Some(Unit::Kg),
            "piece" => Some(Unit::Piece),
            "pack" => Some(Unit::Pack),
            "box" => Some(Unit::Box),
            "bunch" => Some(Unit::Bunch),
            "other" => Some(Unit::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of product movement.
///
/// Records written by older builds of the frontend carry the Ukrainian labels,
/// which are accepted on read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ItemType {
    #[default]
    #[serde(alias = "Закупка")]
    Purchase,
    #[serde(alias = "Відвантаження")]
    Unloading,
    #[serde(alias = "Доставка")]
    Delivery,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Purchase => "Purchase",
            ItemType::Unloading => "Unloading",
            ItemType::Delivery => "Delivery",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where unloaded stock comes from: today's purchases or a named warehouse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StockSource {
    Purchase,
    Warehouse(String),
}

impl StockSource {
    pub const PURCHASE: &'static str = "purchase";

    pub fn is_purchase(&self) -> bool {
        matches!(self, StockSource::Purchase)
    }
}

impl From<String> for StockSource {
    fn from(value: String) -> Self {
        if value == Self::PURCHASE {
            StockSource::Purchase
        } else {
            StockSource::Warehouse(value)
        }
    }
}

impl From<StockSource> for String {
    fn from(value: StockSource) -> Self {
        match value {
            StockSource::Purchase => StockSource::PURCHASE.to_string(),
            StockSource::Warehouse(name) => name,
        }
    }
}

impl std::fmt::Display for StockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockSource::Purchase => f.write_str(Self::PURCHASE),
            StockSource::Warehouse(name) => f.write_str(name),
        }
    }
}
