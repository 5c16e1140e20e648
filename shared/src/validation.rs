//! Input sanitation and validation for line items
//!
//! Everything an operator types, and everything the receipt recognizer
//! returns, passes through here before it becomes a [`LineItem`].

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{line_total, LineItem};
use crate::types::{ItemType, StockSource, Unit};

pub const MAX_TEXT_LENGTH: usize = 100;
pub const MAX_QUANTITY: u32 = 10_000;
pub const MAX_PRICE: u32 = 100_000;

/// A field that failed validation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

// ============================================================================
// Sanitation
// ============================================================================

static DANGEROUS_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript:|on[a-z0-9_]+\s*=|data:text/html").expect("static pattern")
});

/// Escape markup and strip script-injection patterns from free text
pub fn sanitize_string(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    DANGEROUS_PATTERNS
        .replace_all(&escaped, "")
        .trim()
        .to_string()
}

// ============================================================================
// Field Validations
// ============================================================================

fn validate_text(value: &str) -> Result<(), &'static str> {
    let length = sanitize_string(value).chars().count();
    if length == 0 {
        return Err("Must not be empty");
    }
    if length > MAX_TEXT_LENGTH {
        return Err("Must be at most 100 characters");
    }
    Ok(())
}

/// Product name: 1-100 characters after sanitation
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    validate_text(name)
}

/// Location: 1-100 characters after sanitation
pub fn validate_location(location: &str) -> Result<(), &'static str> {
    validate_text(location)
}

/// Quantity must be positive and at most 10000
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    if quantity > Decimal::from(MAX_QUANTITY) {
        return Err("Quantity must be at most 10000");
    }
    Ok(())
}

/// Price per unit must be between 0 and 100000
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO || price > Decimal::from(MAX_PRICE) {
        return Err("Price must be between 0 and 100000");
    }
    Ok(())
}

// ============================================================================
// Line Item Construction
// ============================================================================

/// Operator input for a new line item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    #[serde(default)]
    pub price_per_unit: Decimal,
    pub location: String,
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub source: Option<StockSource>,
}

impl LineItemInput {
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_product_name(&self.product_name)
            .map_err(|m| FieldError::new("productName", m))?;
        validate_quantity(self.quantity).map_err(|m| FieldError::new("quantity", m))?;
        validate_price(self.price_per_unit).map_err(|m| FieldError::new("pricePerUnit", m))?;
        validate_location(&self.location).map_err(|m| FieldError::new("location", m))?;
        Ok(())
    }

    /// Validate, sanitize and stamp a fresh line item
    pub fn into_line_item(self, at: DateTime<Utc>) -> Result<LineItem, FieldError> {
        self.validate()?;
        Ok(LineItem {
            id: LineItem::new_id(),
            product_name: sanitize_string(&self.product_name),
            quantity: self.quantity,
            unit: self.unit,
            price_per_unit: self.price_per_unit,
            total_amount: line_total(self.quantity, self.price_per_unit),
            location: sanitize_string(&self.location),
            timestamp: at,
            item_type: self.item_type,
            source: self.source,
            updated_at: None,
        })
    }
}

// ============================================================================
// Receipt Candidates
// ============================================================================

/// Parse a number the way a lenient form field would: numbers pass through,
/// numeric strings are parsed (comma decimals accepted), anything else is 0.
fn lenient_decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .and_then(|f| Decimal::try_from(f).ok())
            .unwrap_or(Decimal::ZERO),
        Some(Value::String(s)) => {
            Decimal::from_str(&s.trim().replace(',', ".")).unwrap_or(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    }
}

fn lenient_unit(value: Option<&Value>) -> Unit {
    match value.and_then(Value::as_str).map(str::trim) {
        None | Some("") => Unit::Piece,
        Some(s) => Unit::parse(s)
            .or_else(|| Unit::ALL.into_iter().find(|u| u.label() == s))
            .unwrap_or(Unit::Other),
    }
}

/// Turn one raw receipt-recognition candidate into a purchase line item.
///
/// Candidates without a usable name or with a quantity outside (0, 10000]
/// are rejected.
pub fn normalize_receipt_candidate(
    candidate: &Value,
    location: &str,
    at: DateTime<Utc>,
) -> Result<LineItem, FieldError> {
    let product_name = sanitize_string(
        candidate
            .get("productName")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );
    validate_product_name(&product_name).map_err(|m| FieldError::new("productName", m))?;

    let quantity = lenient_decimal(candidate.get("quantity"));
    validate_quantity(quantity).map_err(|m| FieldError::new("quantity", m))?;

    let price_per_unit = lenient_decimal(candidate.get("pricePerUnit"));
    validate_price(price_per_unit).map_err(|m| FieldError::new("pricePerUnit", m))?;

    Ok(LineItem {
        id: LineItem::new_id(),
        product_name,
        quantity,
        unit: lenient_unit(candidate.get("unit")),
        price_per_unit,
        total_amount: line_total(quantity, price_per_unit),
        location: location.to_string(),
        timestamp: at,
        item_type: ItemType::Purchase,
        source: None,
        updated_at: None,
    })
}
