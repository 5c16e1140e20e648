//! WebAssembly module for the delivery tracker frontend
//!
//! Provides client-side computation for:
//! - Input sanitation and form validation
//! - Line totals
//! - Receipt candidate normalization
//! - Warehouse product lookups

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("delivery tracker wasm ready"));
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptItems {
    items: Vec<LineItem>,
    rejected: usize,
}

fn js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

/// Validate a form submission into a line item, as JSON
fn build_line_item(input_json: &str) -> Result<String, String> {
    let input: LineItemInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid item JSON: {}", e))?;
    let item = input.into_line_item(Utc::now()).map_err(|e| e.to_string())?;
    serde_json::to_string(&item).map_err(|e| e.to_string())
}

fn normalize_receipt(candidates_json: &str, location: &str) -> Result<String, String> {
    let candidates: Vec<Value> = serde_json::from_str(candidates_json)
        .map_err(|e| format!("Invalid receipt JSON: {}", e))?;

    let now = Utc::now();
    let mut items = Vec::with_capacity(candidates.len());
    let mut rejected = 0;
    for candidate in &candidates {
        match normalize_receipt_candidate(candidate, location, now) {
            Ok(item) => items.push(item),
            Err(_) => rejected += 1,
        }
    }

    serde_json::to_string(&ReceiptItems { items, rejected }).map_err(|e| e.to_string())
}

/// Escape markup and strip script patterns from a text field
#[wasm_bindgen]
pub fn sanitize_input(input: &str) -> String {
    sanitize_string(input)
}

/// Validation message for a product name, or `None` when valid
#[wasm_bindgen]
pub fn check_product_name(name: &str) -> Option<String> {
    validate_product_name(name).err().map(str::to_string)
}

#[wasm_bindgen]
pub fn check_location(location: &str) -> Option<String> {
    validate_location(location).err().map(str::to_string)
}

#[wasm_bindgen]
pub fn check_quantity(quantity: f64) -> Option<String> {
    validate_quantity(to_decimal(quantity)).err().map(str::to_string)
}

#[wasm_bindgen]
pub fn check_price(price: f64) -> Option<String> {
    validate_price(to_decimal(price)).err().map(str::to_string)
}

/// quantity × price, rounded to 2 decimals
#[wasm_bindgen]
pub fn calculate_line_total(quantity: f64, price_per_unit: f64) -> f64 {
    to_f64(line_total(to_decimal(quantity), to_decimal(price_per_unit)))
}

/// Validate and stamp a line item from form JSON
#[wasm_bindgen]
pub fn create_line_item(input_json: &str) -> Result<String, JsValue> {
    build_line_item(input_json).map_err(js_error)
}

/// Normalize recognised receipt lines into `{ items, rejected }`
#[wasm_bindgen]
pub fn normalize_receipt_items(candidates_json: &str, location: &str) -> Result<String, JsValue> {
    normalize_receipt(candidates_json, location).map_err(js_error)
}

#[wasm_bindgen]
pub fn is_warehouse(product_name: &str) -> bool {
    shared::is_warehouse_product(product_name)
}

#[wasm_bindgen]
pub fn warehouse_products() -> js_sys::Array {
    shared::WAREHOUSE_PRODUCTS
        .iter()
        .map(|p| JsValue::from_str(p))
        .collect()
}

/// Ledger key for a product and unit (`kg`, `piece`, ...)
#[wasm_bindgen]
pub fn inventory_key(product_name: &str, unit: &str) -> Option<String> {
    Unit::parse(unit).map(|unit| stock_key(product_name, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_rounds() {
        assert!((calculate_line_total(3.0, 0.125) - 0.38).abs() < 0.0001);
        assert!((calculate_line_total(0.5, 41.0) - 20.5).abs() < 0.0001);
    }

    #[test]
    fn test_field_checks() {
        assert!(check_product_name("Помідори").is_none());
        assert!(check_product_name("   ").is_some());
        assert!(check_location(&"x".repeat(101)).is_some());
        assert!(check_quantity(0.0).is_some());
        assert!(check_quantity(10_001.0).is_some());
        assert!(check_price(0.0).is_none());
        assert!(check_price(-1.0).is_some());
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("  <b>Мед</b> "), "&lt;b&gt;Мед&lt;/b&gt;");
    }

    #[test]
    fn test_build_line_item() {
        let json = r#"{"productName":"Огірки","quantity":2,"unit":"kg","pricePerUnit":35,"location":"Садова","type":"Purchase"}"#;
        let item: LineItem = serde_json::from_str(&build_line_item(json).unwrap()).unwrap();
        assert_eq!(item.total_amount, Decimal::from(70));
        assert!(!item.id.is_empty());

        let invalid = r#"{"productName":"","quantity":2,"unit":"kg","location":"Садова"}"#;
        assert!(build_line_item(invalid).unwrap_err().starts_with("productName"));
    }

    #[test]
    fn test_normalize_receipt() {
        let json = r#"[{"productName":"Молоко","quantity":"2","pricePerUnit":40},{"productName":"","quantity":1}]"#;
        let out: Value = serde_json::from_str(&normalize_receipt(json, "Метро").unwrap()).unwrap();
        assert_eq!(out["rejected"], 1);
        assert_eq!(out["items"][0]["location"], "Метро");
        assert_eq!(out["items"][0]["unit"], "piece");
    }

    #[test]
    fn test_warehouse_lookup() {
        assert!(is_warehouse("Картопля"));
        assert!(!is_warehouse("Помідори"));
        assert_eq!(inventory_key("Мед", "piece").as_deref(), Some("Мед_piece"));
        assert!(inventory_key("Мед", "barrel").is_none());
    }
}
