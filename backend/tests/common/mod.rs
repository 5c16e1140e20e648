//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shared::{BatchPayload, ItemType, LineItem, StockSource, Unit};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use delivery_tracker::services::{ReceiptImage, ReceiptRecognizer, SubmissionEndpoint};
use delivery_tracker::store::{DocumentStore, MemoryMedium, StorageOptions};
use delivery_tracker::{AppError, AppResult};

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Run a future to completion inside a proptest body
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Store degraded onto an in-memory fallback medium
pub async fn memory_store() -> (Arc<MemoryMedium>, DocumentStore) {
    let medium = Arc::new(MemoryMedium::new());
    let store = DocumentStore::open(StorageOptions::fallback_only(medium.clone())).await;
    (medium, store)
}

/// Store on an in-memory SQLite primary
pub async fn sqlite_store() -> DocumentStore {
    let medium = Arc::new(MemoryMedium::new());
    DocumentStore::open(StorageOptions::with_primary("sqlite::memory:", medium)).await
}

/// Store with no reachable medium
pub async fn failed_store() -> DocumentStore {
    DocumentStore::open(StorageOptions::fallback_only(Arc::new(
        MemoryMedium::unavailable(),
    )))
    .await
}

pub fn item(name: &str, quantity: &str, unit: Unit, item_type: ItemType) -> LineItem {
    let quantity = dec(quantity);
    let price = dec("10");
    LineItem {
        id: LineItem::new_id(),
        product_name: name.to_string(),
        quantity,
        unit,
        price_per_unit: price,
        total_amount: shared::line_total(quantity, price),
        location: "Садова".to_string(),
        timestamp: Utc::now(),
        item_type,
        source: None,
        updated_at: None,
    }
}

pub fn unloading(name: &str, quantity: &str) -> LineItem {
    item(name, quantity, Unit::Kg, ItemType::Unloading)
}

pub fn purchase(name: &str, quantity: &str) -> LineItem {
    item(name, quantity, Unit::Kg, ItemType::Purchase)
}

pub fn from_warehouse(mut item: LineItem, warehouse: &str) -> LineItem {
    item.source = Some(StockSource::Warehouse(warehouse.to_string()));
    item
}

// ============================================================================
// Fake collaborators
// ============================================================================

/// Records what it receives; can be switched to reject everything
#[derive(Default)]
pub struct FakeEndpoint {
    failing: AtomicBool,
    pub batches: Mutex<Vec<BatchPayload>>,
    pub items: Mutex<Vec<LineItem>>,
}

impl FakeEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let endpoint = Self::default();
        endpoint.failing.store(true, Ordering::SeqCst);
        Arc::new(endpoint)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::SubmissionFailed("HTTP 500".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionEndpoint for FakeEndpoint {
    async fn send_batch(&self, payload: &BatchPayload) -> AppResult<Value> {
        self.check()?;
        self.batches.lock().unwrap().push(payload.clone());
        Ok(json!({ "status": "ok" }))
    }

    async fn send_item(&self, item: &LineItem) -> AppResult<Value> {
        self.check()?;
        self.items.lock().unwrap().push(item.clone());
        Ok(json!({ "status": "ok" }))
    }
}

/// Returns a fixed list of candidates
pub struct FakeRecognizer {
    pub candidates: Vec<Value>,
}

#[async_trait]
impl ReceiptRecognizer for FakeRecognizer {
    async fn recognize(&self, _image: &ReceiptImage) -> AppResult<Vec<Value>> {
        Ok(self.candidates.clone())
    }
}
