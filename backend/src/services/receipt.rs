//! Receipt scanning: recognised candidates become purchase draft items

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{normalize_receipt_candidate, Draft, DraftKind, ItemType, LineItem};
use std::sync::Arc;

use crate::error::AppResult;
use crate::services::DraftService;
use crate::store::DocumentStore;

/// Receipt image as sent by the browser
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptImage {
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Base64 without the data-URL prefix
    pub data_base64: String,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

/// Turns a receipt photo into raw line candidates
#[async_trait]
pub trait ReceiptRecognizer: Send + Sync {
    async fn recognize(&self, image: &ReceiptImage) -> AppResult<Vec<Value>>;
}

/// Normalised candidates, ready for operator review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedReceipt {
    pub location: String,
    pub items: Vec<LineItem>,
    /// Candidates dropped for an unusable name, quantity or price
    pub rejected: usize,
}

#[derive(Clone)]
pub struct ReceiptService {
    store: DocumentStore,
    recognizer: Arc<dyn ReceiptRecognizer>,
    location: String,
}

impl ReceiptService {
    pub fn new(
        store: DocumentStore,
        recognizer: Arc<dyn ReceiptRecognizer>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            store,
            recognizer,
            location: location.into(),
        }
    }

    pub async fn scan(&self, image: &ReceiptImage) -> AppResult<ScannedReceipt> {
        let candidates = self.recognizer.recognize(image).await?;
        let now = Utc::now();

        let mut items = Vec::with_capacity(candidates.len());
        let mut rejected = 0;
        for candidate in &candidates {
            match normalize_receipt_candidate(candidate, &self.location, now) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Dropping receipt line: {}", e);
                    rejected += 1;
                }
            }
        }

        tracing::info!("Receipt recognised: {} items, {} rejected", items.len(), rejected);
        Ok(ScannedReceipt {
            location: self.location.clone(),
            items,
            rejected,
        })
    }

    /// Add reviewed items to the purchase draft of the receipt location,
    /// stopping at the first rejection.
    pub async fn confirm(&self, items: Vec<LineItem>) -> AppResult<Draft> {
        let drafts = DraftService::new(self.store.clone(), DraftKind::Purchase);
        let mut draft = drafts.get_draft(&self.location).await;
        for mut item in items {
            item.location = self.location.clone();
            item.item_type = ItemType::Purchase;
            draft = drafts.add_item_to_draft(&self.location, item).await?;
        }
        Ok(draft)
    }
}
