//! Submission coordinator: sends drafts and direct saves to the workflow
//! webhook and reconciles history and inventory afterwards.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shared::{is_warehouse_source, BatchPayload, Draft, DraftKind, ItemType, LineItem, StockSource};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::services::{DraftService, HistoryService, InventoryService};
use crate::store::DocumentStore;

/// Remote endpoint receiving submitted batches and direct saves
#[async_trait]
pub trait SubmissionEndpoint: Send + Sync {
    async fn send_batch(&self, payload: &BatchPayload) -> AppResult<Value>;

    async fn send_item(&self, item: &LineItem) -> AppResult<Value>;
}

/// Result of a successful draft submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub key: String,
    pub total_items: usize,
    pub total_amount: Decimal,
    /// Parsed body returned by the endpoint
    pub response: Value,
}

/// Result of saving an item without a draft
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSaveOutcome {
    pub item: LineItem,
    /// False when the item was only saved locally
    pub sent: bool,
}

#[derive(Clone)]
pub struct SubmissionService {
    store: DocumentStore,
    inventory: InventoryService,
    history: HistoryService,
    endpoint: Arc<dyn SubmissionEndpoint>,
}

impl SubmissionService {
    pub fn new(store: DocumentStore, endpoint: Arc<dyn SubmissionEndpoint>) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            history: HistoryService::new(store.clone()),
            store,
            endpoint,
        }
    }

    /// Use a ledger with a custom warehouse list
    pub fn with_inventory(mut self, inventory: InventoryService) -> Self {
        self.inventory = inventory;
        self
    }

    fn drafts(&self, kind: DraftKind) -> DraftService {
        DraftService::new(self.store.clone(), kind)
    }

    // ========================================================================
    // Draft submission
    // ========================================================================

    /// Send a draft, then record it locally and drop the sent items.
    ///
    /// Nothing local changes unless the endpoint accepted the batch, so a
    /// failed submission can be retried as is. Items added while the batch
    /// was in flight stay in the draft for the next submission.
    pub async fn submit_draft(&self, kind: DraftKind, key: &str) -> AppResult<SubmissionReceipt> {
        let drafts = self.drafts(kind);
        let draft = drafts.get_draft(key).await;
        if draft.is_empty() {
            return Err(AppError::EmptyDraft(key.to_string()));
        }

        let payload = BatchPayload::from_draft(&draft, Utc::now());
        let response = self.endpoint.send_batch(&payload).await?;
        tracing::info!("Submitted {} draft {} ({} items)", kind, key, payload.total_items);

        self.reconcile(&draft).await;

        let sent_ids: Vec<String> = draft.items.iter().map(|item| item.id.clone()).collect();
        match drafts.settle_submitted(key, &sent_ids).await {
            Ok(0) => {}
            Ok(kept) => tracing::info!("{} items added to {} during submission kept", kept, key),
            Err(e) => tracing::error!("Submitted draft {} could not be settled: {}", key, e),
        }

        Ok(SubmissionReceipt {
            key: key.to_string(),
            total_items: payload.total_items,
            total_amount: payload.total_amount,
            response,
        })
    }

    pub async fn submit_unloading_draft(&self, store_name: &str) -> AppResult<SubmissionReceipt> {
        self.submit_draft(DraftKind::Unloading, store_name).await
    }

    pub async fn submit_purchase_draft(&self, location_name: &str) -> AppResult<SubmissionReceipt> {
        self.submit_draft(DraftKind::Purchase, location_name).await
    }

    /// Copy a sent draft into history and move stock. The batch is already
    /// accepted remotely, so local failures are only logged.
    async fn reconcile(&self, draft: &Draft) {
        for item in &draft.items {
            if let Err(e) = self.history.add_to_history(item.clone()).await {
                tracing::error!("Failed to record {} in history: {}", item.product_name, e);
            }

            let moved = match draft.kind {
                DraftKind::Purchase => Some(
                    self.inventory
                        .add_stock(&item.product_name, item.quantity, item.unit)
                        .await,
                ),
                DraftKind::Unloading if item.draws_on_purchases() => Some(
                    self.inventory
                        .remove_stock(&item.product_name, item.quantity, item.unit)
                        .await,
                ),
                DraftKind::Unloading => None,
            };
            if let Some(Err(e)) = moved {
                tracing::error!("Failed to update stock of {}: {}", item.product_name, e);
            }
        }
    }

    // ========================================================================
    // Operator-facing unloading adds
    // ========================================================================

    /// Settle the source of an unloading item.
    ///
    /// Warehouse products need an explicit source; everything else must be
    /// covered by today's purchases and draws on them.
    async fn resolve_source(&self, item: &mut LineItem) -> AppResult<()> {
        if self.inventory.is_warehouse_product(&item.product_name) {
            match &item.source {
                None => {
                    return Err(AppError::Validation {
                        field: "source".to_string(),
                        message: "A stock source must be chosen for warehouse products".to_string(),
                    })
                }
                Some(StockSource::Warehouse(name)) if !is_warehouse_source(name) => {
                    return Err(AppError::Validation {
                        field: "source".to_string(),
                        message: format!("Unknown warehouse '{}'", name),
                    })
                }
                Some(_) => return Ok(()),
            }
        }

        let check = self
            .inventory
            .check_availability(&item.product_name, item.quantity, item.unit)
            .await;
        if !check.available {
            return Err(AppError::InsufficientStock {
                product: item.product_name.clone(),
                available: check.stock,
                requested: check.requested,
            });
        }
        item.source = Some(StockSource::Purchase);
        Ok(())
    }

    pub async fn add_unloading_item(&self, store_name: &str, mut item: LineItem) -> AppResult<Draft> {
        item.item_type = ItemType::Unloading;
        self.resolve_source(&mut item).await?;
        self.drafts(DraftKind::Unloading)
            .add_item_to_draft(store_name, item)
            .await
    }

    pub async fn update_unloading_item(
        &self,
        store_name: &str,
        item_id: &str,
        mut item: LineItem,
    ) -> AppResult<Option<Draft>> {
        item.item_type = ItemType::Unloading;
        self.resolve_source(&mut item).await?;
        self.drafts(DraftKind::Unloading)
            .update_item_in_draft(store_name, item_id, item)
            .await
    }

    // ========================================================================
    // Direct saves
    // ========================================================================

    /// Save a purchase or delivery without a draft: history first, stock for
    /// purchases, then a best-effort send.
    pub async fn save_direct(&self, item: LineItem) -> AppResult<DirectSaveOutcome> {
        if item.item_type == ItemType::Unloading {
            return Err(AppError::Validation {
                field: "type".to_string(),
                message: "Unloadings are submitted through a draft".to_string(),
            });
        }

        let item = self.history.add_to_history(item).await?;

        if item.item_type == ItemType::Purchase {
            self.inventory
                .add_stock(&item.product_name, item.quantity, item.unit)
                .await?;
        }

        let sent = match self.endpoint.send_item(&item).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Server unavailable, {} saved locally only: {}", item.product_name, e);
                false
            }
        };

        Ok(DirectSaveOutcome { item, sent })
    }
}
