//! History log of committed line items, and the audit trail reader

use shared::{AuditEntry, LineItem};

use crate::error::AppResult;
use crate::services::InventoryService;
use crate::store::{Collection, DocumentStore};

pub const DEFAULT_AUDIT_LIMIT: usize = 100;

#[derive(Clone)]
pub struct HistoryService {
    store: DocumentStore,
}

impl HistoryService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Append a committed item. An empty id is replaced with a fresh one.
    pub async fn add_to_history(&self, mut item: LineItem) -> AppResult<LineItem> {
        if item.id.is_empty() {
            item.id = LineItem::new_id();
        }

        self.store.put_record(Collection::History, &item).await?;
        self.store
            .log_action(
                "add_history",
                format!("{}: {} {} {}", item.item_type, item.product_name, item.quantity, item.unit),
            )
            .await;

        Ok(item)
    }

    /// Newest first, at most `limit` when given. Never fails.
    pub async fn get_history(&self, limit: Option<usize>) -> Vec<LineItem> {
        let mut items: Vec<LineItem> = match self.store.get_all_records(Collection::History).await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Error reading history: {}", e);
                return Vec::new();
            }
        };

        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        items
    }

    pub async fn clear_history(&self) -> AppResult<()> {
        self.store.clear(Collection::History).await?;
        self.store.log_action("clear_history", "History cleared").await;
        Ok(())
    }

    /// Clear the inventory ledger, then history. Stock never outlives the
    /// history entries that explain it.
    pub async fn end_of_day_reset(&self, inventory: &InventoryService) -> AppResult<()> {
        inventory.clear_daily_stock().await?;
        self.clear_history().await
    }

    pub async fn get_audit_log(&self, limit: usize) -> AppResult<Vec<AuditEntry>> {
        Ok(self.store.audit_entries(limit).await?)
    }
}
