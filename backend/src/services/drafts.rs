//! Draft collections: one open draft per store (unloading) or location (purchase)

use chrono::Utc;
use shared::{Draft, DraftDocument, DraftKind, DraftSummary, LineItem};

use crate::error::AppResult;
use crate::store::{Collection, DocumentStore};

/// Audit tags written by each draft family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftActions {
    pub add: &'static str,
    pub update: &'static str,
    pub remove: &'static str,
    pub delete_empty: &'static str,
    pub delete: &'static str,
}

const UNLOADING_ACTIONS: DraftActions = DraftActions {
    add: "add_draft_item",
    update: "update_draft_item",
    remove: "remove_draft_item",
    delete_empty: "delete_empty_draft",
    delete: "delete_draft",
};

const PURCHASE_ACTIONS: DraftActions = DraftActions {
    add: "add_purchase_draft_item",
    update: "update_purchase_draft_item",
    remove: "remove_purchase_draft_item",
    delete_empty: "delete_empty_purchase_draft",
    delete: "delete_purchase_draft",
};

/// Collection holding drafts of `kind`
pub fn draft_collection(kind: DraftKind) -> Collection {
    match kind {
        DraftKind::Unloading => Collection::UnloadingDrafts,
        DraftKind::Purchase => Collection::PurchaseDrafts,
    }
}

pub fn draft_actions(kind: DraftKind) -> DraftActions {
    match kind {
        DraftKind::Unloading => UNLOADING_ACTIONS,
        DraftKind::Purchase => PURCHASE_ACTIONS,
    }
}

/// Draft manager for one draft family
#[derive(Clone)]
pub struct DraftService {
    store: DocumentStore,
    kind: DraftKind,
}

impl DraftService {
    pub fn new(store: DocumentStore, kind: DraftKind) -> Self {
        Self { store, kind }
    }

    pub fn unloading(store: DocumentStore) -> Self {
        Self::new(store, DraftKind::Unloading)
    }

    pub fn purchase(store: DocumentStore) -> Self {
        Self::new(store, DraftKind::Purchase)
    }

    pub fn kind(&self) -> DraftKind {
        self.kind
    }

    fn collection(&self) -> Collection {
        draft_collection(self.kind)
    }

    fn actions(&self) -> DraftActions {
        draft_actions(self.kind)
    }

    /// Persisted draft, if any. Store failures propagate.
    async fn load_draft(&self, key: &str) -> AppResult<Option<Draft>> {
        let document: Option<DraftDocument> =
            self.store.get_record(self.collection(), key).await?;
        Ok(document.and_then(|doc| Draft::from_document(self.kind, doc, Some(key))))
    }

    /// The persisted draft, or a fresh unsaved one. Never fails.
    pub async fn get_draft(&self, key: &str) -> Draft {
        match self.load_draft(key).await {
            Ok(Some(draft)) => draft,
            Ok(None) => Draft::new(self.kind, key),
            Err(e) => {
                tracing::error!("Error reading {} draft {}: {}", self.kind, key, e);
                Draft::new(self.kind, key)
            }
        }
    }

    /// Append an item, creating the draft on first use
    pub async fn add_item_to_draft(&self, key: &str, item: LineItem) -> AppResult<Draft> {
        let _guard = self.store.lock(self.collection(), key).await;

        let mut draft = self
            .load_draft(key)
            .await?
            .unwrap_or_else(|| Draft::new(self.kind, key));

        let product_name = item.product_name.clone();
        draft.push_item(item, Utc::now())?;

        self.store.put_record(self.collection(), &draft).await?;
        self.store
            .log_action(self.actions().add, format!("{}: {}", key, product_name))
            .await;

        Ok(draft)
    }

    /// Replace an item's content, keeping its id and creation timestamp.
    /// `None` when the draft or the item does not exist.
    pub async fn update_item_in_draft(
        &self,
        key: &str,
        item_id: &str,
        edit: LineItem,
    ) -> AppResult<Option<Draft>> {
        let _guard = self.store.lock(self.collection(), key).await;

        let Some(mut draft) = self.load_draft(key).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let product_name = edit.product_name.clone();
        let Some(item) = draft.find_item_mut(item_id) else {
            return Ok(None);
        };
        item.apply_edit(edit, now);
        draft.updated_at = Some(now);

        self.store.put_record(self.collection(), &draft).await?;
        self.store
            .log_action(self.actions().update, format!("{}: {}", key, product_name))
            .await;

        Ok(Some(draft))
    }

    /// Remove an item. Removing the last item deletes the draft record.
    /// `None` when the draft or the item does not exist.
    pub async fn remove_item_from_draft(
        &self,
        key: &str,
        item_id: &str,
    ) -> AppResult<Option<Draft>> {
        let _guard = self.store.lock(self.collection(), key).await;

        let Some(mut draft) = self.load_draft(key).await? else {
            return Ok(None);
        };
        if !draft.remove_item(item_id, Utc::now()) {
            return Ok(None);
        }

        if draft.is_empty() {
            self.store.delete(self.collection(), key).await?;
            self.store.log_action(self.actions().delete_empty, key).await;
        } else {
            self.store.put_record(self.collection(), &draft).await?;
            self.store
                .log_action(self.actions().remove, format!("{}: item {}", key, item_id))
                .await;
        }

        Ok(Some(draft))
    }

    /// Drop the items a submission carried, keeping any added meanwhile.
    /// The record goes only once nothing is left. Returns the kept items.
    pub async fn settle_submitted(&self, key: &str, sent_ids: &[String]) -> AppResult<usize> {
        let _guard = self.store.lock(self.collection(), key).await;

        let Some(mut draft) = self.load_draft(key).await? else {
            return Ok(0);
        };
        draft.items.retain(|item| !sent_ids.contains(&item.id));

        if draft.is_empty() {
            self.store.delete(self.collection(), key).await?;
            self.store.log_action(self.actions().delete, key).await;
        } else {
            draft.updated_at = Some(Utc::now());
            self.store.put_record(self.collection(), &draft).await?;
            self.store
                .log_action(
                    self.actions().remove,
                    format!("{}: {} submitted, {} kept", key, sent_ids.len(), draft.items.len()),
                )
                .await;
        }

        Ok(draft.items.len())
    }

    pub async fn delete_draft(&self, key: &str) -> AppResult<()> {
        let _guard = self.store.lock(self.collection(), key).await;
        self.store.delete(self.collection(), key).await?;
        self.store.log_action(self.actions().delete, key).await;
        Ok(())
    }

    /// Every persisted draft of this family
    pub async fn get_all_drafts(&self) -> AppResult<Vec<Draft>> {
        let documents: Vec<DraftDocument> =
            self.store.get_all_records(self.collection()).await?;
        Ok(documents
            .into_iter()
            .filter_map(|doc| Draft::from_document(self.kind, doc, None))
            .collect())
    }

    /// Draft summaries, most recently touched first. Never fails.
    pub async fn get_all_drafts_array(&self) -> Vec<DraftSummary> {
        let drafts = match self.get_all_drafts().await {
            Ok(drafts) => drafts,
            Err(e) => {
                tracing::error!("Error listing {} drafts: {}", self.kind, e);
                return Vec::new();
            }
        };

        let mut summaries: Vec<DraftSummary> = drafts.iter().map(Draft::summary).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }
}
