//! Draft models: named, in-progress batches of line items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::LineItem;
use crate::types::ItemType;

/// Maximum number of items a single draft may hold
pub const MAX_DRAFT_ITEMS: usize = 20;

/// The two draft families. They differ only in the field that names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftKind {
    /// Unloading drafts, keyed by store name
    Unloading,
    /// Purchase drafts, keyed by location name
    Purchase,
}

impl DraftKind {
    /// Field of the persisted record holding the draft key
    pub fn key_field(&self) -> &'static str {
        match self {
            DraftKind::Unloading => "storeName",
            DraftKind::Purchase => "locationName",
        }
    }

    /// Movement type recorded for a submitted batch of this kind
    pub fn item_type(&self) -> ItemType {
        match self {
            DraftKind::Unloading => ItemType::Unloading,
            DraftKind::Purchase => ItemType::Purchase,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unloading" => Some(DraftKind::Unloading),
            "purchase" => Some(DraftKind::Purchase),
            _ => None,
        }
    }
}

impl std::fmt::Display for DraftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftKind::Unloading => write!(f, "unloading"),
            DraftKind::Purchase => write!(f, "purchase"),
        }
    }
}

/// Rejection for an add on a draft that already holds [`MAX_DRAFT_ITEMS`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("draft '{key}' already holds the maximum of {max} items")]
pub struct DraftFull {
    pub key: String,
    pub max: usize,
}

/// A named, in-progress batch of line items
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "DraftDocument")]
pub struct Draft {
    pub kind: DraftKind,
    pub key: String,
    /// Insertion order, at most [`MAX_DRAFT_ITEMS`]
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Draft {
    /// A fresh, empty draft. Not persisted until its first item is added.
    pub fn new(kind: DraftKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            items: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_DRAFT_ITEMS
    }

    /// Append an item, enforcing the item cap. A full draft is left unchanged.
    pub fn push_item(&mut self, item: LineItem, at: DateTime<Utc>) -> Result<(), DraftFull> {
        if self.is_full() {
            return Err(DraftFull {
                key: self.key.clone(),
                max: MAX_DRAFT_ITEMS,
            });
        }
        self.items.push(item);
        self.updated_at = Some(at);
        Ok(())
    }

    /// Remove an item by id. Returns whether anything was removed.
    pub fn remove_item(&mut self, item_id: &str, at: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.updated_at = Some(at);
        self.items.len() != before
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    /// Last time the draft was touched
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn summary(&self) -> DraftSummary {
        DraftSummary {
            key: self.key.clone(),
            item_count: self.items.len(),
            created_at: self.created_at,
            updated_at: self.last_touched(),
        }
    }

    /// Rebuild a draft from its persisted document.
    ///
    /// `fallback_key` names the draft when the document itself lacks the key
    /// field (legacy map entries were keyed externally).
    pub fn from_document(
        kind: DraftKind,
        doc: DraftDocument,
        fallback_key: Option<&str>,
    ) -> Option<Self> {
        let key = match kind {
            DraftKind::Unloading => doc.store_name,
            DraftKind::Purchase => doc.location_name,
        }
        .or_else(|| fallback_key.map(str::to_string))?;

        Some(Self {
            kind,
            key,
            items: doc.items,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

/// Persisted shape of a draft. Exactly one of the key fields is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    pub items: Vec<LineItem>,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Draft> for DraftDocument {
    fn from(draft: Draft) -> Self {
        let (store_name, location_name) = match draft.kind {
            DraftKind::Unloading => (Some(draft.key), None),
            DraftKind::Purchase => (None, Some(draft.key)),
        };
        Self {
            store_name,
            location_name,
            items: draft.items,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        }
    }
}

/// Summary projection used by draft lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub key: String,
    pub item_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
