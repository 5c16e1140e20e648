//! Storage backend abstraction shared by the primary and fallback media

use async_trait::async_trait;
use serde_json::Value;
use shared::AuditEntry;
use thiserror::Error;

/// Errors raised by the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Neither the primary nor the fallback medium can be reached
    #[error("Storage unavailable")]
    Unavailable,

    /// A stored document failed shape validation on read
    #[error("Malformed record in {collection}: {reason}")]
    MalformedRecord { collection: String, reason: String },

    #[error("Record for {collection} has no '{field}' key")]
    MissingKey {
        collection: &'static str,
        field: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Name of the audit collection in every medium
pub const AUDIT_COLLECTION: &str = "auditLog";

/// The persisted document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    History,
    UnloadingDrafts,
    PurchaseDrafts,
    Inventory,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::History,
        Collection::UnloadingDrafts,
        Collection::PurchaseDrafts,
        Collection::Inventory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::History => "history",
            Collection::UnloadingDrafts => "unloadingDrafts",
            Collection::PurchaseDrafts => "purchaseDrafts",
            Collection::Inventory => "inventory",
        }
    }

    /// Field of each document that holds its key
    pub fn key_field(&self) -> &'static str {
        match self {
            Collection::History => "id",
            Collection::UnloadingDrafts => "storeName",
            Collection::PurchaseDrafts => "locationName",
            Collection::Inventory => "key",
        }
    }

    /// Extract the key of a document bound for this collection
    pub fn key_of(&self, document: &Value) -> StoreResult<String> {
        match document.get(self.key_field()) {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            Some(Value::Number(key)) => Ok(key.to_string()),
            _ => Err(StoreError::MissingKey {
                collection: self.name(),
                field: self.key_field(),
            }),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability set every storage medium provides
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>>;

    async fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>>;

    /// Upsert keyed by the collection's key field
    async fn put(&self, collection: Collection, document: Value) -> StoreResult<()>;

    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()>;

    async fn clear(&self, collection: Collection) -> StoreResult<()>;

    /// Append to the audit collection, returning the assigned id
    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<i64>;

    /// Most recent audit entries, newest first
    async fn audit_entries(&self, limit: usize) -> StoreResult<Vec<AuditEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_of_reads_collection_field() {
        let draft = json!({ "storeName": "Флоріда", "items": [] });
        assert_eq!(Collection::UnloadingDrafts.key_of(&draft).unwrap(), "Флоріда");
        assert!(matches!(
            Collection::PurchaseDrafts.key_of(&draft),
            Err(StoreError::MissingKey { field: "locationName", .. })
        ));
    }

    #[test]
    fn test_key_of_accepts_numeric_ids() {
        let item = json!({ "id": 1700000000000u64 });
        assert_eq!(Collection::History.key_of(&item).unwrap(), "1700000000000");
        assert!(Collection::History.key_of(&json!({ "id": "" })).is_err());
    }
}
