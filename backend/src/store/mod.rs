//! Document store: four keyed collections plus the audit trail, on whichever
//! medium the startup probe selected.

mod backend;
mod fallback;
mod locks;
mod sqlite;

pub use backend::{Collection, StorageBackend, StoreError, StoreResult, AUDIT_COLLECTION};
pub use fallback::{
    blob_name, reclaim_blobs, BlobMedium, BlobRead, FallbackBackend, FileMedium, MemoryMedium,
    FALLBACK_PREFIX,
};
pub use locks::{KeyGuard, KeyedLocks};
pub use sqlite::SqliteBackend;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared::AuditEntry;
use std::sync::Arc;

/// Lifecycle of the store handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Uninitialized,
    Opening,
    /// Primary medium open
    Ready,
    /// Primary unavailable, fallback medium in use
    Degraded,
    /// No medium reachable
    Failed,
}

/// What the capability probe may use
pub struct StorageOptions {
    /// Connection URL of the primary medium; `None` skips it
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub medium: Arc<dyn BlobMedium>,
}

impl StorageOptions {
    pub fn fallback_only(medium: Arc<dyn BlobMedium>) -> Self {
        Self {
            database_url: None,
            max_connections: 1,
            medium,
        }
    }

    pub fn with_primary(database_url: impl Into<String>, medium: Arc<dyn BlobMedium>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            max_connections: 5,
            medium,
        }
    }
}

struct StoreInner {
    state: StoreState,
    backend: Option<Arc<dyn StorageBackend>>,
    medium: Arc<dyn BlobMedium>,
    locks: KeyedLocks,
}

/// Cheaply clonable handle over the selected backend
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

fn advance(state: &mut StoreState, next: StoreState) {
    tracing::debug!("Store state {:?} -> {:?}", state, next);
    *state = next;
}

impl DocumentStore {
    /// Probe the media once and settle on Ready, Degraded or Failed
    pub async fn open(options: StorageOptions) -> Self {
        let mut state = StoreState::Uninitialized;
        advance(&mut state, StoreState::Opening);

        let mut backend: Option<Arc<dyn StorageBackend>> = None;

        if let Some(url) = options.database_url.as_deref() {
            match SqliteBackend::connect(url, options.max_connections).await {
                Ok(primary) => {
                    // Writes from an earlier degraded session belong on the primary now
                    match reclaim_blobs(options.medium.as_ref(), &primary).await {
                        Ok(0) => {}
                        Ok(moved) => {
                            tracing::info!("Moved {} records from the fallback medium", moved)
                        }
                        Err(e) => tracing::warn!("Fallback records not reclaimed: {}", e),
                    }
                    backend = Some(Arc::new(primary));
                    advance(&mut state, StoreState::Ready);
                    tracing::info!("Document store ready on primary medium");
                }
                Err(e) => tracing::warn!("Primary medium unavailable: {}", e),
            }
        }

        if backend.is_none() {
            match options.medium.probe() {
                Ok(()) => {
                    backend = Some(Arc::new(FallbackBackend::new(options.medium.clone())));
                    advance(&mut state, StoreState::Degraded);
                    tracing::warn!("Document store degraded to fallback medium");
                }
                Err(e) => {
                    advance(&mut state, StoreState::Failed);
                    tracing::error!("No storage medium reachable: {}", e);
                }
            }
        }

        Self::with_backend(state, backend, options.medium)
    }

    /// Build a store over an explicit backend, skipping the probe
    pub fn from_backend(backend: Arc<dyn StorageBackend>, medium: Arc<dyn BlobMedium>) -> Self {
        Self::with_backend(StoreState::Ready, Some(backend), medium)
    }

    fn with_backend(
        state: StoreState,
        backend: Option<Arc<dyn StorageBackend>>,
        medium: Arc<dyn BlobMedium>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state,
                backend,
                medium,
                locks: KeyedLocks::new(),
            }),
        }
    }

    pub fn state(&self) -> StoreState {
        self.inner.state
    }

    pub fn backend_tag(&self) -> Option<&'static str> {
        self.inner.backend.as_ref().map(|b| b.backend_tag())
    }

    /// Raw fallback namespace, used for legacy keys and the migration flag
    pub fn medium(&self) -> &Arc<dyn BlobMedium> {
        &self.inner.medium
    }

    pub async fn lock(&self, collection: Collection, key: &str) -> KeyGuard {
        self.inner.locks.lock(collection, key).await
    }

    fn backend(&self) -> StoreResult<&Arc<dyn StorageBackend>> {
        self.inner.backend.as_ref().ok_or(StoreError::Unavailable)
    }

    // ========================================================================
    // Raw documents
    // ========================================================================

    pub async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>> {
        self.backend()?.get(collection, key).await
    }

    pub async fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        self.backend()?.get_all(collection).await
    }

    pub async fn put(&self, collection: Collection, document: Value) -> StoreResult<()> {
        self.backend()?.put(collection, document).await
    }

    pub async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()> {
        self.backend()?.delete(collection, key).await
    }

    pub async fn clear(&self, collection: Collection) -> StoreResult<()> {
        self.backend()?.clear(collection).await
    }

    // ========================================================================
    // Typed records
    // ========================================================================

    pub fn decode_record<T: DeserializeOwned>(
        collection: Collection,
        document: Value,
    ) -> StoreResult<T> {
        serde_json::from_value(document).map_err(|e| StoreError::MalformedRecord {
            collection: collection.name().to_string(),
            reason: e.to_string(),
        })
    }

    /// Typed read; a record of the wrong shape is logged and read as absent
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> StoreResult<Option<T>> {
        let Some(document) = self.get(collection, key).await? else {
            return Ok(None);
        };
        match Self::decode_record(collection, document) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("{} (key {})", e, key);
                Ok(None)
            }
        }
    }

    /// Typed scan; records of the wrong shape are logged and skipped
    pub async fn get_all_records<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> StoreResult<Vec<T>> {
        let documents = self.get_all(collection).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match Self::decode_record(collection, document) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            })
            .collect())
    }

    pub async fn put_record<T: Serialize>(
        &self,
        collection: Collection,
        record: &T,
    ) -> StoreResult<()> {
        self.put(collection, serde_json::to_value(record)?).await
    }

    // ========================================================================
    // Audit trail
    // ========================================================================

    /// Best-effort append to the audit trail. Never fails the caller.
    pub async fn log_action(&self, action: &str, details: impl Into<String>) {
        let entry = AuditEntry::new(action, details);
        let result = match self.backend() {
            Ok(backend) => backend.append_audit(&entry).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!("Failed to log action {}: {}", action, e);
        }
    }

    pub async fn audit_entries(&self, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        self.backend()?.audit_entries(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_probe_without_primary_degrades() {
        let store = DocumentStore::open(StorageOptions::fallback_only(Arc::new(MemoryMedium::new()))).await;
        assert_eq!(store.state(), StoreState::Degraded);
        assert_eq!(store.backend_tag(), Some("fallback"));
    }

    #[tokio::test]
    async fn test_probe_with_nothing_reachable_fails() {
        let store = DocumentStore::open(StorageOptions::fallback_only(Arc::new(
            MemoryMedium::unavailable(),
        )))
        .await;
        assert_eq!(store.state(), StoreState::Failed);
        assert!(matches!(
            store.put(Collection::History, json!({ "id": "x" })).await,
            Err(StoreError::Unavailable)
        ));
        // Never raises
        store.log_action("noop", "").await;
    }

    #[tokio::test]
    async fn test_probe_prefers_primary() {
        let store = DocumentStore::open(StorageOptions::with_primary(
            "sqlite::memory:",
            Arc::new(MemoryMedium::new()),
        ))
        .await;
        assert_eq!(store.state(), StoreState::Ready);
        assert_eq!(store.backend_tag(), Some("sqlite"));
    }

    #[tokio::test]
    async fn test_malformed_typed_read_is_absent() {
        let store = DocumentStore::open(StorageOptions::fallback_only(Arc::new(MemoryMedium::new()))).await;
        store
            .put(Collection::Inventory, json!({ "key": "k", "quantity": "lots" }))
            .await
            .unwrap();

        let record: Option<shared::StockRecord> =
            store.get_record(Collection::Inventory, "k").await.unwrap();
        assert!(record.is_none());

        let raw = store.get(Collection::Inventory, "k").await.unwrap().unwrap();
        let err = DocumentStore::decode_record::<shared::StockRecord>(Collection::Inventory, raw)
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord { .. }));
    }
}
