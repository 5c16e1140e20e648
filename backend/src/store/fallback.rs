//! Degraded medium: one serialized JSON blob per collection

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::AuditEntry;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{Collection, StorageBackend, StoreError, StoreResult, AUDIT_COLLECTION};

/// Prefix of every collection blob on the fallback medium
pub const FALLBACK_PREFIX: &str = "indexeddb_fallback_";

const PROBE_KEY: &str = "__storage_test__";

/// Blob name holding `collection`
pub fn blob_name(collection: Collection) -> String {
    format!("{}{}", FALLBACK_PREFIX, collection.name())
}

fn audit_blob_name() -> String {
    format!("{}{}", FALLBACK_PREFIX, AUDIT_COLLECTION)
}

/// Synchronous named-string storage (the raw fallback namespace)
pub trait BlobMedium: Send + Sync {
    fn read(&self, name: &str) -> StoreResult<Option<String>>;

    fn write(&self, name: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, name: &str) -> StoreResult<()>;

    /// Check the medium accepts writes
    fn probe(&self) -> StoreResult<()> {
        self.write(PROBE_KEY, PROBE_KEY)?;
        self.remove(PROBE_KEY)
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Media
// ============================================================================

/// One file per blob inside a directory
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl BlobMedium for FileMedium {
    fn read(&self, name: &str) -> StoreResult<Option<String>> {
        match std::fs::read_to_string(self.path(name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, value: &str) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.path(name)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local medium, used in tests and as a last resort
#[derive(Default)]
pub struct MemoryMedium {
    blobs: Mutex<HashMap<String, String>>,
    unavailable: bool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// A medium that rejects every call
    pub fn unavailable() -> Self {
        Self {
            blobs: Mutex::default(),
            unavailable: true,
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "blob medium disabled",
            )));
        }
        Ok(())
    }
}

impl BlobMedium for MemoryMedium {
    fn read(&self, name: &str) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(lock_recovering(&self.blobs).get(name).cloned())
    }

    fn write(&self, name: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        lock_recovering(&self.blobs).insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> StoreResult<()> {
        self.check()?;
        lock_recovering(&self.blobs).remove(name);
        Ok(())
    }
}

// ============================================================================
// Blob decoding
// ============================================================================

/// Outcome of reading one collection blob
#[derive(Debug, Clone, PartialEq)]
pub enum BlobRead {
    Missing,
    Parsed(Map<String, Value>),
    /// Present but not a JSON object, e.g. left by an older schema
    Malformed { reason: String },
}

impl BlobRead {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return BlobRead::Missing;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => BlobRead::Parsed(map),
            Ok(other) => BlobRead::Malformed {
                reason: format!("expected an object, found {}", json_kind(&other)),
            },
            Err(e) => BlobRead::Malformed {
                reason: e.to_string(),
            },
        }
    }

    /// Collapse to the collection contents, logging a malformed blob
    pub fn into_records(self, blob: &str) -> Map<String, Value> {
        match self {
            BlobRead::Parsed(map) => map,
            BlobRead::Missing => Map::new(),
            BlobRead::Malformed { reason } => {
                let err = StoreError::MalformedRecord {
                    collection: blob.to_string(),
                    reason,
                };
                tracing::warn!("{}; treating as empty", err);
                Map::new()
            }
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Backend
// ============================================================================

/// Storage backend over a [`BlobMedium`].
///
/// Every call rewrites a whole blob under one guard, so each call is atomic
/// with respect to the others.
pub struct FallbackBackend {
    medium: Arc<dyn BlobMedium>,
    guard: Mutex<()>,
}

impl FallbackBackend {
    pub fn new(medium: Arc<dyn BlobMedium>) -> Self {
        Self {
            medium,
            guard: Mutex::new(()),
        }
    }

    fn load(&self, collection: Collection) -> StoreResult<Map<String, Value>> {
        let name = blob_name(collection);
        let raw = self.medium.read(&name)?;
        Ok(BlobRead::parse(raw.as_deref()).into_records(&name))
    }

    fn store(&self, collection: Collection, records: &Map<String, Value>) -> StoreResult<()> {
        let body = serde_json::to_string(records)?;
        self.medium.write(&blob_name(collection), &body)
    }

    fn load_audit(&self) -> StoreResult<Vec<AuditEntry>> {
        let name = audit_blob_name();
        let Some(raw) = self.medium.read(&name)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<AuditEntry>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!("Audit blob unreadable ({}); starting a new one", e);
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl StorageBackend for FallbackBackend {
    fn backend_tag(&self) -> &'static str {
        "fallback"
    }

    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>> {
        let _guard = lock_recovering(&self.guard);
        Ok(self.load(collection)?.remove(key))
    }

    async fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let _guard = lock_recovering(&self.guard);
        Ok(self.load(collection)?.into_iter().map(|(_, v)| v).collect())
    }

    async fn put(&self, collection: Collection, document: Value) -> StoreResult<()> {
        let key = collection.key_of(&document)?;
        let _guard = lock_recovering(&self.guard);
        let mut records = self.load(collection)?;
        records.insert(key, document);
        self.store(collection, &records)
    }

    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()> {
        let _guard = lock_recovering(&self.guard);
        let mut records = self.load(collection)?;
        if records.remove(key).is_some() {
            self.store(collection, &records)?;
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> StoreResult<()> {
        let _guard = lock_recovering(&self.guard);
        self.medium.remove(&blob_name(collection))
    }

    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<i64> {
        let _guard = lock_recovering(&self.guard);
        let mut entries = self.load_audit()?;
        let id = entries.iter().filter_map(|e| e.id).max().unwrap_or(0) + 1;
        entries.push(AuditEntry {
            id: Some(id),
            ..entry.clone()
        });
        self.medium
            .write(&audit_blob_name(), &serde_json::to_string(&entries)?)?;
        Ok(id)
    }

    async fn audit_entries(&self, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        let _guard = lock_recovering(&self.guard);
        let mut entries = self.load_audit()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

// ============================================================================
// Reclaim
// ============================================================================

/// Move collection and audit blobs left by a degraded session into `target`,
/// returning how many records moved.
///
/// A blob is removed only after all of its records landed. Unreadable blobs
/// are left in place.
pub async fn reclaim_blobs(
    medium: &dyn BlobMedium,
    target: &dyn StorageBackend,
) -> StoreResult<usize> {
    let mut moved = 0;

    for collection in Collection::ALL {
        let name = blob_name(collection);
        let records = match BlobRead::parse(medium.read(&name)?.as_deref()) {
            BlobRead::Missing => continue,
            BlobRead::Parsed(records) => records,
            BlobRead::Malformed { reason } => {
                tracing::warn!("Leaving unreadable blob {} in place: {}", name, reason);
                continue;
            }
        };
        for (_, document) in records {
            target.put(collection, document).await?;
            moved += 1;
        }
        medium.remove(&name)?;
    }

    let name = audit_blob_name();
    if let Some(raw) = medium.read(&name)? {
        match serde_json::from_str::<Vec<AuditEntry>>(&raw) {
            Ok(entries) => {
                for entry in &entries {
                    target.append_audit(entry).await?;
                }
                medium.remove(&name)?;
            }
            Err(e) => tracing::warn!("Leaving unreadable blob {} in place: {}", name, e),
        }
    }

    Ok(moved)
}
