//! One-shot transfer of legacy flat-keyed blobs into the document store

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore, StoreState};

/// Blob set to `"true"` once the migration pass has run
pub const MIGRATION_FLAG: &str = "migrated_to_indexeddb";

pub const LEGACY_HISTORY: &str = "purchase_history";
pub const LEGACY_DRAFTS: &str = "drafts";
pub const LEGACY_PURCHASE_DRAFTS: &str = "purchase_drafts";
pub const LEGACY_INVENTORY: &str = "inventory_stock";

#[derive(Debug, Clone, Copy)]
enum LegacyShape {
    /// JSON array of records
    List,
    /// JSON object of map key to record
    Map,
}

struct LegacySource {
    blob: &'static str,
    collection: Collection,
    shape: LegacyShape,
}

const LEGACY_SOURCES: [LegacySource; 4] = [
    LegacySource {
        blob: LEGACY_HISTORY,
        collection: Collection::History,
        shape: LegacyShape::List,
    },
    LegacySource {
        blob: LEGACY_DRAFTS,
        collection: Collection::UnloadingDrafts,
        shape: LegacyShape::Map,
    },
    LegacySource {
        blob: LEGACY_PURCHASE_DRAFTS,
        collection: Collection::PurchaseDrafts,
        shape: LegacyShape::Map,
    },
    LegacySource {
        blob: LEGACY_INVENTORY,
        collection: Collection::Inventory,
        shape: LegacyShape::Map,
    },
];

/// Outcome for one legacy blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub source: &'static str,
    pub collection: &'static str,
    pub migrated: usize,
    pub skipped: usize,
    /// The blob itself could not be parsed
    pub malformed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// The completion flag was already set; nothing ran
    pub already_migrated: bool,
    pub collections: Vec<CollectionReport>,
}

impl MigrationReport {
    pub fn migrated(&self) -> usize {
        self.collections.iter().map(|c| c.migrated).sum()
    }

    pub fn skipped(&self) -> usize {
        self.collections.iter().map(|c| c.skipped).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.collections.iter().any(|c| c.skipped > 0 || c.malformed)
    }
}

/// Shape a legacy entry into a document for `collection`
fn prepare_entry(
    collection: Collection,
    map_key: Option<&str>,
    entry: Value,
) -> Result<Value, String> {
    let Value::Object(mut document) = entry else {
        return Err("entry is not an object".to_string());
    };

    let field = collection.key_field();
    if let Some(key) = map_key {
        document
            .entry(field)
            .or_insert_with(|| Value::String(key.to_string()));
    }

    if matches!(
        collection,
        Collection::UnloadingDrafts | Collection::PurchaseDrafts
    ) && !document.get("items").is_some_and(Value::is_array)
    {
        return Err("draft has no items list".to_string());
    }

    let document = Value::Object(document);
    collection.key_of(&document).map_err(|e| e.to_string())?;
    Ok(document)
}

type LegacyEntry = (Option<String>, Value);

fn legacy_entries(shape: LegacyShape, parsed: Value) -> Result<Vec<LegacyEntry>, String> {
    match (shape, parsed) {
        (LegacyShape::List, Value::Array(items)) => {
            Ok(items.into_iter().map(|item| (None, item)).collect())
        }
        (LegacyShape::Map, Value::Object(map)) => Ok(map_entries(map)),
        (LegacyShape::List, _) => Err("expected an array".to_string()),
        (LegacyShape::Map, _) => Err("expected an object".to_string()),
    }
}

fn map_entries(map: Map<String, Value>) -> Vec<LegacyEntry> {
    map.into_iter().map(|(key, value)| (Some(key), value)).collect()
}

#[derive(Clone)]
pub struct MigrationService {
    store: DocumentStore,
}

impl MigrationService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn is_migrated(&self) -> AppResult<bool> {
        let flag = self.store.medium().read(MIGRATION_FLAG)?;
        Ok(flag.is_some_and(|value| !value.is_empty()))
    }

    /// Migrate legacy blobs once. Bad entries are skipped, and the flag is
    /// set after the pass regardless.
    pub async fn run(&self) -> AppResult<MigrationReport> {
        if self.store.state() == StoreState::Failed {
            return Err(AppError::StoreUnavailable);
        }
        if self.is_migrated()? {
            tracing::debug!("Legacy data already migrated");
            return Ok(MigrationReport {
                already_migrated: true,
                collections: Vec::new(),
            });
        }

        tracing::info!("Starting migration of legacy data");
        let mut report = MigrationReport::default();
        for source in &LEGACY_SOURCES {
            report.collections.push(self.migrate_source(source).await?);
        }

        self.store.medium().write(MIGRATION_FLAG, "true")?;

        let summary = report
            .collections
            .iter()
            .map(|c| format!("{}: {}", c.collection, c.migrated))
            .collect::<Vec<_>>()
            .join(", ");
        self.store.log_action("migration", summary).await;

        if report.has_errors() {
            let problems = report
                .collections
                .iter()
                .filter(|c| c.skipped > 0 || c.malformed)
                .map(|c| {
                    let unreadable = if c.malformed { ", unreadable" } else { "" };
                    format!("{}: {} skipped{}", c.source, c.skipped, unreadable)
                })
                .collect::<Vec<_>>()
                .join("; ");
            self.store.log_action("migration_error", problems).await;
        }

        tracing::info!(
            "Migration complete: {} migrated, {} skipped",
            report.migrated(),
            report.skipped()
        );
        Ok(report)
    }

    async fn migrate_source(&self, source: &LegacySource) -> AppResult<CollectionReport> {
        let mut outcome = CollectionReport {
            source: source.blob,
            collection: source.collection.name(),
            ..Default::default()
        };

        let Some(raw) = self.store.medium().read(source.blob)? else {
            return Ok(outcome);
        };

        let entries = match serde_json::from_str::<Value>(&raw)
            .map_err(|e| e.to_string())
            .and_then(|parsed| legacy_entries(source.shape, parsed))
        {
            Ok(entries) => entries,
            Err(reason) => {
                tracing::warn!("Legacy blob {} unreadable: {}", source.blob, reason);
                outcome.malformed = true;
                return Ok(outcome);
            }
        };

        for (map_key, entry) in entries {
            let document = match prepare_entry(source.collection, map_key.as_deref(), entry) {
                Ok(document) => document,
                Err(reason) => {
                    tracing::warn!("Skipping legacy {} entry: {}", source.blob, reason);
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self.store.put(source.collection, document).await {
                Ok(()) => outcome.migrated += 1,
                Err(e) => {
                    tracing::error!("Failed to migrate {} entry: {}", source.blob, e);
                    outcome.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Migrated {} {} entries ({} skipped)",
            outcome.migrated,
            source.blob,
            outcome.skipped
        );
        Ok(outcome)
    }
}
