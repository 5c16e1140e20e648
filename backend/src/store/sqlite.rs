//! Primary medium: transactional SQLite document tables

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::AuditEntry;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

use super::backend::{Collection, StorageBackend, StoreError, StoreResult};

/// Path of the database file behind a `sqlite:` URL; `None` for in-memory
/// databases
fn database_file(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Document store on SQLite: one `documents` table keyed by
/// (collection, key) and an auto-increment `audit_log` table
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if missing) the database at `url` and ensure the schema
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        if let Some(dir) = database_file(url).as_deref().and_then(|f| f.parent()) {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        let backend = Self { pool };
        backend.ensure_schema().await?;
        Ok(backend)
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                details TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn decode(collection: Collection, body: &str) -> StoreResult<Value> {
        serde_json::from_str(body).map_err(|e| StoreError::MalformedRecord {
            collection: collection.name().to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Value>> {
        let body = sqlx::query_scalar::<_, String>(
            "SELECT body FROM documents WHERE collection = ? AND key = ?",
        )
        .bind(collection.name())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|body| Self::decode(collection, &body)).transpose()
    }

    async fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let bodies = sqlx::query_scalar::<_, String>(
            "SELECT body FROM documents WHERE collection = ? ORDER BY rowid ASC",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(bodies.len());
        for body in bodies {
            match Self::decode(collection, &body) {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!("Skipping unreadable row: {}", e),
            }
        }
        Ok(documents)
    }

    async fn put(&self, collection: Collection, document: Value) -> StoreResult<()> {
        let key = collection.key_of(&document)?;
        let body = serde_json::to_string(&document)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body)
            VALUES (?, ?, ?)
            ON CONFLICT (collection, key) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(collection.name())
        .bind(&key)
        .bind(&body)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND key = ?")
            .bind(collection.name())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection.name())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO audit_log (action, details, timestamp) VALUES (?, ?, ?)",
        )
        .bind(&entry.action)
        .bind(&entry.details)
        .bind(entry.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn audit_entries(&self, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, (i64, String, String, String)>(
            "SELECT id, action, details, timestamp FROM audit_log ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, action, details, timestamp)| {
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .ok()?
                    .with_timezone(&Utc);
                Some(AuditEntry {
                    id: Some(id),
                    action,
                    details,
                    timestamp,
                })
            })
            .collect())
    }
}
