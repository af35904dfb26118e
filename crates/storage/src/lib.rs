use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Named-slot key/value persistence. Each slot holds one opaque string that is
/// overwritten as a whole on every write.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn read_slot(&self, name: &str) -> Result<Option<String>>;
    async fn write_slot(&self, name: &str, value: &str) -> Result<()>;
    /// Returns whether a slot was present.
    async fn clear_slot(&self, name: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    pub name: String,
    pub size_bytes: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    /// Accepts full sqlite URLs as well as bare file paths.
    pub async fn new(database_url: &str) -> Result<Self> {
        let database_url =
            normalize_sqlite_url(database_url).unwrap_or_else(|| database_url.to_string());
        let database_url = database_url.as_str();
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own empty
        // database, so keep exactly one alive for the lifetime of the pool.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(%database_url, "storage ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_slots(&self) -> Result<Vec<SlotSummary>> {
        let rows = sqlx::query(
            "SELECT name, length(CAST(value AS BLOB)) AS size_bytes, updated_at
             FROM slots ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list storage slots")?;

        rows.into_iter()
            .map(|row| -> Result<SlotSummary> {
                Ok(SlotSummary {
                    name: row.try_get("name")?,
                    size_bytes: row.try_get::<i64, _>("size_bytes")?.max(0) as usize,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SlotStore for Storage {
    async fn read_slot(&self, name: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM slots WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read slot '{name}'"))?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn write_slot(&self, name: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO slots (name, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write slot '{name}'"))?;
        debug!(slot = name, bytes = value.len(), "slot written");
        Ok(())
    }

    async fn clear_slot(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM slots WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to clear slot '{name}'"))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Process-local slot store. Clones share the same slots.
#[derive(Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(name.into(), value.into());
        Self {
            slots: Arc::new(Mutex::new(slots)),
        }
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn read_slot(&self, name: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().await.get(name).cloned())
    }

    async fn write_slot(&self, name: &str, value: &str) -> Result<()> {
        self.slots
            .lock()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn clear_slot(&self, name: &str) -> Result<bool> {
        Ok(self.slots.lock().await.remove(name).is_some())
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

/// Turns `sqlite:path`, bare paths and Windows separators into a
/// `sqlite://` URL. Blank input gives `None`; other schemes pass through.
pub fn normalize_sqlite_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if is_memory_url(raw) || raw.contains("://") {
        return Some(raw.to_string());
    }
    let path = raw.strip_prefix("sqlite:").unwrap_or(raw);
    Some(format!("sqlite://{}", path.replace('\\', "/")))
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) {
        return None;
    }
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();

    (!path.is_empty()).then(|| Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
