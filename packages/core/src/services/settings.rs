//! Settings Service
//!
//! A flat key/value store backing site-wide configuration. Keys are
//! dot-namespaced strings, values are stored as text; typed accessors
//! fall back to a default when a key is absent or unparsable.

use crate::db::DatabaseService;
use crate::services::error::ServiceError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Well-known setting keys.
pub mod keys {
    pub const DEFAULT_LANGUAGE: &str = "site.default_language";
    pub const TRASH_RETENTION_DAYS: &str = "trash.retention_days";
    pub const SCHEDULER_TICK_SECONDS: &str = "scheduler.tick_seconds";
}

/// Collaborator contract for configuration lookup, so services and the
/// scheduler can be tested against a canned implementation.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError>;

    /// String value with a fallback for absent keys.
    async fn get_or(&self, key: &str, default: &str) -> Result<String, ServiceError> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.to_string()))
    }

    /// Integer value with a fallback for absent or malformed keys.
    async fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, ServiceError> {
        match self.get(key).await? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!(key, raw, "Setting is not an integer; using default");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

/// Database-backed settings store.
pub struct DbSettings {
    db: Arc<DatabaseService>,
}

impl DbSettings {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Every stored setting, sorted by key.
    pub async fn list_all(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT key, value FROM settings ORDER BY key", ())
            .await
            .map_err(|e| ServiceError::from_sql("Failed to list settings", e))?;

        let mut settings = BTreeMap::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch setting row", e))?
        {
            let key: String = row
                .get(0)
                .map_err(|e| ServiceError::from_sql("Failed to read setting key", e))?;
            let value: String = row
                .get(1)
                .map_err(|e| ServiceError::from_sql("Failed to read setting value", e))?;
            settings.insert(key, value);
        }
        Ok(settings)
    }
}

#[async_trait]
impl SettingsProvider for DbSettings {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await
            .map_err(|e| ServiceError::from_sql("Failed to read setting", e))?;

        match rows
            .next()
            .await
            .map_err(|e| ServiceError::from_sql("Failed to fetch setting row", e))?
        {
            Some(row) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| ServiceError::from_sql("Failed to read setting value", e))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        if key.trim().is_empty() {
            return Err(ServiceError::validation("setting key must not be empty"));
        }
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            (key, value),
        )
        .await
        .map_err(|e| ServiceError::from_sql("Failed to write setting", e))?;
        Ok(())
    }
}
