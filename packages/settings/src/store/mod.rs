// ABOUTME: Options store owning the canonical settings document
// ABOUTME: Backend trait, load-or-seed initialization, wholesale update and reset

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{SettingValue, SettingsDocument, StoredOptions};

pub use memory::MemoryOptionsBackend;
pub use sqlite::SqliteOptionsBackend;

/// Principal recorded for writes the system makes on its own
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Options '{0}' have not been initialized")]
    NotInitialized(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable keyed storage for settings blobs. Each `persist` call is atomic
/// and replaces the whole document.
#[async_trait]
pub trait OptionsBackend: Send + Sync {
    async fn load(&self, name: &str) -> StorageResult<Option<StoredOptions>>;

    async fn persist(
        &self,
        name: &str,
        document: &SettingsDocument,
        updated_by: &str,
    ) -> StorageResult<StoredOptions>;
}

/// Handle to the live settings document. Cheap to clone; pass it to
/// whatever needs to read or write settings.
#[derive(Clone)]
pub struct OptionsStore {
    backend: Arc<dyn OptionsBackend>,
    name: String,
    defaults: Arc<SettingsDocument>,
}

impl OptionsStore {
    pub fn new(
        backend: Arc<dyn OptionsBackend>,
        name: impl Into<String>,
        defaults: SettingsDocument,
    ) -> Self {
        Self {
            backend,
            name: name.into(),
            defaults: Arc::new(defaults),
        }
    }

    /// Option key of the blob this store manages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load the stored document, seeding it from the defaults on first run
    pub async fn init(&self) -> StorageResult<StoredOptions> {
        if let Some(existing) = self.backend.load(&self.name).await? {
            info!(
                option = %self.name,
                version = existing.version,
                "Loaded stored settings"
            );
            return Ok(existing);
        }

        let seeded = self
            .backend
            .persist(&self.name, &self.defaults, SYSTEM_ACTOR)
            .await?;
        info!(option = %self.name, "Seeded settings from defaults");
        Ok(seeded)
    }

    /// Full stored record, including version and audit fields
    pub async fn current(&self) -> StorageResult<StoredOptions> {
        self.backend
            .load(&self.name)
            .await?
            .ok_or_else(|| StorageError::NotInitialized(self.name.clone()))
    }

    pub async fn get_options(&self) -> StorageResult<SettingsDocument> {
        Ok(self.current().await?.document)
    }

    pub fn get_defaults(&self) -> SettingsDocument {
        self.defaults.as_ref().clone()
    }

    /// Replace the stored document wholesale. Concurrent callers race and the
    /// last write wins.
    pub async fn update_options(
        &self,
        document: SettingsDocument,
        updated_by: &str,
    ) -> StorageResult<StoredOptions> {
        let stored = self
            .backend
            .persist(&self.name, &document, updated_by)
            .await?;
        info!(
            option = %self.name,
            version = stored.version,
            updated_by = %updated_by,
            "Persisted settings"
        );
        Ok(stored)
    }

    /// Store the defaults document in place of the current one
    pub async fn reset(&self, updated_by: &str) -> StorageResult<StoredOptions> {
        debug!(option = %self.name, "Resetting settings to defaults");
        self.update_options(self.get_defaults(), updated_by).await
    }

    /// Look up a value by dotted path, e.g. `general.site_title`
    pub async fn get_value(&self, path: &str) -> StorageResult<Option<SettingValue>> {
        let document = self.get_options().await?;
        Ok(lookup(&document, path).cloned())
    }

    pub async fn get_bool(&self, path: &str) -> StorageResult<Option<bool>> {
        Ok(self.get_value(path).await?.and_then(|v| v.as_bool()))
    }

    pub async fn get_int(&self, path: &str) -> StorageResult<Option<i64>> {
        Ok(self.get_value(path).await?.and_then(|v| v.as_int()))
    }

    pub async fn get_text(&self, path: &str) -> StorageResult<Option<String>> {
        Ok(self
            .get_value(path)
            .await?
            .and_then(|v| v.as_text().map(str::to_string)))
    }
}

/// Walk a dotted path through nested maps
pub fn lookup<'a>(document: &'a SettingsDocument, path: &str) -> Option<&'a SettingValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> SettingsDocument {
        serde_json::from_value(value).unwrap()
    }

    fn store_with(defaults: SettingsDocument) -> OptionsStore {
        OptionsStore::new(
            Arc::new(MemoryOptionsBackend::new()),
            "test_settings",
            defaults,
        )
    }

    #[tokio::test]
    async fn test_get_before_init_is_an_error() {
        let store = store_with(doc(json!({"a": 1})));

        let result = store.get_options().await;
        assert!(matches!(result, Err(StorageError::NotInitialized(name)) if name == "test_settings"));
    }

    #[tokio::test]
    async fn test_init_seeds_defaults_once() {
        let defaults = doc(json!({"general": {"title": "Site"}}));
        let store = store_with(defaults.clone());

        let seeded = store.init().await.unwrap();
        assert_eq!(seeded.version, 1);
        assert_eq!(seeded.updated_by, SYSTEM_ACTOR);
        assert_eq!(seeded.document, defaults);

        store
            .update_options(doc(json!({"general": {"title": "Changed"}})), "admin")
            .await
            .unwrap();

        // A second init keeps what is stored
        let reloaded = store.init().await.unwrap();
        assert_eq!(reloaded.version, 2);
        assert_eq!(
            reloaded.document,
            doc(json!({"general": {"title": "Changed"}}))
        );
    }

    #[tokio::test]
    async fn test_update_replaces_document_wholesale() {
        let store = store_with(doc(json!({"a": 1, "b": {"c": true}})));
        store.init().await.unwrap();

        store
            .update_options(doc(json!({"z": "only"})), "admin")
            .await
            .unwrap();

        assert_eq!(store.get_options().await.unwrap(), doc(json!({"z": "only"})));
    }

    #[tokio::test]
    async fn test_reset_restores_defaults_and_bumps_version() {
        let defaults = doc(json!({"a": 1}));
        let store = store_with(defaults.clone());
        store.init().await.unwrap();
        store
            .update_options(doc(json!({"a": 2})), "admin")
            .await
            .unwrap();

        let reset = store.reset("admin").await.unwrap();
        assert_eq!(reset.version, 3);
        assert_eq!(store.get_options().await.unwrap(), defaults);
        assert_eq!(store.get_defaults(), defaults);
    }

    #[tokio::test]
    async fn test_typed_lookups() {
        let store = store_with(doc(json!({
            "general": {"title": "Site", "per_page": 10, "public": true},
            "flat": "x"
        })));
        store.init().await.unwrap();

        assert_eq!(store.get_text("general.title").await.unwrap(), Some("Site".to_string()));
        assert_eq!(store.get_int("general.per_page").await.unwrap(), Some(10));
        assert_eq!(store.get_bool("general.public").await.unwrap(), Some(true));

        // Wrong type or missing path is None, not an error
        assert_eq!(store.get_int("general.title").await.unwrap(), None);
        assert_eq!(store.get_text("general.missing").await.unwrap(), None);
        assert_eq!(store.get_text("flat.deeper").await.unwrap(), None);
    }
}
