// ABOUTME: In-process options backend for tests and ephemeral deployments
// ABOUTME: Keeps stored documents in a lock-guarded map

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{OptionsBackend, StorageResult};
use crate::types::{SettingsDocument, StoredOptions};

#[derive(Default)]
pub struct MemoryOptionsBackend {
    entries: RwLock<HashMap<String, StoredOptions>>,
}

impl MemoryOptionsBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionsBackend for MemoryOptionsBackend {
    async fn load(&self, name: &str) -> StorageResult<Option<StoredOptions>> {
        Ok(self.entries.read().await.get(name).cloned())
    }

    async fn persist(
        &self,
        name: &str,
        document: &SettingsDocument,
        updated_by: &str,
    ) -> StorageResult<StoredOptions> {
        let mut entries = self.entries.write().await;
        let version = entries.get(name).map_or(1, |existing| existing.version + 1);

        let stored = StoredOptions {
            name: name.to_string(),
            version,
            document: document.clone(),
            updated_at: Utc::now(),
            updated_by: updated_by.to_string(),
        };
        entries.insert(name.to_string(), stored.clone());
        Ok(stored)
    }
}
