//! Typed access to the document store with a last-known snapshot fallback.

use std::{fmt, sync::Arc};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dao::{
    document_store::DocumentStore,
    storage::{StorageError, StorageResult},
};

/// Keys under which console data is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Questions,
    UsedQuestions,
    Judges,
    UsedJudges,
    UsedFinalQuestions,
    Teams,
    Login,
}

impl DocumentKey {
    pub const ALL: [DocumentKey; 7] = [
        DocumentKey::Questions,
        DocumentKey::UsedQuestions,
        DocumentKey::Judges,
        DocumentKey::UsedJudges,
        DocumentKey::UsedFinalQuestions,
        DocumentKey::Teams,
        DocumentKey::Login,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKey::Questions => "questions",
            DocumentKey::UsedQuestions => "used_questions",
            DocumentKey::Judges => "judges",
            DocumentKey::UsedJudges => "used_judges",
            DocumentKey::UsedFinalQuestions => "used_final_questions",
            DocumentKey::Teams => "teams",
            DocumentKey::Login => "login",
        }
    }

    /// Key stored under `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last value seen per key, shared by every repository handle.
pub type SnapshotCache = Arc<DashMap<DocumentKey, Value>>;

/// Repository handle bound to the store installed at creation time.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Option<Arc<dyn DocumentStore>>,
    snapshots: SnapshotCache,
}

impl DocumentRepository {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, snapshots: SnapshotCache) -> Self {
        Self { store, snapshots }
    }

    /// Load the raw value for `key`.
    ///
    /// Returns the stored value, the last-known snapshot when the store cannot be
    /// reached, or `None`.
    pub async fn load_raw(&self, key: DocumentKey) -> Option<Value> {
        let Some(store) = &self.store else {
            return self.snapshot(key);
        };

        match store.load(key.as_str()).await {
            Ok(Some(value)) => {
                self.snapshots.insert(key, value.clone());
                Some(value)
            }
            Ok(None) => {
                self.snapshots.remove(&key);
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "store unreachable; using last-known snapshot");
                self.snapshot(key)
            }
        }
    }

    /// Load and decode `key`, returning `fallback` when absent or undecodable.
    pub async fn load<T>(&self, key: DocumentKey, fallback: T) -> T
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.load_raw(key).await else {
            return fallback;
        };

        match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(key = %key, error = %err, "stored value has an unexpected shape; using fallback");
                fallback
            }
        }
    }

    /// Persist `value` under `key` and refresh the snapshot on success.
    pub async fn save<T>(&self, key: DocumentKey, value: &T) -> StorageResult<()>
    where
        T: ?Sized + Serialize,
    {
        let store = self.store.as_ref().ok_or(StorageError::Detached)?;
        let value = serde_json::to_value(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;

        store.save(key.as_str(), value.clone()).await?;
        debug!(key = %key, "document saved");
        self.snapshots.insert(key, value);
        Ok(())
    }

    /// Remove every key from the store and forget all snapshots.
    pub async fn clear_all(&self) -> StorageResult<()> {
        let store = self.store.as_ref().ok_or(StorageError::Detached)?;
        store.clear_all().await?;
        self.snapshots.clear();
        Ok(())
    }

    fn snapshot(&self, key: DocumentKey) -> Option<Value> {
        self.snapshots.get(&key).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::document_store::MemoryDocumentStore;

    fn repository(store: &MemoryDocumentStore) -> DocumentRepository {
        DocumentRepository::new(Some(Arc::new(store.clone())), SnapshotCache::default())
    }

    #[tokio::test]
    async fn load_returns_fallback_when_absent() {
        let store = MemoryDocumentStore::new();
        let repo = repository(&store);
        let teams: Vec<String> = repo.load(DocumentKey::Teams, vec!["x".into()]).await;
        assert_eq!(teams, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_store_serves_last_snapshot() {
        let store = MemoryDocumentStore::new();
        let repo = repository(&store);
        repo.save(DocumentKey::UsedJudges, &vec!["j1"]).await.unwrap();

        store.set_offline(true);
        let used: Vec<String> = repo.load(DocumentKey::UsedJudges, Vec::new()).await;
        assert_eq!(used, vec!["j1".to_string()]);

        let missing: Vec<String> = repo.load(DocumentKey::Teams, vec!["fallback".into()]).await;
        assert_eq!(missing, vec!["fallback".to_string()]);
    }

    #[tokio::test]
    async fn failed_save_is_reported_and_snapshot_kept() {
        let store = MemoryDocumentStore::new();
        let repo = repository(&store);
        repo.save(DocumentKey::Login, &json!({"logged_in": false}))
            .await
            .unwrap();

        store.set_offline(true);
        let err = repo
            .save(DocumentKey::Login, &json!({"logged_in": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        assert_eq!(
            repo.load_raw(DocumentKey::Login).await,
            Some(json!({"logged_in": false}))
        );
    }

    #[tokio::test]
    async fn detached_repository_rejects_writes() {
        let repo = DocumentRepository::new(None, SnapshotCache::default());
        let err = repo.save(DocumentKey::Teams, &json!([])).await.unwrap_err();
        assert!(matches!(err, StorageError::Detached));
    }
}
