use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::{StorageError, StorageResult};

use super::DocumentStore;

/// Process-local store backed by a concurrent map.
///
/// The store can be switched offline to mimic an unreachable remote backend.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<DashMap<String, Value>>,
    offline: Arc<AtomicBool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated unavailability; every call fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing the availability flag.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.documents.get(key).map(|entry| entry.value().clone())
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "in-memory store is offline".into(),
                io::Error::new(io::ErrorKind::NotConnected, "offline"),
            ));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.peek(&key))
        })
    }

    fn save(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move {
            store.ensure_online()?;
            store.documents.insert(key, value);
            Ok(())
        })
    }

    fn clear_all(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            store.documents.clear();
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn save_then_load_returns_value() {
        let store = MemoryDocumentStore::new();
        store.save("teams", json!([{"team_id": "a"}])).await.unwrap();
        let loaded = store.load("teams").await.unwrap();
        assert_eq!(loaded, Some(json!([{"team_id": "a"}])));
        assert_eq!(store.load("judges").await.unwrap(), None);
    }

    #[tokio::test]
    async fn offline_store_rejects_calls() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);
        assert!(store.load("teams").await.is_err());
        assert!(store.save("teams", json!([])).await.is_err());
        assert!(store.health_check().await.is_err());

        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }
}
