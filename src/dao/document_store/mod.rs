#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::StorageResult;

pub use self::memory::MemoryDocumentStore;

/// Key-value document store holding one JSON value per key.
pub trait DocumentStore: Send + Sync {
    /// Fetch the value stored under `key`, `None` when absent.
    fn load(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace the value stored under `key`.
    fn save(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove every stored key.
    fn clear_all(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
