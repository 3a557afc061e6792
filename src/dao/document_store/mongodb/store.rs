use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::MongoValueDocument,
};
use crate::dao::{document_store::DocumentStore, storage::StorageResult};

const DOCUMENT_COLLECTION_NAME: &str = "documents";

#[derive(Clone)]
pub struct MongoDocumentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.connect().await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoDocumentStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.connect().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoValueDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoValueDocument>(DOCUMENT_COLLECTION_NAME)
    }
}

impl DocumentStore for MongoDocumentStore {
    fn load(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move {
            let collection = store.collection().await;
            let document = collection
                .find_one(doc! { "_id": &key })
                .await
                .map_err(|source| MongoDaoError::LoadDocument {
                    key: key.clone(),
                    source,
                })?;
            Ok(document.map(|doc| doc.value))
        })
    }

    fn save(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move {
            let collection = store.collection().await;
            let document = MongoValueDocument::new(key.clone(), value);
            collection
                .replace_one(doc! { "_id": &key }, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveDocument {
                    key: key.clone(),
                    source,
                })?;
            debug!(key = %key, "stored MongoDB document");
            Ok(())
        })
    }

    fn clear_all(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.collection().await;
            let result = collection.delete_many(doc! {}).await.map_err(|source| {
                MongoDaoError::ClearCollection {
                    collection: DOCUMENT_COLLECTION_NAME,
                    source,
                }
            })?;
            debug!(count = result.deleted_count, "cleared MongoDB documents");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
