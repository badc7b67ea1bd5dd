use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::store::{
    validate_collection, with_id, without_id, DeleteResult, Document, DocumentStore, StoreError,
    Update, UpdateResult,
};

type Collection = Vec<(ObjectId, Document)>;

/// Process-local document store. Used for development runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn write_one<F>(&self, collection: &str, id: &ObjectId, f: F) -> Result<UpdateResult, StoreError>
    where
        F: FnOnce(&Document) -> Document,
    {
        validate_collection(collection)?;
        let mut collections = self.collections.write().await;
        let Some(entry) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(key, _)| key == id))
        else {
            return Ok(UpdateResult::default());
        };

        let next = f(&entry.1);
        if next == entry.1 {
            return Ok(UpdateResult { matched: 1, modified: 0 });
        }
        entry.1 = next;
        Ok(UpdateResult { matched: 1, modified: 1 })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        validate_collection(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().map(|(id, doc)| with_id(id, doc.clone())).collect())
            .unwrap_or_default())
    }

    async fn find_one(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        validate_collection(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(key, _)| key == id))
            .map(|(key, doc)| with_id(key, doc.clone())))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId, StoreError> {
        validate_collection(collection)?;
        let id = ObjectId::new();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id, without_id(doc)));
        Ok(id)
    }

    async fn replace_one(
        &self,
        collection: &str,
        id: &ObjectId,
        doc: Document,
    ) -> Result<UpdateResult, StoreError> {
        let doc = without_id(doc);
        self.write_one(collection, id, move |_| doc).await
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &ObjectId,
        update: Update,
    ) -> Result<UpdateResult, StoreError> {
        self.write_one(collection, id, |current| update.apply(current)).await
    }

    async fn delete_one(&self, collection: &str, id: &ObjectId) -> Result<DeleteResult, StoreError> {
        validate_collection(collection)?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteResult::default());
        };
        let before = docs.len();
        docs.retain(|(key, _)| key != id);
        Ok(DeleteResult {
            deleted: (before - docs.len()) as u64,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
