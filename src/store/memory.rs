use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Write operation recorded by [`MemoryStore`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Insert { collection: Collection, count: usize },
    DeleteByIds { collection: Collection, ids: Vec<String> },
    DeleteAll { collection: Collection },
}

#[derive(Default)]
struct Inner {
    collections: HashMap<Collection, Vec<serde_json::Value>>,
    ops: Vec<StoreOp>,
}

/// In-process document store for dry runs and tests. Cloning shares state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `docs` in `collection`, without recording an op.
    pub async fn seed(&self, collection: Collection, docs: Vec<serde_json::Value>) {
        let mut inner = self.inner.lock().await;
        inner.collections.entry(collection).or_default().extend(docs);
    }

    pub async fn documents(&self, collection: Collection) -> Vec<serde_json::Value> {
        let inner = self.inner.lock().await;
        inner.collections.get(&collection).cloned().unwrap_or_default()
    }

    pub async fn ids(&self, collection: Collection) -> HashSet<String> {
        self.documents(collection)
            .await
            .iter()
            .filter_map(|doc| doc.get("id").and_then(|id| id.as_str()).map(String::from))
            .collect()
    }

    pub async fn ops(&self) -> Vec<StoreOp> {
        self.inner.lock().await.ops.clone()
    }
}

fn document_id(doc: &serde_json::Value) -> Option<&str> {
    doc.get("id").and_then(|id| id.as_str())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(&self, collection: Collection, docs: Vec<serde_json::Value>) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let count = docs.len();
        inner.collections.entry(collection).or_default().extend(docs);
        inner.ops.push(StoreOp::Insert { collection, count });
        Ok(count as u64)
    }

    async fn delete_by_ids(&self, collection: Collection, ids: &[String]) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let docs = inner.collections.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|doc| !document_id(doc).is_some_and(|id| wanted.contains(id)));
        let deleted = before - docs.len();

        let mut recorded = ids.to_vec();
        recorded.sort();
        inner.ops.push(StoreOp::DeleteByIds {
            collection,
            ids: recorded,
        });
        Ok(deleted as u64)
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let deleted = inner
            .collections
            .remove(&collection)
            .map(|docs| docs.len())
            .unwrap_or(0);
        inner.ops.push(StoreOp::DeleteAll { collection });
        Ok(deleted as u64)
    }

    async fn max_last_updated(&self, collection: Collection) -> Result<Option<DateTime<Utc>>> {
        let inner = self.inner.lock().await;
        let max = inner
            .collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter_map(|doc| doc.get("lastUpdated").and_then(|v| v.as_str()))
            .filter_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .max();
        Ok(max)
    }
}
