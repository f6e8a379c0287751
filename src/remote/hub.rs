//! In-process document collection shared by multiple clients.

use super::backend::{DocumentBackend, DocumentWatch, RecordDocument};
use crate::config::RemoteConfig;
use crate::error::Result;
use crate::types::RecordId;
use async_trait::async_trait;
use futures::future::try_join_all;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

type DocumentSet = Vec<(RecordId, RecordDocument)>;

#[derive(Default)]
struct HubInner {
    documents: RwLock<HashMap<RecordId, RecordDocument>>,
    watchers: Mutex<Vec<UnboundedSender<DocumentSet>>>,
}

/// A live, multi-client document collection held in process memory.
///
/// Every client sharing a hub observes every other client's writes
/// through its watch, which is what the cloud variant's tests and
/// embedded deployments run against. A network-backed collection
/// implements [`DocumentBackend`] the same way and drops in unchanged.
#[derive(Clone, Default)]
pub struct CollectionHub {
    inner: Arc<HubInner>,
}

impl CollectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hub for the project named in `config`.
    ///
    /// Hubs live in a process-wide registry keyed by project id, so every
    /// store opened against the same project shares one collection, the
    /// way a process initializes its cloud backend once and hands the
    /// same handle around.
    pub fn attach(config: &RemoteConfig) -> Self {
        static REGISTRY: OnceLock<Mutex<HashMap<String, CollectionHub>>> = OnceLock::new();
        let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
        registry
            .lock()
            .entry(config.project_id.clone())
            .or_insert_with(CollectionHub::new)
            .clone()
    }

    /// Current documents, newest first. Ties on creation time fall back
    /// to the identity so the order is stable across deliveries.
    fn ordered_set(&self) -> DocumentSet {
        let documents = self.inner.documents.read();
        let mut set: DocumentSet = documents
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();
        set.sort_by(|a, b| {
            b.1.created_at_millis
                .cmp(&a.1.created_at_millis)
                .then_with(|| a.0.cmp(&b.0))
        });
        set
    }

    /// Push the current set to every live watcher.
    fn notify(&self) {
        let set = self.ordered_set();
        let mut watchers = self.inner.watchers.lock();
        watchers.retain(|watcher| watcher.send(set.clone()).is_ok());
    }

    /// One acknowledged document write.
    async fn apply_insert(&self, id: RecordId, doc: RecordDocument) -> Result<()> {
        self.inner.documents.write().insert(id, doc);
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for CollectionHub {
    async fn insert(&self, id: RecordId, doc: RecordDocument) -> Result<()> {
        self.apply_insert(id, doc).await?;
        self.notify();
        Ok(())
    }

    async fn insert_many(&self, docs: Vec<(RecordId, RecordDocument)>) -> Result<()> {
        let count = docs.len();
        // Fan out the writes, wait for every acknowledgment, then let
        // watchers see the whole batch as one change.
        try_join_all(
            docs.into_iter()
                .map(|(id, doc)| self.apply_insert(id, doc)),
        )
        .await?;
        self.notify();
        debug!(count, "batch insert applied");
        Ok(())
    }

    async fn merge(&self, id: &RecordId, fields: Map<String, Value>) -> Result<()> {
        let changed = {
            let mut documents = self.inner.documents.write();
            match documents.get(id) {
                Some(doc) => {
                    let merged = doc.merged(&fields)?;
                    documents.insert(id.clone(), merged);
                    true
                }
                None => false,
            }
        };
        if changed {
            self.notify();
        }
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let removed = self.inner.documents.write().remove(id).is_some();
        if removed {
            self.notify();
        }
        Ok(())
    }

    async fn watch(&self) -> Result<DocumentWatch> {
        let (sender, receiver) = mpsc::unbounded_channel();
        // New watches start with the current set, like any live query.
        let _ = sender.send(self.ordered_set());
        self.inner.watchers.lock().push(sender);
        Ok(DocumentWatch::new(receiver))
    }
}
