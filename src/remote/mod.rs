//! Remote store variant: a live-synchronized, multi-client collection.
//!
//! One document per record, keyed by identity. All reads flow through a
//! push subscription on the backing collection; every change by any
//! client re-delivers the full ordered document list, which is numbered
//! client-side and handed to the local subscriber. Beyond that last
//! delivered set, nothing is cached; the collection is authoritative.

mod backend;
mod hub;

pub use backend::{DocumentBackend, DocumentWatch, RecordDocument};
pub use hub::CollectionHub;

use crate::error::Result;
use crate::store::{BackendKind, RecordStore};
use crate::subscriptions::{Snapshot, SnapshotHandle, SubscriberSlot};
use crate::types::{IdentityMint, ImportRecord, Record, RecordDraft, RecordId, RecordPatch, Timestamp};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Store variant backed by a hosted document collection.
pub struct RemoteStore {
    backend: Arc<dyn DocumentBackend>,
    subscriber: SubscriberSlot,
    /// Last set the watch delivered; the one piece of client-side state
    /// the contract allows, used to hand a new subscriber the current
    /// snapshot without a round-trip.
    latest: Arc<RwLock<Option<Vec<Record>>>>,
    forwarder: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    mint: IdentityMint,
}

impl RemoteStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            subscriber: SubscriberSlot::new(),
            latest: Arc::new(RwLock::new(None)),
            forwarder: tokio::sync::Mutex::new(None),
            mint: IdentityMint::new(),
        }
    }

    /// Open the backend watch once per store instance and keep forwarding
    /// deliveries into the subscriber slot.
    async fn ensure_watching(&self) -> Result<()> {
        let mut forwarder = self.forwarder.lock().await;
        if forwarder.is_some() {
            return Ok(());
        }

        let mut watch = self.backend.watch().await?;
        let slot = self.subscriber.clone();
        let latest = Arc::clone(&self.latest);
        *forwarder = Some(tokio::spawn(async move {
            while let Some(set) = watch.next_set().await {
                let records: Vec<Record> = set
                    .into_iter()
                    .map(|(id, doc)| doc.into_record(id))
                    .collect();
                *latest.write() = Some(records.clone());
                slot.publish(Snapshot::number(records));
            }
        }));
        Ok(())
    }
}

impl Drop for RemoteStore {
    fn drop(&mut self) {
        if let Ok(mut forwarder) = self.forwarder.try_lock() {
            if let Some(task) = forwarder.take() {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Cloud
    }

    async fn subscribe(&self) -> Result<SnapshotHandle> {
        let handle = self.subscriber.register();
        self.ensure_watching().await?;

        // A resubscribe gets the last delivered set straight away; the
        // first subscribe is served by the watch's opening delivery.
        let cached = self.latest.read().clone();
        if let Some(records) = cached {
            self.subscriber.publish(Snapshot::number(records));
        }
        Ok(handle)
    }

    async fn create(&self, draft: RecordDraft) -> Result<RecordId> {
        let created = Timestamp::now();
        let id = self.mint.next(created);
        self.backend
            .insert(id.clone(), RecordDocument::from_draft(draft, created))
            .await?;
        debug!(id = %id, "created document");
        Ok(id)
    }

    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<()> {
        self.backend.merge(id, patch.document_fields()).await
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        self.backend.delete(id).await
    }

    async fn import_many(&self, rows: Vec<ImportRecord>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let now = Timestamp::now();
        let count = rows.len();
        let docs = rows
            .into_iter()
            .map(|row| {
                let created = row.created_at_millis.unwrap_or(now);
                let id = self.mint.next(created);
                (id, RecordDocument::from_import(row, created))
            })
            .collect();

        self.backend.insert_many(docs).await?;
        debug!(count, "imported documents");
        Ok(())
    }
}
