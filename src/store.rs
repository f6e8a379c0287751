//! The store contract shared by both variants, and the startup selector.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::local::LocalStore;
use crate::remote::{CollectionHub, RemoteStore};
use crate::subscriptions::SnapshotHandle;
use crate::types::{ImportRecord, RecordDraft, RecordId, RecordPatch};
use async_trait::async_trait;
use std::sync::Arc;

/// Which backend a store instance runs against. Fixed for the lifetime of
/// the instance; exposed to consumers for display only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Cloud,
}

impl BackendKind {
    pub fn is_cloud(self) -> bool {
        matches!(self, BackendKind::Cloud)
    }

    /// Indicator text used by the dashboard header.
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Local => "Local Storage",
            BackendKind::Cloud => "Cloud Synced",
        }
    }
}

/// Persistence and live-update contract for job records.
///
/// Both variants implement the same surface: a single-subscriber snapshot
/// feed plus four mutations. Mutations resolve when the underlying write
/// completed; callers that need strict ordering must await each operation
/// before issuing the next, because two in-flight operations may race.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Which variant this is (read-only; selection happens at startup).
    fn backend(&self) -> BackendKind;

    /// Register the subscriber. The current full snapshot is delivered on
    /// the returned handle immediately, or as soon as the backing data
    /// arrives; after that, every mutation observed by the store delivers
    /// a fresh snapshot. A store holds at most one subscriber: a second
    /// call displaces the first, whose handle then reads end-of-stream.
    async fn subscribe(&self) -> Result<SnapshotHandle>;

    /// Persist a new record. The store assigns the identity and creation
    /// time and starts the record as not complete. Resolves with the new
    /// identity once the write is durable.
    async fn create(&self, draft: RecordDraft) -> Result<RecordId>;

    /// Merge `patch` into the record with identity `id`. Missing identity
    /// is a silent no-op, tolerating a delete racing this update.
    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<()>;

    /// Delete the record with identity `id`; no-op when absent.
    async fn remove(&self, id: &RecordId) -> Result<()>;

    /// Create one record per row. Rows without a creation time get "now".
    /// The subscriber sees exactly one snapshot delivery containing every
    /// imported row, not one delivery per row.
    async fn import_many(&self, rows: Vec<ImportRecord>) -> Result<()>;
}

/// Evaluate the configuration block and open the chosen variant.
///
/// Called once at startup; the choice is never re-evaluated. Consumers
/// keep the returned handle for the process lifetime and can read the
/// variant back via [`RecordStore::backend`], nothing more.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    if config.remote.is_configured() {
        let hub = CollectionHub::attach(&config.remote);
        Ok(Arc::new(RemoteStore::new(Arc::new(hub))))
    } else {
        Ok(Arc::new(LocalStore::open(config.local.clone()).await?))
    }
}
