//! Local store variant: one durable blob on the local device.
//!
//! Every mutation is a read-modify-write of the entire record set
//! followed by a whole-blob rewrite; there is no partial write. The API
//! is asynchronous for parity with the remote variant, and each mutation
//! waits out a configurable artificial delay so consumer loading states
//! get exercised the same way they would against a network backend.

mod storage;

pub use storage::seed_records;
pub(crate) use storage::SlotFile;

use crate::config::LocalConfig;
use crate::error::Result;
use crate::store::{BackendKind, RecordStore};
use crate::subscriptions::{Snapshot, SnapshotHandle, SubscriberSlot};
use crate::types::{IdentityMint, ImportRecord, Record, RecordDraft, RecordId, RecordPatch, Timestamp};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

/// Store variant backed by a single slot file.
pub struct LocalStore {
    config: LocalConfig,
    slot: SlotFile,
    records: Mutex<Vec<Record>>,
    subscriber: SubscriberSlot,
    mint: IdentityMint,
}

impl LocalStore {
    /// Lock the slot file and load (or seed) the record set.
    pub async fn open(config: LocalConfig) -> Result<Self> {
        let (slot, records) = SlotFile::open(&config.path).await?;
        debug!(
            slot = %config.path.display(),
            records = records.len(),
            "opened local store"
        );
        Ok(Self {
            config,
            slot,
            records: Mutex::new(records),
            subscriber: SubscriberSlot::new(),
            mint: IdentityMint::new(),
        })
    }

    /// Rewrite the blob from the current in-memory set, then hand the
    /// subscriber a fresh snapshot.
    async fn persist_and_publish(&self) -> Result<()> {
        let records = self.records.lock().clone();
        self.slot.save(&records).await?;
        self.subscriber.publish(Snapshot::number(records));
        Ok(())
    }

    async fn simulate_latency(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn subscribe(&self) -> Result<SnapshotHandle> {
        let handle = self.subscriber.register();
        let records = self.records.lock().clone();
        self.subscriber.publish(Snapshot::number(records));
        Ok(handle)
    }

    async fn create(&self, draft: RecordDraft) -> Result<RecordId> {
        self.simulate_latency(self.config.write_delay).await;

        let created = Timestamp::now();
        let id = self.mint.next(created);
        let record = draft.into_record(id.clone(), created);

        self.records.lock().push(record);
        self.persist_and_publish().await?;

        debug!(id = %id, "created record");
        Ok(id)
    }

    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<()> {
        self.simulate_latency(self.config.write_delay).await;

        let matched = {
            let mut records = self.records.lock();
            match records.iter_mut().find(|record| &record.identity == id) {
                Some(record) => {
                    patch.apply_to(record);
                    true
                }
                None => false,
            }
        };

        // Missing target: success without a write or a delivery.
        if matched {
            self.persist_and_publish().await?;
            debug!(id = %id, "updated record");
        }
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<()> {
        self.simulate_latency(self.config.write_delay).await;

        let matched = {
            let mut records = self.records.lock();
            let before = records.len();
            records.retain(|record| &record.identity != id);
            records.len() != before
        };

        if matched {
            self.persist_and_publish().await?;
            debug!(id = %id, "removed record");
        }
        Ok(())
    }

    async fn import_many(&self, rows: Vec<ImportRecord>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.simulate_latency(self.config.import_delay).await;

        let now = Timestamp::now();
        let count = rows.len();
        {
            let mut records = self.records.lock();
            for row in rows {
                let created = row.created_at_millis.unwrap_or(now);
                let id = self.mint.next(created);
                records.push(row.into_record(id, created));
            }
        }

        // All rows land in one blob rewrite and one snapshot delivery.
        self.persist_and_publish().await?;
        debug!(count, "imported records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn empty_store(dir: &TempDir) -> LocalStore {
        let path = dir.path().join("records.json");
        std::fs::write(&path, b"[]").unwrap();
        LocalStore::open(LocalConfig::immediate(path)).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_store_delivers_seeds_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(LocalConfig::immediate(dir.path().join("records.json")))
            .await
            .unwrap();

        let mut handle = store.subscribe().await.unwrap();
        let snapshot = handle.next().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        // The name plate seed is newer than the number plate seed.
        assert_eq!(snapshot.records()[0].record.description, "House Name Plate");
        assert_eq!(snapshot.records()[0].serial, 2);
    }

    #[tokio::test]
    async fn test_mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let id = {
            let store = LocalStore::open(LocalConfig::immediate(&path)).await.unwrap();
            let id = store
                .create(RecordDraft {
                    plate_text: "LEB-777".into(),
                    ..Default::default()
                })
                .await
                .unwrap();
            store.update(&id, RecordPatch::completion(true)).await.unwrap();
            id
        };

        let store = LocalStore::open(LocalConfig::immediate(&path)).await.unwrap();
        let mut handle = store.subscribe().await.unwrap();
        let snapshot = handle.next().await.unwrap();
        let entry = snapshot.get(&id).unwrap();
        assert!(entry.record.is_complete);
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_blob_self_heals_on_next_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, b"\x00\x01 definitely not json").unwrap();

        let store = LocalStore::open(LocalConfig::immediate(&path)).await.unwrap();
        store
            .create(RecordDraft {
                description: "fresh start".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        // The bad blob was overwritten with a valid array.
        let records: Vec<Record> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "fresh start");
    }

    #[tokio::test]
    async fn test_update_missing_id_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir).await;
        let mut handle = store.subscribe().await.unwrap();
        assert!(handle.next().await.unwrap().is_empty());

        store
            .update(&RecordId("ghost".into()), RecordPatch::completion(true))
            .await
            .unwrap();
        store.remove(&RecordId("ghost".into())).await.unwrap();

        // No delivery happened for either no-op.
        assert!(handle.try_next().is_none());
    }
}
