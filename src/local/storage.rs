//! The slot file: one durable blob holding the whole record set.

use crate::error::{Result, StoreError};
use crate::types::{Record, RecordId, Timestamp, WorkCategory};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Exclusive handle on the slot file.
///
/// The record set is serialized as one JSON array of records; every save
/// rewrites the entire blob. An `fs2` lock beside the slot keeps other
/// processes from writing the backing medium directly.
pub struct SlotFile {
    path: PathBuf,
    _lock_file: File,
}

impl SlotFile {
    /// Lock the slot and read its contents.
    ///
    /// A missing slot is seeded with the example records and persisted
    /// right away. A blob that fails to parse is logged and treated as an
    /// empty record set; the next save overwrites it.
    pub async fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<Record>)> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let slot = Self {
            _lock_file: Self::acquire_lock(&path)?,
            path,
        };

        let records = match tokio::fs::read(&slot.path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<Record>>(&bytes) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        slot = %slot.path.display(),
                        error = %e,
                        "slot blob is malformed, starting from an empty record set"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let seeds = seed_records();
                slot.save(&seeds).await?;
                seeds
            }
            Err(e) => return Err(e.into()),
        };

        Ok((slot, records))
    }

    /// Rewrite the whole blob. Writes a sibling temp file first and
    /// renames it over the slot, so a crash mid-write leaves the previous
    /// blob intact.
    pub async fn save(&self, records: &[Record]) -> Result<()> {
        let blob = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, blob).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_path = path.with_extension("lock");
        let lock_file = File::create(lock_path)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

/// Example records a brand-new slot starts with, so the dashboard has
/// something to show on first launch.
pub fn seed_records() -> Vec<Record> {
    vec![
        Record {
            identity: RecordId("1".into()),
            plate_text: "MH12AB1234".into(),
            sticker_text: "VIP".into(),
            description: "Honda City".into(),
            phone: "9876543210".into(),
            work_category: WorkCategory::NumberPlate,
            created_at_millis: Timestamp(1_698_314_400_000),
            advance_amount: 500,
            balance_amount: 200,
            is_complete: false,
            image_ref: None,
        },
        Record {
            identity: RecordId("2".into()),
            plate_text: "The Smiths".into(),
            sticker_text: String::new(),
            description: "House Name Plate".into(),
            phone: "9876512345".into(),
            work_category: WorkCategory::NamePlate,
            created_at_millis: Timestamp(1_698_319_800_000),
            advance_amount: 1000,
            balance_amount: 0,
            is_complete: true,
            image_ref: None,
        },
    ]
}
