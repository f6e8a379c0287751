//! Snapshot shape and serial numbering.

use crate::types::{Record, RecordId};

/// A record paired with its display serial.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberedRecord {
    /// Position-derived sequence number: the newest record in a snapshot
    /// of N records carries serial N, the oldest carries 1. Dense and
    /// contiguous for the current snapshot only; never persisted.
    pub serial: u32,
    pub record: Record,
}

/// The full, ordered record set delivered to a subscriber.
///
/// Records are sorted by creation time, newest first. Serials shift when
/// records are added or removed; that is part of the contract, which is
/// why they are recomputed on every delivery instead of stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<NumberedRecord>,
}

impl Snapshot {
    /// Sort `records` newest-first and attach serials.
    ///
    /// The sort is stable, so records sharing a creation millisecond keep
    /// the order the backend handed them in.
    pub fn number(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| b.created_at_millis.cmp(&a.created_at_millis));
        let count = records.len() as u32;
        let records = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| NumberedRecord {
                serial: count - position as u32,
                record,
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in delivery order (newest first).
    pub fn records(&self) -> &[NumberedRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &NumberedRecord> {
        self.records.iter()
    }

    /// Look up one entry by identity.
    pub fn get(&self, id: &RecordId) -> Option<&NumberedRecord> {
        self.records.iter().find(|entry| &entry.record.identity == id)
    }
}
