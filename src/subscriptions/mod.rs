//! Live snapshot delivery.
//!
//! Both store variants notify their consumer the same way: a single
//! subscriber slot per store instance that re-delivers the full, sorted
//! record set whenever the underlying data changes. There is no diff or
//! patch stream; every delivery is the whole truth.

mod slot;
mod snapshot;

pub use slot::SnapshotHandle;
pub(crate) use slot::SubscriberSlot;
pub use snapshot::{NumberedRecord, Snapshot};
