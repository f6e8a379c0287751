//! # Plate Log
//!
//! A job record store for a number-plate and sticker workshop: persist
//! log entries, stream live snapshots to the dashboard, and swap between
//! a local durable blob and a cloud-synced document collection behind
//! one contract.
//!
//! ## Core Concepts
//!
//! - **Records**: one workshop job each, identified and timestamped by
//!   the store
//! - **Snapshots**: the full record set, newest first, with display
//!   serials derived from position on every delivery
//! - **Variants**: local slot file or hosted collection, chosen once at
//!   startup from static configuration
//! - **Single subscriber**: each store pushes every change to one live
//!   listener
//!
//! ## Example
//!
//! ```ignore
//! use platelog::{open_store, RecordDraft, StoreConfig, WorkCategory};
//!
//! let store = open_store(&StoreConfig::default()).await?;
//!
//! let mut feed = store.subscribe().await?;
//!
//! let id = store
//!     .create(RecordDraft {
//!         plate_text: "MH12AB1234".into(),
//!         description: "Honda City".into(),
//!         work_category: WorkCategory::NumberPlate,
//!         advance_amount: 500,
//!         balance_amount: 200,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let snapshot = feed.next().await.unwrap();
//! assert_eq!(snapshot.get(&id).unwrap().serial, snapshot.len() as u32);
//! ```

pub mod config;
pub mod error;
pub mod interchange;
pub mod local;
pub mod remote;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use config::{LocalConfig, RemoteConfig, StoreConfig};
pub use error::{Result, StoreError};
pub use local::LocalStore;
pub use remote::{CollectionHub, DocumentBackend, DocumentWatch, RecordDocument, RemoteStore};
pub use store::{open_store, BackendKind, RecordStore};
pub use subscriptions::{NumberedRecord, Snapshot, SnapshotHandle};
pub use types::{
    ImportRecord, Record, RecordDraft, RecordId, RecordPatch, Timestamp, WorkCategory,
};
