//! The seam to the hosted document collection.

use crate::error::{Result, StoreError};
use crate::types::{ImportRecord, Record, RecordDraft, RecordId, Timestamp, WorkCategory};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedReceiver;

/// One record as stored in the hosted collection.
///
/// The identity is the document's own key and the display serial is never
/// stored, so neither appears here. Field names match the local blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDocument {
    pub plate_text: String,
    pub sticker_text: String,
    pub description: String,
    pub phone: String,
    pub work_category: WorkCategory,
    pub created_at_millis: Timestamp,
    pub advance_amount: u64,
    pub balance_amount: u64,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_ref: Option<String>,
}

impl RecordDocument {
    /// Document for a freshly created record. Completion starts false.
    pub fn from_draft(draft: RecordDraft, created: Timestamp) -> Self {
        Self {
            plate_text: draft.plate_text,
            sticker_text: draft.sticker_text,
            description: draft.description,
            phone: draft.phone,
            work_category: draft.work_category,
            created_at_millis: created,
            advance_amount: draft.advance_amount,
            balance_amount: draft.balance_amount,
            is_complete: false,
            image_ref: draft.image_ref,
        }
    }

    /// Document for one imported row. `created` must already be resolved.
    pub fn from_import(row: ImportRecord, created: Timestamp) -> Self {
        Self {
            plate_text: row.plate_text,
            sticker_text: row.sticker_text,
            description: row.description,
            phone: row.phone,
            work_category: row.work_category,
            created_at_millis: created,
            advance_amount: row.advance_amount,
            balance_amount: row.balance_amount,
            is_complete: row.is_complete,
            image_ref: row.image_ref,
        }
    }

    /// Rejoin a document with its key.
    pub fn into_record(self, identity: RecordId) -> Record {
        Record {
            identity,
            plate_text: self.plate_text,
            sticker_text: self.sticker_text,
            description: self.description,
            phone: self.phone,
            work_category: self.work_category,
            created_at_millis: self.created_at_millis,
            advance_amount: self.advance_amount,
            balance_amount: self.balance_amount,
            is_complete: self.is_complete,
            image_ref: self.image_ref,
        }
    }

    /// Apply a partial field map (wire field names). A null value removes
    /// the field, which is how an image reference gets cleared.
    pub fn merged(&self, fields: &Map<String, Value>) -> Result<Self> {
        let mut value = serde_json::to_value(self)?;
        let object = match value.as_object_mut() {
            Some(object) => object,
            None => {
                return Err(StoreError::Serialization(
                    "document did not serialize to an object".into(),
                ))
            }
        };
        for (name, field) in fields {
            if field.is_null() {
                object.remove(name);
            } else {
                object.insert(name.clone(), field.clone());
            }
        }
        serde_json::from_value(value).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

/// Push stream of full, ordered document sets.
///
/// The backing collection re-delivers the whole set (sorted by creation
/// time, newest first) after every change by any client, starting with
/// one delivery of the current set when the watch opens.
pub struct DocumentWatch {
    receiver: UnboundedReceiver<Vec<(RecordId, RecordDocument)>>,
}

impl DocumentWatch {
    pub fn new(receiver: UnboundedReceiver<Vec<(RecordId, RecordDocument)>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next full document set. `None` once the collection is
    /// gone.
    pub async fn next_set(&mut self) -> Option<Vec<(RecordId, RecordDocument)>> {
        self.receiver.recv().await
    }
}

/// Client interface to a server-hosted, multi-writer document collection.
///
/// [`crate::RemoteStore`] drives this trait; the crate ships the
/// in-process [`crate::CollectionHub`], and a network binding slots in
/// the same way. Implementations must treat `merge`/`delete` against a
/// missing document as a silent success.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Insert one document under `id`. Acknowledged when durable.
    async fn insert(&self, id: RecordId, doc: RecordDocument) -> Result<()>;

    /// Insert a batch. All documents are written concurrently, and
    /// watchers observe the whole batch as a single change.
    async fn insert_many(&self, docs: Vec<(RecordId, RecordDocument)>) -> Result<()>;

    /// Merge partial fields into the document under `id`; no-op when the
    /// document does not exist.
    async fn merge(&self, id: &RecordId, fields: Map<String, Value>) -> Result<()>;

    /// Delete the document under `id`; no-op when absent.
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Open the push subscription.
    async fn watch(&self) -> Result<DocumentWatch>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> RecordDocument {
        RecordDocument::from_draft(
            RecordDraft {
                plate_text: "ABC123".into(),
                phone: "0300-1112223".into(),
                advance_amount: 500,
                image_ref: Some("https://img.example/1.png".into()),
                ..Default::default()
            },
            Timestamp(42),
        )
    }

    #[test]
    fn test_merge_replaces_only_named_fields() {
        let doc = document();
        let mut fields = Map::new();
        fields.insert("isComplete".into(), Value::Bool(true));
        fields.insert("balanceAmount".into(), Value::from(75u64));

        let merged = doc.merged(&fields).unwrap();
        assert!(merged.is_complete);
        assert_eq!(merged.balance_amount, 75);
        assert_eq!(merged.plate_text, "ABC123");
        assert_eq!(merged.created_at_millis, Timestamp(42));
    }

    #[test]
    fn test_merge_null_clears_image() {
        let doc = document();
        let mut fields = Map::new();
        fields.insert("imageRef".into(), Value::Null);

        let merged = doc.merged(&fields).unwrap();
        assert_eq!(merged.image_ref, None);
    }

    #[test]
    fn test_document_round_trips_through_record() {
        let doc = document();
        let record = doc.clone().into_record(RecordId("d1".into()));
        assert_eq!(record.identity, RecordId("d1".into()));
        assert_eq!(record.plate_text, doc.plate_text);
        assert_eq!(record.created_at_millis, doc.created_at_millis);
        assert_eq!(record.image_ref, doc.image_ref);
    }
}
