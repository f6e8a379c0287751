//! Core types for the job-log store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a record, assigned by the store on creation.
///
/// Opaque to consumers; never reassigned for the lifetime of a store
/// instance.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_millis() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Mints record identities: creation millis plus a per-store counter, so
/// two records minted in the same millisecond still differ.
pub(crate) struct IdentityMint {
    counter: AtomicU64,
}

impl IdentityMint {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Mint a fresh identity stamped with `at`.
    pub fn next(&self, at: Timestamp) -> RecordId {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        RecordId(format!("{:x}-{:04x}", at.0, seq))
    }
}

/// The kind of work a job entry is for. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkCategory {
    #[serde(rename = "Number Plate")]
    NumberPlate,
    #[serde(rename = "Name Plate")]
    NamePlate,
    Sticker,
    Other,
}

impl WorkCategory {
    /// All categories, in display order.
    pub const ALL: [WorkCategory; 4] = [
        WorkCategory::NumberPlate,
        WorkCategory::NamePlate,
        WorkCategory::Sticker,
        WorkCategory::Other,
    ];

    /// Human-facing label; also the wire representation.
    pub fn label(&self) -> &'static str {
        match self {
            WorkCategory::NumberPlate => "Number Plate",
            WorkCategory::NamePlate => "Name Plate",
            WorkCategory::Sticker => "Sticker",
            WorkCategory::Other => "Other",
        }
    }

    /// Parse a label, mapping anything unrecognized to `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == s)
            .unwrap_or(WorkCategory::Other)
    }
}

impl Default for WorkCategory {
    fn default() -> Self {
        WorkCategory::Other
    }
}

impl fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One workshop job entry.
///
/// Serialized with the wire field names shared by the local blob and the
/// remote document shape (`plateText`, `createdAtMillis`, ...). The
/// position-derived display serial is never part of this struct; it is
/// attached at snapshot delivery (see [`crate::Snapshot`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier (assigned by the store).
    pub identity: RecordId,

    /// Number-plate text; may be empty.
    pub plate_text: String,

    /// Sticker text; may be empty.
    pub sticker_text: String,

    /// Free-form job description.
    pub description: String,

    /// Customer phone number, kept verbatim as entered.
    pub phone: String,

    /// What kind of work this entry is for.
    pub work_category: WorkCategory,

    /// When the record was created (assigned by the store, immutable).
    pub created_at_millis: Timestamp,

    /// Amount paid up front, in whole currency units.
    pub advance_amount: u64,

    /// Amount outstanding, in whole currency units.
    pub balance_amount: u64,

    /// Whether the job is done.
    pub is_complete: bool,

    /// Embedded data-encoded image or an external reference.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_ref: Option<String>,
}

impl Record {
    /// Phone number reduced to digits and `+`, for dialing or messaging
    /// links. `None` when nothing dialable remains.
    pub fn dialable_phone(&self) -> Option<String> {
        let cleaned: String = self
            .phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// Input for creating a new record (before identity and creation time are
/// assigned). Completion always starts out false.
#[derive(Clone, Debug, Default)]
pub struct RecordDraft {
    pub plate_text: String,
    pub sticker_text: String,
    pub description: String,
    pub phone: String,
    pub work_category: WorkCategory,
    pub advance_amount: u64,
    pub balance_amount: u64,
    pub image_ref: Option<String>,
}

impl RecordDraft {
    /// Materialize the draft into a record with store-assigned fields.
    pub(crate) fn into_record(self, identity: RecordId, created: Timestamp) -> Record {
        Record {
            identity,
            plate_text: self.plate_text,
            sticker_text: self.sticker_text,
            description: self.description,
            phone: self.phone,
            work_category: self.work_category,
            created_at_millis: created,
            advance_amount: self.advance_amount,
            balance_amount: self.balance_amount,
            is_complete: false,
            image_ref: self.image_ref,
        }
    }
}

/// Partial update for an existing record.
///
/// Unset fields are left alone. `image_ref` is doubly optional so a patch
/// can clear the image (`Some(None)`) as well as replace it. Identity and
/// creation time are not expressible here and therefore can never change.
#[derive(Clone, Debug, Default)]
pub struct RecordPatch {
    pub plate_text: Option<String>,
    pub sticker_text: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub work_category: Option<WorkCategory>,
    pub advance_amount: Option<u64>,
    pub balance_amount: Option<u64>,
    pub is_complete: Option<bool>,
    pub image_ref: Option<Option<String>>,
}

impl RecordPatch {
    /// Patch that only flips the completion flag (the dashboard's
    /// done/pending toggle).
    pub fn completion(done: bool) -> Self {
        Self {
            is_complete: Some(done),
            ..Default::default()
        }
    }

    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.plate_text.is_none()
            && self.sticker_text.is_none()
            && self.description.is_none()
            && self.phone.is_none()
            && self.work_category.is_none()
            && self.advance_amount.is_none()
            && self.balance_amount.is_none()
            && self.is_complete.is_none()
            && self.image_ref.is_none()
    }

    /// Merge the set fields into `record`.
    pub fn apply_to(&self, record: &mut Record) {
        if let Some(ref v) = self.plate_text {
            record.plate_text = v.clone();
        }
        if let Some(ref v) = self.sticker_text {
            record.sticker_text = v.clone();
        }
        if let Some(ref v) = self.description {
            record.description = v.clone();
        }
        if let Some(ref v) = self.phone {
            record.phone = v.clone();
        }
        if let Some(v) = self.work_category {
            record.work_category = v;
        }
        if let Some(v) = self.advance_amount {
            record.advance_amount = v;
        }
        if let Some(v) = self.balance_amount {
            record.balance_amount = v;
        }
        if let Some(v) = self.is_complete {
            record.is_complete = v;
        }
        if let Some(ref v) = self.image_ref {
            record.image_ref = v.clone();
        }
    }

    /// Render the set fields as a partial document for the remote merge
    /// path, keyed by wire field names. A cleared image becomes an
    /// explicit null so the backend removes the field.
    pub fn document_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(ref v) = self.plate_text {
            fields.insert("plateText".into(), Value::String(v.clone()));
        }
        if let Some(ref v) = self.sticker_text {
            fields.insert("stickerText".into(), Value::String(v.clone()));
        }
        if let Some(ref v) = self.description {
            fields.insert("description".into(), Value::String(v.clone()));
        }
        if let Some(ref v) = self.phone {
            fields.insert("phone".into(), Value::String(v.clone()));
        }
        if let Some(v) = self.work_category {
            fields.insert("workCategory".into(), Value::String(v.label().into()));
        }
        if let Some(v) = self.advance_amount {
            fields.insert("advanceAmount".into(), Value::from(v));
        }
        if let Some(v) = self.balance_amount {
            fields.insert("balanceAmount".into(), Value::from(v));
        }
        if let Some(v) = self.is_complete {
            fields.insert("isComplete".into(), Value::Bool(v));
        }
        if let Some(ref v) = self.image_ref {
            let value = match v {
                Some(url) => Value::String(url.clone()),
                None => Value::Null,
            };
            fields.insert("imageRef".into(), value);
        }
        fields
    }
}

/// One row of a bulk import.
///
/// Like a draft, but a row may carry its own creation time (the store
/// defaults it to "now" at the moment of import) and completion flag.
#[derive(Clone, Debug, Default)]
pub struct ImportRecord {
    pub plate_text: String,
    pub sticker_text: String,
    pub description: String,
    pub phone: String,
    pub work_category: WorkCategory,
    pub created_at_millis: Option<Timestamp>,
    pub advance_amount: u64,
    pub balance_amount: u64,
    pub is_complete: bool,
    pub image_ref: Option<String>,
}

impl ImportRecord {
    /// Materialize the row into a record. `created` must already be the
    /// resolved creation time (row-supplied or defaulted by the store).
    pub(crate) fn into_record(self, identity: RecordId, created: Timestamp) -> Record {
        Record {
            identity,
            plate_text: self.plate_text,
            sticker_text: self.sticker_text,
            description: self.description,
            phone: self.phone,
            work_category: self.work_category,
            created_at_millis: created,
            advance_amount: self.advance_amount,
            balance_amount: self.balance_amount,
            is_complete: self.is_complete,
            image_ref: self.image_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_mint_unique_within_one_millisecond() {
        let mint = IdentityMint::new();
        let at = Timestamp(1_000);
        let a = mint.next(at);
        let b = mint.next(at);
        assert_ne!(a, b);
    }

    #[test]
    fn test_category_labels_agree_with_serde() {
        for category in WorkCategory::ALL {
            let wire = serde_json::to_value(category).unwrap();
            assert_eq!(wire, json!(category.label()));
        }
    }

    #[test]
    fn test_category_parse_lenient_maps_unknown_to_other() {
        assert_eq!(
            WorkCategory::parse_lenient("Name Plate"),
            WorkCategory::NamePlate
        );
        assert_eq!(
            WorkCategory::parse_lenient("Chrome Wrap"),
            WorkCategory::Other
        );
        assert_eq!(WorkCategory::parse_lenient(""), WorkCategory::Other);
    }

    #[test]
    fn test_record_wire_field_names() {
        let record = RecordDraft {
            plate_text: "ABC123".into(),
            description: "Honda City".into(),
            ..Default::default()
        }
        .into_record(RecordId("r1".into()), Timestamp(42));

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        for name in [
            "identity",
            "plateText",
            "stickerText",
            "description",
            "phone",
            "workCategory",
            "createdAtMillis",
            "advanceAmount",
            "balanceAmount",
            "isComplete",
        ] {
            assert!(object.contains_key(name), "missing field {name}");
        }
        // Absent image is omitted, not null.
        assert!(!object.contains_key("imageRef"));
    }

    #[test]
    fn test_patch_apply_merges_only_set_fields() {
        let mut record = RecordDraft {
            plate_text: "ABC123".into(),
            phone: "0300 1234567".into(),
            advance_amount: 500,
            ..Default::default()
        }
        .into_record(RecordId("r1".into()), Timestamp(42));

        let patch = RecordPatch {
            balance_amount: Some(250),
            is_complete: Some(true),
            ..Default::default()
        };
        patch.apply_to(&mut record);

        assert_eq!(record.plate_text, "ABC123");
        assert_eq!(record.advance_amount, 500);
        assert_eq!(record.balance_amount, 250);
        assert!(record.is_complete);
    }

    #[test]
    fn test_patch_document_fields_clear_image() {
        let patch = RecordPatch {
            image_ref: Some(None),
            ..Default::default()
        };
        let fields = patch.document_fields();
        assert_eq!(fields.get("imageRef"), Some(&Value::Null));
    }

    #[test]
    fn test_dialable_phone_strips_formatting() {
        let mut record = RecordDraft::default().into_record(RecordId("r1".into()), Timestamp(0));
        record.phone = "+92 (300) 123-4567".into();
        assert_eq!(record.dialable_phone().as_deref(), Some("+923001234567"));

        record.phone = "call later".into();
        assert_eq!(record.dialable_phone(), None);
    }
}
