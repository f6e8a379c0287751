//! Mapping between exported CSV rows and import payloads.
//!
//! CSV tokenizing and text assembly belong to the view layer; what the
//! store accepts is the parsed row, header name to cell value. This
//! module turns one such row into an [`ImportRecord`] with the lenient
//! semantics the dashboard relies on: unknown work types become `Other`,
//! unparseable amounts become 0, and a row without a usable timestamp is
//! stamped at import time.

use crate::types::{ImportRecord, Timestamp, WorkCategory};
use chrono::DateTime;
use std::collections::HashMap;

/// Column headers of the interchange format.
pub mod columns {
    pub const PLATE: &str = "Number Plate";
    pub const STICKER: &str = "Sticker";
    pub const DESCRIPTION: &str = "Description";
    pub const PHONE: &str = "Phone Number";
    pub const WORK_TYPE: &str = "Work Type";
    pub const DATE_TIME: &str = "Date & Time";
    pub const STATUS: &str = "Status";
    pub const ADVANCE: &str = "Advance";
    pub const BALANCE: &str = "Baqaya";
    pub const IMAGE: &str = "Image URL";
}

/// Convert one parsed CSV row into an import payload.
pub fn row_to_import(row: &HashMap<String, String>) -> ImportRecord {
    let cell = |name: &str| row.get(name).map(String::as_str).unwrap_or("");

    let image = cell(columns::IMAGE);
    ImportRecord {
        plate_text: cell(columns::PLATE).to_owned(),
        sticker_text: cell(columns::STICKER).to_owned(),
        description: cell(columns::DESCRIPTION).to_owned(),
        phone: cell(columns::PHONE).to_owned(),
        work_category: WorkCategory::parse_lenient(cell(columns::WORK_TYPE)),
        created_at_millis: parse_timestamp(cell(columns::DATE_TIME)),
        advance_amount: parse_amount(cell(columns::ADVANCE)),
        balance_amount: parse_amount(cell(columns::BALANCE)),
        is_complete: cell(columns::STATUS).eq_ignore_ascii_case("complete"),
        image_ref: if image.is_empty() {
            None
        } else {
            Some(image.to_owned())
        },
    }
}

/// Amount cell: whole units, falling back to 0 on anything unparseable.
/// Fractional inputs are truncated, negative ones clamped.
fn parse_amount(cell: &str) -> u64 {
    let cell = cell.trim();
    if let Ok(value) = cell.parse::<u64>() {
        return value;
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

/// Timestamp cell: epoch milliseconds or an RFC 3339 instant. `None`
/// leaves the creation time for the store to default at import.
fn parse_timestamp(cell: &str) -> Option<Timestamp> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(millis) = cell.parse::<i64>() {
        return Some(Timestamp(millis));
    }
    DateTime::parse_from_rfc3339(cell)
        .ok()
        .map(|instant| Timestamp(instant.timestamp_millis()))
}
