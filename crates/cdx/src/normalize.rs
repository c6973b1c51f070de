// ai
//! 🧹 normalize.rs: where wild field names get a haircut and a name tag.
//!
//! 🎬 *[a column named "Price (USD) 💸" enters the pipeline]*
//! *[it leaves as `Price_USD_`. it does not remember what happened.]*
//!
//! Three jobs, in order:
//! 1. 🏷️ sanitize every key into something identifier-safe ([`sanitize_property_name`])
//! 2. 🖼️ for external tables, squash attachment arrays into a single thumbnail URL
//! 3. 🆔 make sure every record has an `id` that is unique within the batch
//!
//! 🧠 Knowledge graph:
//! - Input: `RawRecord` from `sources::*`
//! - Output: `Record` consumed by `search`, `sort`, and whoever renders
//! - Policy: identifier escaping, not camelCase. One policy, documented, done.
//! - Idempotent: feed a normalized record back in and nothing moves. 🦆

use std::collections::HashSet;

use crate::record::{FieldValue, RawRecord, Record};
use crate::sources::ImageSize;

/// 🏷️ What we glue onto names that start with something an identifier can't start with.
const MARKER: char = '_';

/// Length of a synthetic id. Five chars of hex is plenty for one batch.
const SYNTHETIC_ID_LEN: usize = 5;

const fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

const fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// 🏷️ Turn any field name into an identifier-safe key.
///
/// Trim, replace anything outside `[A-Za-z0-9_$]` with `_`, prefix `_` when the
/// name can't start an identifier (digits, symbols, empty), collapse `_` runs.
///
/// ```text
/// "first name"   → "first_name"
/// "2nd address"  → "_2nd_address"
/// "Price (USD)"  → "Price_USD_"
/// ```
///
/// Running it twice gives the same answer as running it once.
pub fn sanitize_property_name(name: &str) -> String {
    let trimmed = name.trim();
    let mut sanitized = String::with_capacity(trimmed.len() + 1);

    if !trimmed.chars().next().is_some_and(is_identifier_start) {
        sanitized.push(MARKER);
    }

    for c in trimmed.chars() {
        let c = if is_identifier_part(c) { c } else { '_' };
        // -- 🧹 no `__` allowed. one underscore is a separator, two is a cry for help.
        if c == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(c);
    }

    sanitized
}

/// 🖼️ Flatten external-table attachment fields into one URL per field.
///
/// A field qualifies when it is a non-empty array whose first element carries a
/// `thumbnails` object. It becomes `thumbnails[size].url` of that first element,
/// falling back to the attachment's own `url` when the requested size is absent.
/// Everything else passes through exactly as it came.
pub fn flatten_attachments(fields: RawRecord, size: ImageSize) -> RawRecord {
    fields
        .into_iter()
        .map(|(key, value)| {
            let flattened = attachment_url(&value, size).map(serde_json::Value::String);
            (key, flattened.unwrap_or(value))
        })
        .collect()
}

fn attachment_url(value: &serde_json::Value, size: ImageSize) -> Option<String> {
    let first = value.as_array()?.first()?;
    let thumbnails = first.get("thumbnails")?.as_object()?;
    thumbnails
        .get(size.key())
        .and_then(|thumb| thumb.get("url"))
        .or_else(|| first.get("url"))
        .and_then(|url| url.as_str())
        .map(str::to_string)
}

/// 🔄 Normalize a single raw row. The id comes from the row or gets synthesized
/// fresh, with no batch to check against. Prefer [`normalize_records`].
pub fn normalize_record(raw: RawRecord) -> Record {
    let mut taken = HashSet::new();
    normalize_with(raw, &mut taken)
}

/// 🚀 Normalize a whole batch: sanitized keys, converted values, unique ids.
///
/// Source ids are collected first so a synthetic id can never collide with one
/// that shows up later in the batch.
pub fn normalize_records(raw: Vec<RawRecord>) -> Vec<Record> {
    let mut taken: HashSet<String> = raw
        .iter()
        .filter_map(|row| {
            row.iter()
                .find(|(key, _)| sanitize_property_name(key) == "id")
                .and_then(|(_, value)| source_id(value))
        })
        .collect();

    raw.into_iter()
        .map(|row| normalize_with(row, &mut taken))
        .collect()
}

fn normalize_with(raw: RawRecord, taken: &mut HashSet<String>) -> Record {
    let mut record = Record::default();
    for (key, value) in raw {
        record.insert(sanitize_property_name(&key), FieldValue::from(value));
    }

    match record.get("id").and_then(field_id) {
        Some(id) => record.id = id,
        None => {
            let id = synthesize_id(taken);
            record.insert("id", id.as_str());
            record.id = id;
        }
    }

    record
}

fn source_id(value: &serde_json::Value) -> Option<String> {
    field_id(&FieldValue::from(value.clone()))
}

fn field_id(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        FieldValue::Number(_) => Some(value.display_text()),
        _ => None,
    }
}

fn synthesize_id(taken: &mut HashSet<String>) -> String {
    // -- 🎲 re-roll until it's fresh. with 16^5 options this loop runs once. basically always.
    loop {
        let candidate: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SYNTHETIC_ID_LEN)
            .collect();
        if taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}
