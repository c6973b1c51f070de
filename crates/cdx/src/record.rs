// ai
//! 📦 Records: the building blocks of cdx.
//!
//! 🎬 COLD OPEN: INT. SOMEONE ELSE'S API, 3:47 AM
//!
//! The JSON arrives. Some keys have spaces. Some have emoji. One of them is
//! literally called `"2nd Address Line (optional!!)"`. A CSV shows up right
//! behind it holding a number that is secretly a string. Nobody at the party
//! agrees on a schema.
//!
//! ✅ And then a [`Record`] walks in. It does not care what you called your
//! columns. It holds an `id`, an ordered list of fields, and a tiny tagged
//! union of values. That is the whole personality.
//!
//! 🦆
//!
//! 🧠 Knowledge graph:
//! - Adapters emit [`RawRecord`]s (plain `serde_json` maps, untouched).
//! - `normalize` turns those into [`Record`]s (sanitized keys, guaranteed id).
//! - Search, sort and the presentation layer only ever see [`Record`]s.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// 📦 What an adapter hands back before anybody tidies it up.
/// One JSON object per row, keys exactly as the source spelled them, in the
/// order it sent them (serde_json is built with `preserve_order`).
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// 🎯 The small tagged union every field value lands in.
///
/// Scalars get their own variant. Arrays and objects that survive normalization
/// ride along in `Nested` untouched, because flattening someone's nested JSON
/// without being asked is how you end up in a post-mortem.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Nested(serde_json::Value),
}

impl FieldValue {
    /// 📝 The text a human (or the fuzzy matcher) sees for this value.
    ///
    /// `Null` renders as empty. Whole numbers drop the `.0` because "10.0 widgets"
    /// reads like a rounding error with ambitions.
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::String(s) => s.clone(),
            FieldValue::Nested(v) => v.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

fn format_number(n: f64) -> String {
    // -- 🔢 integral and small enough to survive an i64 round trip? print it like one.
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            // -- ⚠️ u64 beyond 2^53 loses precision here. if your ids are that big, use strings. please.
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
            serde_json::Value::String(s) => FieldValue::String(s),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                FieldValue::Nested(nested)
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Nested(v) => v.serialize(serializer),
        }
    }
}

/// 🎯 One normalized row. One id, one destiny, zero schema guarantees.
///
/// Fields keep the order the source gave them, which matters: the first
/// record's key order decides the default search keys and the table columns.
/// A `Vec` of pairs beats a map here because rows are small and order is a feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// The record's identity. Unique within one fetch result, not across the universe.
    pub id: String,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// 🏗️ Builder-ish helper, mostly so tests don't turn into paragraphs.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// 🔄 Insert or replace. Replacing keeps the original position in the row.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // 📦 flat object, fields in source order. `id` is already one of the fields
        // after normalization, so we don't write it twice.
        let has_id_field = self.get("id").is_some();
        let extra = usize::from(!has_id_field);
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        if !has_id_field {
            map.serialize_entry("id", &self.id)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
