// ai
//! 📡 The API adapter: GET a URL, find the array, hand it over.
//!
//! With no data key, the whole body has to be the array. With a data key like
//! `payload.items[0].rows`, we walk the path first. If the walk ends at nothing,
//! that's [`SourceError::DataKeyNotFound`], because a typo in the data key
//! deserves a better error than "0 results". 🦆

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{SourceAdapter, Transport};
use crate::errors::SourceError;
use crate::record::RawRecord;

// -- 📡 ApiSourceConfig lives next to the adapter that reads it. no scavenger hunts at 2am.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ApiSourceConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// 🗝️ Path to the record array inside the response, e.g. `data` or `payload.items[0].rows`.
    #[serde(default)]
    pub data_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiSource {
    data_key: Option<String>,
}

impl ApiSource {
    pub fn new(config: &ApiSourceConfig) -> Self {
        Self {
            data_key: config
                .data_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        }
    }

    /// 🔄 Parse a response body, honoring the data key if there is one.
    pub fn parse(&self, body: impl AsRef<[u8]>) -> Result<Vec<RawRecord>, SourceError> {
        let parsed: Value = serde_json::from_slice(body.as_ref())
            .map_err(|e| SourceError::parse("JSON", "InvalidJson", e.to_string()))?;

        let Some(key) = self.data_key.as_deref() else {
            return records_from_array(parsed, "JSON");
        };

        let picked = pick_path(&parsed, key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| SourceError::DataKeyNotFound {
                key: key.to_string(),
            })?;
        records_from_array(picked.clone(), "JSON")
    }
}

#[async_trait]
impl SourceAdapter for ApiSource {
    async fn fetch_and_parse(
        &self,
        transport: &Transport,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let body = transport.fetch_body(url, headers, "API").await?;
        self.parse(body)
    }
}

/// 📦 "Is this an array of objects?" Yes → records. No → a parse error with feelings.
pub(crate) fn records_from_array(value: Value, format: &str) -> Result<Vec<RawRecord>, SourceError> {
    let Value::Array(items) = value else {
        return Err(SourceError::parse(
            format,
            "NotAnArray",
            format!("expected an array of records, found {}", kind_of(&value)),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(SourceError::parse(
                format,
                "NotAnObject",
                format!("record {index} is {}, not an object", kind_of(&other)),
            )),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// 🗝️ Walk `a.b[0].c` into a JSON value.
///
/// A key that literally exists on the root (dots and all) wins over path
/// splitting. Numeric keys index into arrays, so `items.0` works too.
fn pick_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(direct) = root.as_object().and_then(|o| o.get(path)) {
        return Some(direct);
    }

    parse_path(path)?
        .into_iter()
        .try_fold(root, |current, segment| match (segment, current) {
            (Segment::Index(i), Value::Array(items)) => items.get(i),
            (Segment::Key(k), Value::Object(map)) => map.get(&k),
            (Segment::Key(k), Value::Array(items)) => items.get(k.parse::<usize>().ok()?),
            _ => None,
        })
}

fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
            }
            '[' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
                let digits: String = chars.by_ref().take_while(|c| *c != ']').collect();
                segments.push(Segment::Index(digits.trim().parse().ok()?));
            }
            other => key.push(other),
        }
    }
    if !key.is_empty() {
        segments.push(Segment::Key(key));
    }

    (!segments.is_empty()).then_some(segments)
}
