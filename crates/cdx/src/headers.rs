//! 🔒 Request headers: the little notes we tape to every outgoing GET.
//!
//! Headers arrive three ways: an `authorization` shortcut, a proper map, and
//! raw `"Name: Value"` strings pasted in by someone who copied them from curl.
//! The raw ones get parsed and anything malformed is quietly dropped.

use std::collections::BTreeMap;

use serde::Deserialize;

/// 🔧 Header knobs from config. All optional, all mergeable.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct HeaderConfig {
    /// 🔒 Sent as `Authorization` verbatim. Bring your own `Bearer `.
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// 📋 `"Name: Value"` lines, parsed by [`parse_http_headers`].
    #[serde(default)]
    pub raw: Vec<String>,
}

impl HeaderConfig {
    /// 🔄 Flatten everything into one map. Later layers win: map, then
    /// `authorization`, then raw lines.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = self.headers.clone();
        if let Some(auth) = self.authorization.as_deref().filter(|a| !a.trim().is_empty()) {
            merged.insert("Authorization".to_string(), auth.trim().to_string());
        }
        merged.extend(parse_http_headers(&self.raw));
        merged
    }
}

/// 📋 Parse `"Name: Value"` strings. Splits on the first colon, trims both sides,
/// drops entries with no colon or an empty half.
pub fn parse_http_headers(unparsed: &[String]) -> BTreeMap<String, String> {
    unparsed
        .iter()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
