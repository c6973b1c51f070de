//! 🔌 Sources: where the records come from.
//!
//! 🚰 An adapter resolves a config into a URL, fetches the body, and parses it
//! into raw rows. It does not normalize, search, sort, or judge. It's a faucet,
//! not a chef.
//!
//! 🎭 This module is the casting agency. Need a JSON API? A CSV somebody
//! uploaded? A spreadsheet-as-a-service table? We've got an adapter for that.
//!
//! 🧠 Knowledge graph:
//! - Pattern: `SourceConfig` (serde enum) → `SourceBackend` (enum) → `SourceAdapter` impls
//! - Adapters share one [`Transport`] (reqwest client + local file reads)
//! - Output: `Vec<RawRecord>` → `normalize` → `search` → `sort`
//!
//! 🦆 The duck is here because every file must have one. This is law.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::SourceError;
use crate::record::RawRecord;

mod api;
mod external_table;
mod file;
mod transport;

pub use api::{ApiSource, ApiSourceConfig};
pub use external_table::{ExternalTableSource, ExternalTableSourceConfig};
pub use file::{FileSource, FileSourceConfig};
pub use transport::Transport;

/// 🚰 Anything that can turn a URL into raw rows.
///
/// # Contract 📜
/// - Stateless: same inputs, same network, same answer.
/// - 401/403 → [`SourceError::Authentication`], courtesy of [`Transport`].
/// - No normalization here. Keys arrive exactly as the source spelled them.
#[async_trait]
pub trait SourceAdapter: std::fmt::Debug + Send + Sync {
    async fn fetch_and_parse(
        &self,
        transport: &Transport,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Vec<RawRecord>, SourceError>;
}

/// 🧾 File flavors we can parse.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Json,
    Csv,
    Tsv,
}

impl FileType {
    pub fn title(self) -> &'static str {
        match self {
            FileType::Json => "JSON",
            FileType::Csv => "CSV",
            FileType::Tsv => "TSV",
        }
    }
}

/// 🖼️ Thumbnail sizes an external table hands out for attachments.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    #[default]
    Large,
}

impl ImageSize {
    pub fn key(self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Large => "large",
        }
    }
}

/// 🎭 Which source, and everything it needs to find its URL.
///
/// Externally tagged, so TOML reads `[source.Api]`, `[source.File]`,
/// `[source.ExternalTable]`. Exactly one URL per config, possibly none yet.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Api(ApiSourceConfig),
    File(FileSourceConfig),
    ExternalTable(ExternalTableSourceConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Api(ApiSourceConfig::default())
    }
}

impl SourceConfig {
    /// 🔎 The URL to fetch, or `None` when nobody filled it in yet.
    /// Unresolved is not an error. It's just an empty list waiting for a URL.
    pub fn resolve_url(&self) -> Option<&str> {
        let url = match self {
            SourceConfig::Api(c) => c.url.as_deref(),
            SourceConfig::File(c) => c.url.as_deref(),
            SourceConfig::ExternalTable(c) => c.url.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn title(&self) -> &'static str {
        match self {
            SourceConfig::Api(_) => "API",
            SourceConfig::File(_) => "File",
            SourceConfig::ExternalTable(_) => "External table",
        }
    }
}

/// 🎭 The many faces of a source, dispatched without a vtable.
#[derive(Debug, Clone)]
pub enum SourceBackend {
    Api(ApiSource),
    File(FileSource),
    ExternalTable(ExternalTableSource),
}

impl SourceBackend {
    pub fn from_config(config: &SourceConfig) -> Self {
        match config {
            SourceConfig::Api(c) => SourceBackend::Api(ApiSource::new(c)),
            SourceConfig::File(c) => SourceBackend::File(FileSource::new(c)),
            SourceConfig::ExternalTable(c) => {
                SourceBackend::ExternalTable(ExternalTableSource::new(c))
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for SourceBackend {
    async fn fetch_and_parse(
        &self,
        transport: &Transport,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        match self {
            SourceBackend::Api(s) => s.fetch_and_parse(transport, url, headers).await,
            SourceBackend::File(s) => s.fetch_and_parse(transport, url, headers).await,
            SourceBackend::ExternalTable(s) => s.fetch_and_parse(transport, url, headers).await,
        }
    }
}
