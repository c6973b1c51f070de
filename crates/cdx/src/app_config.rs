//! 🔧 App Configuration: TOML and env vars in, one typed struct out.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because hand-parsing `CDX_SEARCH__TERM` is a hobby
//! nobody should have.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::headers::HeaderConfig;
use crate::layout::LayoutConfig;
use crate::pipeline::FetchRequest;
use crate::record::RawRecord;
use crate::search::SearchParams;
use crate::sort::SortParams;
use crate::sources::SourceConfig;

/// ⏳ How long the loading state has to stay on screen, at minimum.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingConfig {
    #[serde(default)]
    pub min_duration_ms: u64,
}

/// 🎭 Presentation mode. Debug shows layout margins and the raw records.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComponentMode {
    #[default]
    #[serde(rename = "default", alias = "normal")]
    Normal,
    Debug,
}

/// 📦 One struct to rule them all. Only `source` is mandatory; everything
/// else has a default that does the unsurprising thing.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where the records come from.
    pub source: SourceConfig,
    #[serde(default)]
    pub http: HeaderConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub search: SearchParams,
    #[serde(default)]
    pub sort: SortParams,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub mode: ComponentMode,
    /// 🎭 Inline rows. When present, the source URL is never fetched.
    #[serde(default)]
    pub data: Option<Vec<RawRecord>>,
}

impl AppConfig {
    /// 📦 The part of the config that decides what gets fetched.
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            source: self.source.clone(),
            headers: self.http.clone(),
            data_override: self.data.clone(),
            min_loading: Duration::from_millis(self.loading.min_duration_ms),
        }
    }
}

/// 🚀 Load the config: env vars (`CDX_*`, `__` for nesting) plus an optional TOML file.
///
/// - `None` → env vars only. No implicit `config.toml`.
/// - `Some(path)` → env vars and the file, merged. The file wins on conflicts.
///
/// 💀 Errors carry the file path and the prefix, so you know where to look.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("CDX_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (CDX_*). \
             Is there a [source.Api], [source.File] or [source.ExternalTable] table in it?",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (CDX_*). \
                 No file was provided, so the env had to carry the whole show. It didn't."
            .to_string(),
    };

    config.extract().context(context_msg)
}
