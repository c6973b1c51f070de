// ai
//! 📡 transport.rs: the one place that actually talks to the outside world.
//!
//! `http(s)://` goes over the wire with reqwest. Anything else is treated as a
//! path on local disk and read with tokio, because "I uploaded a CSV" should not
//! require standing up a web server. 🦆
//!
//! 🔒 401 and 403 become [`SourceError::Authentication`]. Every other status is
//! the parser's problem: a 500 with an HTML error page will fail loudly enough
//! on its own once somebody tries to read it as JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use tracing::{debug, trace};

use crate::errors::SourceError;

/// 📡 Shared HTTP client plus the local-file escape hatch.
///
/// Cheap to clone: `reqwest::Client` is an `Arc` on the inside. Build one, reuse
/// it for every attempt. A new client per request is the networking equivalent
/// of buying a new car every time you need groceries.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    /// 🚀 10 s to connect, 30 s for the whole round trip. We will wait, but not forever.
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context(
                "💀 The HTTP client refused to be born. Probably a missing TLS cert or a \
                 cursed system trust store. Either way: no fetching today.",
            )?;
        Ok(Self { client })
    }

    /// 📄 Fetch the raw body behind `url`.
    ///
    /// Bytes, not text: decoding is the parser's job, so a bad byte becomes a
    /// parse error instead of a silent U+FFFD.
    ///
    /// `source_title` only exists so an auth failure can say which source tripped.
    pub async fn fetch_body(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        source_title: &str,
    ) -> Result<Vec<u8>, SourceError> {
        if !is_http(url) {
            return read_local(url).await;
        }

        debug!("📡 GET {} ({} headers)", url, headers.len());
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Authentication {
                status: status.as_u16(),
                source_title: source_title.to_string(),
            });
        }
        if !status.is_success() {
            // -- ⚠️ not special. the parser gets to deliver the bad news.
            debug!("⚠️ {} answered {}, handing the body to the parser anyway", url, status);
        }

        let body = response.bytes().await?.to_vec();
        trace!("📖 hauled {} bytes out of {}", body.len(), url);
        Ok(body)
    }
}

fn is_http(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

async fn read_local(url: &str) -> Result<Vec<u8>, SourceError> {
    let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
    debug!("📂 reading {}", path.display());
    let body = tokio::fs::read(&path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
    trace!("📖 hauled {} bytes out of {}", body.len(), path.display());
    Ok(body)
}
