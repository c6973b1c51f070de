//! 📋 cdx: remote list data, fetched, tidied, searched, sorted, laid out.
//!
//! ```text
//!   SourceConfig ──► sources (API / File / ExternalTable) ──► normalize
//!                                                                │
//!          layout ◄── PipelineSnapshot ◄── sort ◄── search ◄─────┘
//! ```
//!
//! The [`pipeline::Pipeline`] owns the sequence. Everything else is a plain
//! function or a small adapter you can call on its own. 🦆

pub mod app_config;
pub mod errors;
pub mod headers;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod search;
pub mod sort;
pub mod sources;

use anyhow::{Context, Result, bail};

use crate::app_config::AppConfig;
use crate::errors::AttemptFailed;
use crate::pipeline::{FetchRequest, FetchStatus, Pipeline, PipelineHooks, PipelineSnapshot};
use crate::sources::Transport;

pub use crate::errors::SourceError;
pub use crate::record::{FieldValue, RawRecord, Record};

/// 🏗️ A pipeline primed with the config's search and sort, not yet loading anything.
pub fn build_pipeline(app_config: &AppConfig, hooks: PipelineHooks) -> Result<Pipeline> {
    let transport = Transport::new().context("💀 Couldn't build the HTTP transport for the pipeline")?;
    let pipeline = Pipeline::new(transport, hooks);
    pipeline.set_search(app_config.search.clone());
    pipeline.set_sort(app_config.sort.clone());
    Ok(pipeline)
}

/// 🚀 Run one attempt to completion and hand back what the screen would show.
///
/// A failed attempt becomes an `Err` wrapping [`AttemptFailed`], with the source
/// named in the context. Downcast through the chain to read the auth flag.
pub async fn run(pipeline: &Pipeline, request: FetchRequest) -> Result<PipelineSnapshot> {
    let source_title = request.source.title();
    if let Some(handle) = pipeline.load(request) {
        handle
            .await
            .context("💀 The fetch task died before it could report back")?;
    }

    let snapshot = pipeline.snapshot();
    if snapshot.status == FetchStatus::Failed {
        let failed = AttemptFailed {
            message: snapshot.error.clone().unwrap_or_default(),
            auth_failed: snapshot.auth_failed,
        };
        return Err(anyhow::Error::new(failed))
            .with_context(|| format!("💀 Loading records from the {source_title} source failed"));
    }
    if snapshot.is_loading() {
        bail!("💀 The pipeline is still loading after its attempt finished. A newer attempt must have started.");
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchParams;
    use crate::sort::{SortDirection, SortParams};
    use crate::sources::{SourceConfig, FileSourceConfig};
    use figment::{Figment, providers::{Format, Toml}};
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(toml: &str) -> AppConfig {
        Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .expect("💀 test config should parse")
    }

    #[tokio::test]
    async fn the_one_where_a_csv_goes_all_the_way_through() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("name,price\nWidget,10\nGadget,5\nWidget Pro,20\n"),
            )
            .mount(&server)
            .await;

        let mut app_config = config_for(
            r#"
            [source.File]
            file_type = "csv"
            "#,
        );
        app_config.source = SourceConfig::File(FileSourceConfig {
            url: Some(format!("{}/products", server.uri())),
            file_type: Some(crate::sources::FileType::Csv),
        });
        app_config.search = SearchParams::for_term("widget");
        app_config.sort = SortParams::by("price", SortDirection::Descending);

        let pipeline = build_pipeline(&app_config, PipelineHooks::default())?;
        let snapshot = run(&pipeline, app_config.fetch_request()).await?;

        assert_eq!(snapshot.status, FetchStatus::Ready);
        let names: Vec<String> = snapshot
            .records
            .iter()
            .filter_map(|r| r.get("name").map(|v| v.display_text()))
            .collect();
        assert_eq!(names, vec!["Widget Pro", "Widget"]);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_failed_attempt_becomes_an_error_chain() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let app_config = config_for(&format!(
            r#"
            [source.Api]
            url = "{}"
            data_key = "data"
            "#,
            server.uri()
        ));

        let pipeline = build_pipeline(&app_config, PipelineHooks::default())?;
        let err = run(&pipeline, app_config.fetch_request())
            .await
            .expect_err("💀 'data' isn't on that body");

        let chain = format!("{err:#}");
        assert!(chain.contains("API source failed"), "got: {chain}");
        assert!(chain.contains("Data key 'data'"), "got: {chain}");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_401_is_flagged_without_reading_the_message() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let app_config = config_for(&format!("[source.Api]\nurl = \"{}\"\n", server.uri()));
        let pipeline = build_pipeline(&app_config, PipelineHooks::default())?;
        let err = run(&pipeline, app_config.fetch_request())
            .await
            .expect_err("💀 the server said 401");

        let failed = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<AttemptFailed>())
            .expect("💀 the attempt failure should be in the chain");
        assert!(failed.auth_failed);
        assert!(failed.message.contains("HTTP 401"), "got: {}", failed.message);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_parse_failure_is_not_an_auth_failure() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Authentication failed, said nobody"))
            .mount(&server)
            .await;

        let app_config = config_for(&format!("[source.Api]\nurl = \"{}\"\n", server.uri()));
        let pipeline = build_pipeline(&app_config, PipelineHooks::default())?;
        let err = run(&pipeline, app_config.fetch_request())
            .await
            .expect_err("💀 that body isn't JSON");

        let failed = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<AttemptFailed>())
            .expect("💀 the attempt failure should be in the chain");
        assert!(!failed.auth_failed, "a message that merely says it doesn't count");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_no_url_is_not_a_crime() -> anyhow::Result<()> {
        let app_config = config_for("[source.Api]\n");
        let pipeline = build_pipeline(&app_config, PipelineHooks::default())?;
        let snapshot = run(&pipeline, app_config.fetch_request()).await?;
        assert_eq!(snapshot.status, FetchStatus::Idle);
        assert!(snapshot.records.is_empty());
        Ok(())
    }
}
