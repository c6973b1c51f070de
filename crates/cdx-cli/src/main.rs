//! 🚀 cdx-cli: the front door. Loads config, fetches the list, prints the table.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! The real work lives in `cdx`. This binary parses flags, sets up logging,
//! and gets out of the way. Like a good manager. 🦆

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use cdx::app_config::{AppConfig, ComponentMode, load_config};
use cdx::errors::AttemptFailed;
use cdx::pipeline::{FetchStatus, PipelineHooks, PipelineSnapshot};
use cdx::search::SearchParams;
use cdx::sort::{SortDirection, SortParams};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 📋 Fetch a list from an API, a file, or an external table, then search, sort and print it.
#[derive(Debug, Parser)]
#[command(name = "cdx-cli", version)]
struct Cli {
    /// 🔧 TOML config file. Skipped when it doesn't exist; `CDX_*` env vars still apply.
    #[arg(default_value = "cdx.toml")]
    config: PathBuf,

    /// 🔍 Fuzzy search term, overrides `[search] term`.
    #[arg(long)]
    search: Option<String>,

    /// 🔄 Field to sort by, overrides `[sort] key` and turns sorting on.
    #[arg(long)]
    sort_key: Option<String>,

    /// 🔄 Sort descending instead of ascending.
    #[arg(long)]
    descending: bool,

    /// 🐛 Show layout margins and dump the records as JSON.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// 🎛️ Flags beat config. Always.
    fn apply_overrides(&self, app_config: &mut AppConfig) {
        if let Some(term) = &self.search {
            app_config.search = SearchParams {
                term: term.clone(),
                enabled: true,
                ..app_config.search.clone()
            };
        }
        let direction = if self.descending {
            SortDirection::Descending
        } else {
            app_config.sort.direction
        };
        match &self.sort_key {
            Some(key) => app_config.sort = SortParams::by(key.clone(), direction),
            None => app_config.sort.direction = direction,
        }
        if self.debug {
            app_config.mode = ComponentMode::Debug;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(&cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }

        if needs_auth_hint(&err) {
            error!(
                "🔧 hint: the source rejected our credentials. Set `[http] authorization` \
                 (or `CDX_HTTP__AUTHORIZATION`) to a valid token, check it hasn't expired, \
                 and make sure it can read this resource."
            );
        }

        std::process::exit(1);
    }

    Ok(())
}

/// 🔒 True when the chain carries a failed attempt the source rejected on credentials.
fn needs_auth_hint(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AttemptFailed>())
        .is_some_and(|failed| failed.auth_failed)
}

async fn run(cli: &Cli) -> Result<()> {
    // 🔒 A missing config file is fine, env vars can carry the whole config
    let config_file = cli
        .config
        .try_exists()
        .with_context(|| {
            format!(
                "💀 Couldn't check whether the config file exists. Was checking here: '{}'",
                cli.config.display()
            )
        })?
        .then_some(cli.config.as_path());

    let mut app_config = load_config(config_file)
        .context("💀 In cdx-cli we couldn't load the config. Check the file and the CDX_* env vars.")?;
    cli.apply_overrides(&mut app_config);

    let pipeline = cdx::build_pipeline(&app_config, PipelineHooks::default())?;
    let (spinner, watcher) =
        render::spin_while_loading(pipeline.subscribe(), app_config.source.title());

    let outcome = cdx::run(&pipeline, app_config.fetch_request()).await;
    spinner.finish_and_clear();
    watcher.abort();

    print_snapshot(&outcome?, &app_config)
}

fn print_snapshot(snapshot: &PipelineSnapshot, app_config: &AppConfig) -> Result<()> {
    if snapshot.status == FetchStatus::Idle {
        println!("💤 No source URL configured. Set one under [source.Api], [source.File] or [source.ExternalTable].");
        return Ok(());
    }

    match render::records_table(&snapshot.records) {
        Some(table) => println!("{table}"),
        None if app_config.search.is_active() => {
            println!("🤷 Nothing matches '{}'.", app_config.search.term.trim());
        }
        None => println!("🤷 The source returned no records."),
    }

    if app_config.mode == ComponentMode::Debug {
        println!(
            "📐 Layout ({:?}, {} column(s))",
            app_config.layout.direction, app_config.layout.columns
        );
        println!("{}", render::layout_table(&app_config.layout, snapshot.records.len()));
        let dump = serde_json::to_string_pretty(snapshot.records.as_slice())
            .context("💀 Couldn't serialize the records for the debug dump")?;
        println!("{dump}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdx::sources::SourceConfig;

    fn blank_config() -> AppConfig {
        AppConfig {
            source: SourceConfig::default(),
            http: Default::default(),
            loading: Default::default(),
            search: SearchParams::default(),
            sort: SortParams::default(),
            layout: Default::default(),
            mode: ComponentMode::Normal,
            data: None,
        }
    }

    #[test]
    fn the_one_where_flags_beat_the_config_file() {
        let cli = Cli::parse_from(["cdx-cli", "items.toml", "--search", "wid", "--sort-key", "price", "--descending", "--debug"]);
        let mut app_config = blank_config();
        cli.apply_overrides(&mut app_config);

        assert_eq!(cli.config, PathBuf::from("items.toml"));
        assert_eq!(app_config.search.term, "wid");
        assert_eq!(app_config.sort, SortParams::by("price", SortDirection::Descending));
        assert_eq!(app_config.mode, ComponentMode::Debug);
    }

    #[test]
    fn the_one_where_the_auth_hint_follows_the_flag_not_the_words() {
        let rejected = anyhow::Error::new(AttemptFailed {
            message: "🔒 HTTP 401".to_string(),
            auth_failed: true,
        })
        .context("💀 Loading records from the API source failed");
        assert!(needs_auth_hint(&rejected));

        let lookalike = anyhow::Error::new(AttemptFailed {
            message: "🧾 Failed to parse JSON: Authentication failed".to_string(),
            auth_failed: false,
        })
        .context("💀 Loading records from the API source failed");
        assert!(!needs_auth_hint(&lookalike));

        assert!(!needs_auth_hint(&anyhow::anyhow!("Authentication failed")));
    }

    #[test]
    fn the_one_where_no_flags_change_nothing() {
        let cli = Cli::parse_from(["cdx-cli"]);
        let mut app_config = blank_config();
        cli.apply_overrides(&mut app_config);

        assert_eq!(cli.config, PathBuf::from("cdx.toml"));
        assert!(!app_config.search.is_active());
        assert!(!app_config.sort.enabled);
        assert_eq!(app_config.mode, ComponentMode::Normal);
    }
}
