// ai
//! 📊 render.rs: a spinner while we wait, a table when we're done.
//!
//! ⚠️ Watching the spinner will not make the API respond faster. We've tried.

use std::time::Duration;

use cdx::layout::{LayoutConfig, list_item_style};
use cdx::pipeline::PipelineSnapshot;
use cdx::record::Record;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 🔄 Spin while the pipeline says Loading, vanish as soon as it says anything else.
pub(crate) fn spin_while_loading(
    mut updates: watch::Receiver<PipelineSnapshot>,
    source_title: &'static str,
) -> (ProgressBar, JoinHandle<()>) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let watcher = spinner.clone();
    let handle = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let loading = updates.borrow_and_update().is_loading();
            if loading {
                watcher.set_message(format!("📡 Loading records from the {source_title} source..."));
                watcher.enable_steady_tick(Duration::from_millis(100));
            } else {
                watcher.finish_and_clear();
                break;
            }
        }
    });

    (spinner, handle)
}

/// 🍽️ One row per record, one column per key of the first record.
pub(crate) fn records_table(records: &[Record]) -> Option<Table> {
    let first = records.first()?;
    let columns: Vec<&str> = first.keys().collect();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(|key| Cell::new(key)));

    for record in records {
        table.add_row(columns.iter().map(|key| {
            let value = record.get(key);
            let text = value.map(|v| v.display_text()).unwrap_or_default();
            let cell = Cell::new(text);
            // -- numbers line up on the right, like an accountant would want
            match value.and_then(|v| v.as_f64()) {
                Some(_) => cell.set_alignment(CellAlignment::Right),
                None => cell,
            }
        }));
    }
    Some(table)
}

/// 📐 Debug view: the margins each item would get from the layout engine.
pub(crate) fn layout_table(layout: &LayoutConfig, total: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "margin-right", "margin-bottom", "width"]);

    let margin = |m: Option<f64>| m.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string());
    for index in 0..total {
        let style = list_item_style(layout, index, total);
        let width = cdx::layout::item_width(layout, &style, 0.0);
        table.add_row(vec![
            Cell::new(index),
            Cell::new(margin(style.margin_right)).set_alignment(CellAlignment::Right),
            Cell::new(margin(style.margin_bottom)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{width:.1}")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
