// ai
//! 📐 layout.rs: flexbox math for a list of items, minus the browser.
//!
//! Pure functions. In: a layout config, an index, a total. Out: margins and a
//! container description any renderer can translate into its own dialect.
//!
//! ```text
//!  vertical, 3 columns, 7 items
//!  ┌───┐ ┌───┐ ┌───┐
//!  │ 0 │→│ 1 │→│ 2 │      → = horizontal_gap (not after the last column)
//!  └───┘ └───┘ └───┘      ↓ = vertical_gap   (not under the last row)
//!    ↓     ↓     ↓
//!  ┌───┐ ┌───┐ ┌───┐
//!  │ 3 │→│ 4 │→│ 5 │
//!  └───┘ └───┘ └───┘
//!  ┌───┐
//!  │ 6 │
//!  └───┘
//! ```
//! 🦆

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlexDirection {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FlexWrap {
    #[default]
    Nowrap,
    Wrap,
    WrapReverse,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlexAlignment {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDistribution {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// 🔧 Declarative layout knobs. Sizes are in whatever unit the renderer likes.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub direction: FlexDirection,
    pub columns: usize,
    /// Gap for single-column vertical and for horizontal lists.
    pub gap: f64,
    /// Multi-column only: space between columns.
    pub horizontal_gap: f64,
    /// Multi-column only: space between rows.
    pub vertical_gap: f64,
    pub wrap: FlexWrap,
    pub vertical_alignment: FlexAlignment,
    pub vertical_distribution: FlexDistribution,
    pub width: f64,
    pub height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: FlexDirection::Vertical,
            columns: 1,
            gap: 0.0,
            horizontal_gap: 0.0,
            vertical_gap: 0.0,
            wrap: FlexWrap::Nowrap,
            vertical_alignment: FlexAlignment::Start,
            vertical_distribution: FlexDistribution::Start,
            width: 500.0,
            height: 320.0,
        }
    }
}

impl LayoutConfig {
    // -- 🔒 zero columns would divide by zero. one column is the polite floor.
    fn columns(&self) -> usize {
        self.columns.max(1)
    }
}

/// 📦 Per-item margins. `None` means "no margin on that side", not zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemStyle {
    pub margin_right: Option<f64>,
    pub margin_bottom: Option<f64>,
}

/// 📏 Width of the container: a fixed size or "fill the parent".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Fixed(f64),
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFlow {
    Row,
    Column,
}

/// 📦 Container description. `alignment`/`distribution` only apply to single-column vertical lists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerStyle {
    pub flow: ContainerFlow,
    pub wrap: FlexWrap,
    pub width: Extent,
    /// `None` for multi-column grids, which grow with their content.
    pub height: Option<Extent>,
    pub alignment: Option<FlexAlignment>,
    pub distribution: Option<FlexDistribution>,
}

/// 📐 Margins for the item at `index` out of `total`.
pub fn list_item_style(config: &LayoutConfig, index: usize, total: usize) -> ItemStyle {
    let mut style = ItemStyle::default();
    let columns = config.columns();

    match config.direction {
        FlexDirection::Horizontal => style.margin_right = Some(config.gap),
        FlexDirection::Vertical if columns > 1 => {
            if index % columns != columns - 1 {
                style.margin_right = Some(config.horizontal_gap);
            }
            if index + columns < total {
                style.margin_bottom = Some(config.vertical_gap);
            }
        }
        FlexDirection::Vertical => style.margin_bottom = Some(config.gap),
    }

    style
}

/// 📏 Width an item gets. Vertical lists split the container into equal columns
/// after taking the item's right margin out once per column. Horizontal lists
/// keep the item's natural width.
pub fn item_width(config: &LayoutConfig, style: &ItemStyle, natural_width: f64) -> f64 {
    match config.direction {
        FlexDirection::Vertical => {
            let columns = config.columns() as f64;
            (config.width - columns * style.margin_right.unwrap_or(0.0)) / columns
        }
        FlexDirection::Horizontal => natural_width,
    }
}

/// 📦 How the container around the items should flow.
pub fn container_style(config: &LayoutConfig) -> ContainerStyle {
    match config.direction {
        FlexDirection::Vertical if config.columns() == 1 => ContainerStyle {
            flow: ContainerFlow::Column,
            wrap: FlexWrap::Nowrap,
            width: Extent::Fixed(config.width),
            height: Some(Extent::Fixed(config.height)),
            alignment: Some(config.vertical_alignment),
            distribution: Some(config.vertical_distribution),
        },
        FlexDirection::Vertical => ContainerStyle {
            flow: ContainerFlow::Row,
            wrap: FlexWrap::Wrap,
            width: Extent::Fixed(config.width),
            height: None,
            alignment: None,
            distribution: None,
        },
        FlexDirection::Horizontal => ContainerStyle {
            flow: ContainerFlow::Row,
            wrap: config.wrap,
            width: Extent::Full,
            height: Some(Extent::Full),
            alignment: None,
            distribution: None,
        },
    }
}

/// 🤝 The space-* distributions spread items themselves, so the vertical gap is the container's job.
pub fn is_vertical_gap_controlled_by_container(distribution: FlexDistribution) -> bool {
    matches!(
        distribution,
        FlexDistribution::SpaceAround | FlexDistribution::SpaceBetween | FlexDistribution::SpaceEvenly
    )
}
