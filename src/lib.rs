#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conformance;
pub mod error;
pub mod interaction;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod source;
mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig};
pub use conformance::{BuildWarning, ConformanceDiff, diff_transitions};
pub use error::{Error, Result};
pub use interaction::{ChartToggle, DragPhase, Visualization};
pub use ir::{ConformanceInputs, DeviationCounts, PetriNet, StateMapping, Statistic, TransitionKey};
pub use layout::{ConformanceLayout, ContainerSize, NodePatch, build_layout};
pub use parser::parse_pnml;
pub use source::{DataSource, DirectorySource, StaticSource};
pub use theme::Theme;

/// Options for a one-shot render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub width: f32,
    pub height: f32,
    pub show_non_compliant: bool,
    /// Node ids whose deviation chart is shown.
    pub charts: Vec<String>,
    /// Drags applied after the build, in order.
    pub moves: Vec<NodePatch>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::dark()
    }
}

impl RenderOptions {
    pub fn dark() -> Self {
        Self::from_config(Config::default())
    }

    pub fn light() -> Self {
        let mut config = Config::default();
        config.theme = Theme::light();
        config.render.background = config.theme.background.clone();
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            width: config.render.width,
            height: config.render.height,
            theme: config.theme,
            layout: config.layout,
            show_non_compliant: false,
            charts: Vec::new(),
            moves: Vec::new(),
        }
    }

    pub fn with_show_non_compliant(mut self, show: bool) -> Self {
        self.show_non_compliant = show;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn into_config(self) -> Config {
        Config {
            render: RenderConfig {
                width: self.width,
                height: self.height,
                background: self.theme.background.clone(),
            },
            theme: self.theme,
            layout: self.layout,
        }
    }
}

/// Builds the conformance view for `model` and returns it as SVG.
pub fn render_with_options(
    model: &str,
    inputs: &ConformanceInputs,
    options: RenderOptions,
) -> Result<String> {
    let source = StaticSource::new(model, inputs.clone());
    let view = apply_options(&source, options)?;
    Ok(view.render_svg())
}

/// Mounts a view and replays the chart toggles and moves from `options`.
pub fn apply_options(source: &dyn DataSource, options: RenderOptions) -> Result<Visualization> {
    let size = ContainerSize::new(options.width, options.height);
    let show = options.show_non_compliant;
    let charts = options.charts.clone();
    let moves = options.moves.clone();
    let mut view = Visualization::mount(source, size, show, options.into_config())?;
    for patch in &moves {
        view.drag_start(&patch.id);
        view.drag_move(&patch.id, patch.x, patch.y);
        view.drag_end(&patch.id);
    }
    for node_id in &charts {
        if view.toggle_chart(node_id) != ChartToggle::Shown {
            log::warn!("no deviation chart shown for {node_id}");
        }
    }
    Ok(view)
}
