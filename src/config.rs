use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadialChartConfig {
    /// Radial thickness shared by the three bars.
    pub band_width: f32,
    pub bar_padding: f32,
    pub label_offset: f32,
}

impl Default for RadialChartConfig {
    fn default() -> Self {
        Self {
            band_width: 20.0,
            bar_padding: 1.0,
            label_offset: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_radius: f32,
    pub padding: f32,
    /// Vertical position of the node axis as a fraction of the container height.
    pub axis_ratio: f32,
    pub arc_radius_divisor: f32,
    pub min_arc_radius: f32,
    pub arc_label_gap: f32,
    pub line_label_lift: f32,
    pub label_line_height: f32,
    pub wrap_labels: bool,
    pub fast_text_metrics: bool,
    pub chart: RadialChartConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_radius: 40.0,
            padding: 2.0,
            axis_ratio: 0.5,
            arc_radius_divisor: 0.75,
            min_arc_radius: 1.0,
            arc_label_gap: 10.0,
            line_label_lift: 6.0,
            label_line_height: 1.1,
            wrap_labels: true,
            fast_text_metrics: false,
            chart: RadialChartConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 300.0,
            background: "#1b1b1b".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::dark();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    small_font_size: Option<f32>,
    node_text_color: Option<String>,
    place_color: Option<String>,
    transition_color: Option<String>,
    line_color: Option<String>,
    non_compliant_color: Option<String>,
    edge_label_color: Option<String>,
    missing_color: Option<String>,
    repetition_color: Option<String>,
    mismatch_color: Option<String>,
    chart_track_opacity: Option<f32>,
    chart_text_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ChartConfigFile {
    band_width: Option<f32>,
    bar_padding: Option<f32>,
    label_offset: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_radius: Option<f32>,
    padding: Option<f32>,
    axis_ratio: Option<f32>,
    arc_radius_divisor: Option<f32>,
    min_arc_radius: Option<f32>,
    arc_label_gap: Option<f32>,
    line_label_lift: Option<f32>,
    label_line_height: Option<f32>,
    wrap_labels: Option<bool>,
    fast_text_metrics: Option<bool>,
    chart: Option<ChartConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON (or JSON5) config document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(strict) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {strict}"))?,
    };
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => {
                config.render.background = theme.background.clone();
                config.theme = theme;
            }
            None => log::warn!("unknown theme '{theme_name}', keeping the default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.small_font_size {
            config.theme.small_font_size = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.place_color {
            config.theme.place_color = v;
        }
        if let Some(v) = vars.transition_color {
            config.theme.transition_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.non_compliant_color {
            config.theme.non_compliant_color = v;
        }
        if let Some(v) = vars.edge_label_color {
            config.theme.edge_label_color = v;
        }
        if let Some(v) = vars.missing_color {
            config.theme.chart_colors[0] = v;
        }
        if let Some(v) = vars.repetition_color {
            config.theme.chart_colors[1] = v;
        }
        if let Some(v) = vars.mismatch_color {
            config.theme.chart_colors[2] = v;
        }
        if let Some(v) = vars.chart_track_opacity {
            config.theme.chart_track_opacity = v;
        }
        if let Some(v) = vars.chart_text_color {
            config.theme.chart_text_color = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_radius {
            config.layout.node_radius = v;
        }
        if let Some(v) = layout.padding {
            config.layout.padding = v;
        }
        if let Some(v) = layout.axis_ratio {
            config.layout.axis_ratio = v;
        }
        if let Some(v) = layout.arc_radius_divisor {
            config.layout.arc_radius_divisor = v;
        }
        if let Some(v) = layout.min_arc_radius {
            config.layout.min_arc_radius = v;
        }
        if let Some(v) = layout.arc_label_gap {
            config.layout.arc_label_gap = v;
        }
        if let Some(v) = layout.line_label_lift {
            config.layout.line_label_lift = v;
        }
        if let Some(v) = layout.label_line_height {
            config.layout.label_line_height = v;
        }
        if let Some(v) = layout.wrap_labels {
            config.layout.wrap_labels = v;
        }
        if let Some(v) = layout.fast_text_metrics {
            config.layout.fast_text_metrics = v;
        }
        if let Some(chart) = layout.chart {
            if let Some(v) = chart.band_width {
                config.layout.chart.band_width = v;
            }
            if let Some(v) = chart.bar_padding {
                config.layout.chart.bar_padding = v;
            }
            if let Some(v) = chart.label_offset {
                config.layout.chart.label_offset = v;
            }
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    Ok(config)
}
