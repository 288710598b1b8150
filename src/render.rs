use crate::config::{LayoutConfig, RenderConfig};
use crate::ir::NodeKind;
use crate::layout::{ArcLayout, ConformanceLayout, NodeLayout, RadialChart};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// What gets drawn: a built layout plus the interaction state layered on top
/// of it.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub layout: &'a ConformanceLayout,
    pub charts: &'a [RadialChart],
    /// Node ids bottom to top. Empty means layout order.
    pub node_order: &'a [String],
}

impl<'a> Scene<'a> {
    pub fn new(layout: &'a ConformanceLayout) -> Self {
        Self {
            layout,
            charts: &[],
            node_order: &[],
        }
    }

    pub fn with_charts(mut self, charts: &'a [RadialChart]) -> Self {
        self.charts = charts;
        self
    }

    pub fn with_node_order(mut self, node_order: &'a [String]) -> Self {
        self.node_order = node_order;
        self
    }

    fn ordered_nodes(&self) -> Vec<&'a NodeLayout> {
        if self.node_order.is_empty() {
            return self.layout.nodes.iter().collect();
        }
        // Nodes missing from the order are drawn first, in layout order.
        let mut nodes: Vec<&NodeLayout> = self
            .layout
            .nodes
            .iter()
            .filter(|node| !self.node_order.contains(&node.id))
            .collect();
        nodes.extend(
            self.node_order
                .iter()
                .filter_map(|id| self.layout.node(id)),
        );
        nodes
    }
}

pub fn render_svg(scene: &Scene<'_>, theme: &Theme, config: &LayoutConfig) -> String {
    let layout = scene.layout;
    let mut svg = String::new();
    let width = layout.width.max(1.0);
    let height = layout.height.max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    for (id, color) in [
        ("arrow", &theme.line_color),
        ("arrow-deviation", &theme.non_compliant_color),
    ] {
        svg.push_str(&format!(
            "<marker id=\"{id}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/></marker>",
        ));
    }
    svg.push_str("</defs>");

    svg.push_str("<g class=\"links\">");
    for arc in layout.drawn_arcs() {
        push_arc(&mut svg, arc, theme);
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"transition-texts\">");
    for arc in layout.drawn_arcs() {
        let (Some(label), Some((x, y))) = (&arc.label, arc.label_anchor) else {
            continue;
        };
        svg.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            escape_xml(&theme.font_family),
            theme.small_font_size,
            theme.edge_label_color,
            escape_xml(label)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in scene.ordered_nodes() {
        push_node(&mut svg, node, theme, config);
    }
    svg.push_str("</g>");

    if !scene.charts.is_empty() {
        svg.push_str("<g class=\"charts\">");
        for chart in scene.charts {
            push_chart(&mut svg, chart, theme);
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn push_arc(svg: &mut String, arc: &ArcLayout, theme: &Theme) {
    let (color, marker, dash) = if arc.compliant {
        (&theme.line_color, "arrow", "")
    } else {
        (
            &theme.non_compliant_color,
            "arrow-deviation",
            " stroke-dasharray=\"5 3\"",
        )
    };
    svg.push_str(&format!(
        "<path class=\"link{}\" data-source=\"{}\" data-target=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"{dash} marker-end=\"url(#{marker})\"/>",
        if arc.compliant { "" } else { " non-compliant" },
        escape_xml(&arc.source),
        escape_xml(&arc.target),
        arc.path.to_svg_d(),
    ));
}

fn push_node(svg: &mut String, node: &NodeLayout, theme: &Theme, config: &LayoutConfig) {
    let (class, fill) = match node.kind {
        NodeKind::Place => ("place", &theme.place_color),
        NodeKind::Transition => ("transition", &theme.transition_color),
    };
    svg.push_str(&format!(
        "<g class=\"node {class}\" data-id=\"{}\">",
        escape_xml(&node.id)
    ));
    svg.push_str(&format!(
        "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"{fill}\"/>",
        node.x, node.y, config.node_radius
    ));

    let line_height = theme.font_size * config.label_line_height;
    let line_count = node.label_block.lines.len().max(1) as f32;
    let first_dy = -(line_count - 1.0) * line_height / 2.0;
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        node.x,
        node.y,
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.node_text_color
    ));
    for (idx, line) in node.label_block.lines.iter().enumerate() {
        let dy = if idx == 0 { first_dy } else { line_height };
        svg.push_str(&format!(
            "<tspan x=\"{:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            node.x,
            escape_xml(line)
        ));
    }
    svg.push_str("</text>");

    if let Some(duration) = &node.duration {
        svg.push_str(&format!(
            "<text class=\"duration\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            node.x,
            node.y + config.node_radius + theme.small_font_size + 2.0,
            escape_xml(&theme.font_family),
            theme.small_font_size,
            theme.node_text_color,
            escape_xml(duration)
        ));
    }
    svg.push_str("</g>");
}

fn push_chart(svg: &mut String, chart: &RadialChart, theme: &Theme) {
    svg.push_str(&format!(
        "<g class=\"chart\" data-node=\"{}\" transform=\"translate({:.2},{:.2})\">",
        escape_xml(&chart.node_id),
        chart.center.0,
        chart.center.1
    ));
    for bar in &chart.bars {
        svg.push_str(&format!(
            "<path class=\"track\" d=\"{}\" fill=\"{}\" fill-opacity=\"{}\"/>",
            bar.track_path, bar.color, theme.chart_track_opacity
        ));
        if !bar.bar_path.is_empty() {
            svg.push_str(&format!(
                "<path class=\"bar\" d=\"{}\" fill=\"{}\"/>",
                bar.bar_path, bar.color
            ));
        }
        for (class, (x, y), text) in [
            ("value", bar.value_anchor, bar.value.to_string()),
            ("category", bar.category_anchor, bar.category.name().to_string()),
        ] {
            svg.push_str(&format!(
                "<text class=\"{class}\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"end\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{text}</text>",
                escape_xml(&theme.font_family),
                theme.small_font_size,
                theme.chart_text_color,
            ));
        }
    }
    svg.push_str("</g>");
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = primary_font(&theme.font_family);
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid render size {}x{}", render_cfg.width, render_cfg.height))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;
    if let Some(color) = parse_hex_color(&render_cfg.background) {
        pixmap.fill(color);
    }

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

#[cfg(feature = "png")]
fn primary_font(family: &str) -> String {
    family
        .split(',')
        .map(|name| name.trim().trim_matches('"').trim_matches('\''))
        .find(|name| !name.is_empty())
        .unwrap_or("sans-serif")
        .to_string()
}

#[cfg(feature = "png")]
fn parse_hex_color(value: &str) -> Option<resvg::tiny_skia::Color> {
    let hex = value.trim().strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some(resvg::tiny_skia::Color::from_rgba8(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            255,
        )),
        _ => None,
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
