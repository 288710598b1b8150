use std::f32::consts::PI;

use crate::config::LayoutConfig;
use crate::ir::{DeviationCategory, DeviationCounts};
use crate::theme::Theme;

use super::NodeLayout;

#[derive(Debug, Clone, PartialEq)]
pub struct RadialBar {
    pub category: DeviationCategory,
    pub value: u64,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Filled sweep in radians, `0..=PI`.
    pub end_angle: f32,
    pub color: String,
    pub track_path: String,
    /// Empty when the bar has no sweep.
    pub bar_path: String,
    pub value_anchor: (f32, f32),
    pub category_anchor: (f32, f32),
}

/// Semicircular deviation breakdown drawn around a node. Paths and anchors are
/// relative to `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialChart {
    pub node_id: String,
    pub code: String,
    pub center: (f32, f32),
    pub total: u64,
    pub bars: Vec<RadialBar>,
}

/// Builds the chart for `node`, or `None` when the node has no state code.
pub fn radial_chart(
    node: &NodeLayout,
    deviations: &DeviationCounts,
    theme: &Theme,
    config: &LayoutConfig,
) -> Option<RadialChart> {
    let code = node.code.as_deref()?;
    let chart_cfg = &config.chart;
    let total = deviations.total(code);
    let inner = config.node_radius;
    let n_bars = DeviationCategory::ALL.len() as f32;
    let step = chart_cfg.band_width / n_bars;
    let bar_width = (step - chart_cfg.bar_padding).max(0.0);

    let bars = DeviationCategory::ALL
        .iter()
        .enumerate()
        .map(|(idx, category)| {
            let value = deviations.count(*category, code);
            let fraction = if total == 0 {
                0.0
            } else {
                (value as f32 / total as f32).clamp(0.0, 1.0)
            };
            let end_angle = angle(fraction);
            let inner_radius = inner + step * idx as f32 + chart_cfg.bar_padding;
            let outer_radius = inner_radius + bar_width;
            let label_radius = inner_radius + bar_width / 2.0;
            let value_anchor = (
                polar(angle(1.5), label_radius).0 - chart_cfg.label_offset,
                polar(angle(0.5), label_radius).1,
            );
            let category_anchor = (
                polar(angle(1.5), label_radius).0 - chart_cfg.label_offset,
                polar(angle(1.5), label_radius).1,
            );
            RadialBar {
                category: *category,
                value,
                inner_radius,
                outer_radius,
                end_angle,
                color: theme.chart_colors[idx].clone(),
                track_path: sector_path(inner_radius, outer_radius, 0.0, PI),
                bar_path: sector_path(inner_radius, outer_radius, 0.0, end_angle),
                value_anchor,
                category_anchor,
            }
        })
        .collect();

    Some(RadialChart {
        node_id: node.id.clone(),
        code: code.to_string(),
        center: (node.x, node.y),
        total,
        bars,
    })
}

/// Linear map from `[0, 1]` to `[0, PI]`; values outside the domain are
/// extrapolated.
pub fn angle(fraction: f32) -> f32 {
    fraction * PI
}

pub fn polar(angle: f32, radius: f32) -> (f32, f32) {
    (angle.cos() * radius, angle.sin() * radius)
}

/// Annular sector with angles measured clockwise from 12 o'clock.
fn sector_path(inner: f32, outer: f32, start: f32, end: f32) -> String {
    let sweep = end - start;
    if sweep <= f32::EPSILON || outer <= 0.0 {
        return String::new();
    }
    let large_arc = if sweep > PI { 1 } else { 0 };
    let point = |radius: f32, a: f32| (radius * a.sin(), -radius * a.cos());
    let (ox0, oy0) = point(outer, start);
    let (ox1, oy1) = point(outer, end);
    let (ix1, iy1) = point(inner, end);
    let (ix0, iy0) = point(inner, start);
    format!(
        "M{ox0:.2},{oy0:.2}A{outer:.2},{outer:.2},0,{large_arc},1,{ox1:.2},{oy1:.2}\
         L{ix1:.2},{iy1:.2}A{inner:.2},{inner:.2},0,{large_arc},0,{ix0:.2},{iy0:.2}Z"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeKind;
    use crate::layout::TextBlock;

    fn mapped_node(code: Option<&str>) -> NodeLayout {
        NodeLayout {
            id: "p1".to_string(),
            label: "Detection".to_string(),
            label_block: TextBlock {
                lines: vec!["Detection".to_string()],
                width: 50.0,
                height: 13.2,
            },
            kind: NodeKind::Place,
            x: 42.0,
            y: 150.0,
            code: code.map(str::to_string),
            duration: None,
        }
    }

    fn counts(missing: u64, repetition: u64, mismatch: u64) -> DeviationCounts {
        let mut counts = DeviationCounts::default();
        counts.missing.insert("N".to_string(), missing);
        counts.repetition.insert("N".to_string(), repetition);
        counts.mismatch.insert("N".to_string(), mismatch);
        counts
    }

    #[test]
    fn sweeps_are_proportional_to_share() {
        let chart = radial_chart(
            &mapped_node(Some("N")),
            &counts(2, 1, 1),
            &Theme::dark(),
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(chart.total, 4);
        assert_eq!(chart.center, (42.0, 150.0));
        assert!((chart.bars[0].end_angle - PI / 2.0).abs() < 1e-5);
        assert!((chart.bars[1].end_angle - PI / 4.0).abs() < 1e-5);
        assert_eq!(chart.bars[2].category, DeviationCategory::Mismatch);
        assert_eq!(chart.bars[0].color, "green");
    }

    #[test]
    fn bars_stack_inner_to_outer() {
        let config = LayoutConfig::default();
        let chart = radial_chart(
            &mapped_node(Some("N")),
            &counts(1, 1, 1),
            &Theme::dark(),
            &config,
        )
        .unwrap();
        let first = &chart.bars[0];
        assert!((first.inner_radius - (config.node_radius + 1.0)).abs() < 1e-5);
        assert!((first.outer_radius - first.inner_radius - (20.0 / 3.0 - 1.0)).abs() < 1e-4);
        for pair in chart.bars.windows(2) {
            assert!(pair[1].inner_radius >= pair[0].outer_radius);
        }
    }

    #[test]
    fn zero_total_renders_empty_bars() {
        let chart = radial_chart(
            &mapped_node(Some("N")),
            &counts(0, 0, 0),
            &Theme::dark(),
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(chart.total, 0);
        for bar in &chart.bars {
            assert_eq!(bar.end_angle, 0.0);
            assert!(bar.bar_path.is_empty());
            assert!(!bar.track_path.is_empty());
        }
    }

    #[test]
    fn labels_sit_left_of_the_bar_start() {
        let chart = radial_chart(
            &mapped_node(Some("N")),
            &counts(1, 0, 0),
            &Theme::dark(),
            &LayoutConfig::default(),
        )
        .unwrap();
        let bar = &chart.bars[0];
        let radius = bar.inner_radius + (bar.outer_radius - bar.inner_radius) / 2.0;
        assert!((bar.value_anchor.0 + 5.0).abs() < 1e-3);
        assert!((bar.value_anchor.1 - radius).abs() < 1e-3);
        assert!((bar.category_anchor.1 + radius).abs() < 1e-3);
    }

    #[test]
    fn unmapped_node_has_no_chart() {
        assert!(
            radial_chart(
                &mapped_node(None),
                &counts(1, 1, 1),
                &Theme::dark(),
                &LayoutConfig::default()
            )
            .is_none()
        );
    }

    #[test]
    fn full_track_is_a_half_ring() {
        let path = sector_path(10.0, 20.0, 0.0, PI);
        assert!(path.starts_with("M0.00,-20.00A20.00,20.00,0,0,1,"));
        assert!(path.ends_with('Z'));
    }
}
