pub mod radial;
pub mod routing;
mod text;
mod types;

use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::conformance::{self, BuildWarning, ConformanceDiff, diff_transitions};
use crate::ir::{ConformanceInputs, PetriNet, StateMapping, TransitionKey};
use crate::theme::Theme;

use text::{unwrapped_label, wrap_label};

pub use radial::{RadialBar, RadialChart, radial_chart};
pub use routing::route_arcs;
pub use types::*;

/// Places every node of `net` on one horizontal axis, evenly spaced across
/// the container, places first and transitions after.
pub fn layout_nodes(
    net: &PetriNet,
    size: ContainerSize,
    theme: &Theme,
    config: &LayoutConfig,
) -> Vec<NodeLayout> {
    let count = net.node_count();
    let y = axis_y(size.height, config);
    net.nodes()
        .enumerate()
        .map(|(idx, node)| NodeLayout {
            id: node.id.clone(),
            label: node.label.clone(),
            label_block: node_label(&node.label, theme, config),
            kind: node.kind,
            x: axis_x(idx, count, size.width, config),
            y,
            code: None,
            duration: None,
        })
        .collect()
}

/// Horizontal position of node `index` out of `count`. A single node is
/// centered. Containers narrower than both insets spread the nodes evenly
/// across the full width instead, so positions keep increasing.
pub fn axis_x(index: usize, count: usize, width: f32, config: &LayoutConfig) -> f32 {
    if count <= 1 {
        return width / 2.0;
    }
    let inset = config.node_radius + config.padding;
    let available = width - 2.0 * inset;
    if available <= 0.0 {
        return (index + 1) as f32 * width / (count + 1) as f32;
    }
    inset + index as f32 * (available / (count - 1) as f32)
}

fn axis_y(height: f32, config: &LayoutConfig) -> f32 {
    let inset = config.node_radius + config.padding;
    let y = height * config.axis_ratio;
    if height <= 2.0 * inset {
        height / 2.0
    } else {
        y.clamp(inset, height - inset)
    }
}

fn node_label(label: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    if config.wrap_labels {
        wrap_label(
            label,
            2.0 * config.node_radius,
            theme.font_size,
            config.label_line_height,
            &theme.font_family,
            config.fast_text_metrics,
        )
    } else {
        unwrapped_label(
            label,
            theme.font_size,
            config.label_line_height,
            &theme.font_family,
            config.fast_text_metrics,
        )
    }
}

/// Fills in each node's state code and state duration. Nodes whose label has
/// no code are reported once each.
pub fn resolve_state_codes(
    nodes: &mut [NodeLayout],
    mapping: &StateMapping,
    durations: &BTreeMap<String, String>,
) -> Vec<BuildWarning> {
    let mut warnings = Vec::new();
    for node in nodes.iter_mut() {
        node.code = mapping.code_for(&node.label).map(str::to_string);
        node.duration = node
            .code
            .as_ref()
            .and_then(|code| durations.get(code))
            .filter(|text| !text.is_empty())
            .cloned();
        if node.code.is_none() && !mapping.is_empty() {
            conformance::warn(
                &mut warnings,
                BuildWarning::UnmappedLabel {
                    node_id: node.id.clone(),
                    label: node.label.clone(),
                },
            );
        }
    }
    warnings
}

/// Builds the positioned conformance graph. Pure: the same inputs always
/// yield the same layout.
pub fn build_layout(
    net: &PetriNet,
    inputs: &ConformanceInputs,
    show_non_compliant: bool,
    size: ContainerSize,
    theme: &Theme,
    config: &LayoutConfig,
) -> ConformanceLayout {
    let mut nodes = layout_nodes(net, size, theme, config);
    let mut warnings = resolve_state_codes(&mut nodes, &inputs.mapping, &inputs.durations);

    let (observed, malformed) = inputs.observed_transitions();
    for key in malformed {
        conformance::warn(&mut warnings, BuildWarning::MalformedTransitionKey { key });
    }

    let diff = diff_transitions(net, &inputs.mapping, observed.keys());
    warnings.extend(diff.warnings.iter().cloned());

    let transition_labels = observed
        .iter()
        .map(|(key, stat)| (key.clone(), stat.to_string()))
        .collect();

    let mut layout = ConformanceLayout {
        width: size.width,
        height: size.height,
        nodes,
        arcs: Vec::new(),
        diff,
        show_non_compliant,
        transition_labels,
        warnings,
    };
    layout.arcs = arc_layouts(&layout, show_non_compliant, config);
    log::info!(
        "built conformance layout: {} nodes, {} arcs ({} non-compliant shown)",
        layout.nodes.len(),
        layout.arcs.len(),
        layout.arcs.iter().filter(|arc| !arc.compliant).count()
    );
    layout
}

/// Same graph with deviation arcs switched on or off. Node positions are
/// kept as they are.
pub fn with_non_compliant(
    layout: &ConformanceLayout,
    show_non_compliant: bool,
    config: &LayoutConfig,
) -> ConformanceLayout {
    let mut next = layout.clone();
    next.show_non_compliant = show_non_compliant;
    next.arcs = arc_layouts(layout, show_non_compliant, config);
    next
}

fn arc_layouts(
    layout: &ConformanceLayout,
    show_non_compliant: bool,
    config: &LayoutConfig,
) -> Vec<ArcLayout> {
    let mut arcs: Vec<ArcLayout> = layout
        .diff
        .arcs(show_non_compliant)
        .into_iter()
        .map(|arc| ArcLayout {
            label: arc_label(layout, &arc.source, &arc.target),
            source: arc.source,
            target: arc.target,
            compliant: arc.compliant,
            path: ArcPath::Hidden,
            label_anchor: None,
        })
        .collect();
    route_arcs(&layout.nodes, &mut arcs, config);
    arcs
}

fn arc_label(layout: &ConformanceLayout, source: &str, target: &str) -> Option<String> {
    let source_code = layout.node(source)?.code.as_deref()?;
    let target_code = layout.node(target)?.code.as_deref()?;
    layout
        .transition_labels
        .get(&TransitionKey::new(source_code, target_code))
        .cloned()
}

/// Returns the node list with `patch` applied. Unknown ids leave the list
/// unchanged.
pub fn apply_patch(nodes: &[NodeLayout], patch: &NodePatch) -> Vec<NodeLayout> {
    nodes
        .iter()
        .map(|node| {
            if node.id == patch.id {
                NodeLayout {
                    x: patch.x,
                    y: patch.y,
                    ..node.clone()
                }
            } else {
                node.clone()
            }
        })
        .collect()
}

/// Moves a node and recomputes all arc geometry from the new positions.
pub fn reposition(
    layout: &ConformanceLayout,
    patch: &NodePatch,
    config: &LayoutConfig,
) -> ConformanceLayout {
    let mut next = layout.clone();
    next.nodes = apply_patch(&layout.nodes, patch);
    route_arcs(&next.nodes, &mut next.arcs, config);
    next
}

impl ConformanceLayout {
    pub fn valid_transitions(&self) -> impl Iterator<Item = TransitionKey> + '_ {
        self.diff.valid.iter()
    }

    pub fn non_compliant_transitions(&self) -> &[TransitionKey] {
        &self.diff.non_compliant
    }

    pub fn conformance(&self) -> &ConformanceDiff {
        &self.diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Statistic;

    fn config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    fn incident_net() -> (PetriNet, ConformanceInputs) {
        let mut net = PetriNet::new();
        let mut inputs = ConformanceInputs::default();
        for (id, label, code) in [
            ("p1", "Detection", "N"),
            ("p2", "Activation", "A"),
            ("p3", "Awaiting", "W"),
            ("p4", "Resolution", "R"),
            ("p5", "Closure", "C"),
        ] {
            net.add_place(id, Some(label));
            inputs.mapping.insert(label, code);
        }
        for (source, target) in [("p1", "p2"), ("p2", "p3"), ("p3", "p4"), ("p4", "p5")] {
            net.add_arc(source, target);
        }
        for (key, value) in [("N->A", 5.0), ("A->W", 3.0), ("N->W", 2.0)] {
            inputs
                .transition_stats
                .insert(key.to_string(), Statistic::Number(value));
        }
        inputs
            .durations
            .insert("N".to_string(), "0d, 1h, 5min".to_string());
        (net, inputs)
    }

    #[test]
    fn x_strictly_increases_within_insets() {
        let (net, _) = incident_net();
        let cfg = config();
        let size = ContainerSize::new(800.0, 300.0);
        let nodes = layout_nodes(&net, size, &Theme::dark(), &cfg);
        for pair in nodes.windows(2) {
            assert!(pair[1].x > pair[0].x);
        }
        let inset = cfg.node_radius + cfg.padding;
        let first = nodes.first().unwrap().x;
        let last = nodes.last().unwrap().x;
        assert!((first - inset).abs() < 1e-3);
        assert!((last - (800.0 - inset)).abs() < 1e-3);
        assert!(nodes.iter().all(|node| node.y == nodes[0].y));
    }

    #[test]
    fn narrow_containers_keep_x_increasing() {
        let cfg = config();
        let xs: Vec<f32> = (0..3).map(|i| axis_x(i, 3, 60.0, &cfg)).collect();
        assert_eq!(xs, vec![15.0, 30.0, 45.0]);
        let exact = 2.0 * (cfg.node_radius + cfg.padding);
        assert!(axis_x(1, 2, exact, &cfg) > axis_x(0, 2, exact, &cfg));
    }

    #[test]
    fn single_node_is_centered() {
        let mut net = PetriNet::new();
        net.add_place("only", None);
        let nodes = layout_nodes(&net, ContainerSize::new(500.0, 200.0), &Theme::dark(), &config());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].x, 250.0);
        assert!(nodes[0].x.is_finite() && nodes[0].y.is_finite());
    }

    #[test]
    fn places_precede_transitions() {
        let mut net = PetriNet::new();
        net.add_transition("t1", None);
        net.add_place("p1", None);
        net.add_place("p2", None);
        let nodes = layout_nodes(&net, ContainerSize::new(600.0, 200.0), &Theme::dark(), &config());
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "t1"]);
    }

    #[test]
    fn axis_stays_inside_short_containers() {
        let cfg = config();
        assert_eq!(axis_y(300.0, &cfg), 150.0);
        assert_eq!(axis_y(50.0, &cfg), 25.0);
        let bottom = LayoutConfig {
            axis_ratio: 1.0,
            ..config()
        };
        assert_eq!(axis_y(300.0, &bottom), 300.0 - 42.0);
    }

    #[test]
    fn resolves_codes_and_durations() {
        let (net, inputs) = incident_net();
        let layout = build_layout(
            &net,
            &inputs,
            false,
            ContainerSize::new(1000.0, 300.0),
            &Theme::dark(),
            &config(),
        );
        let first = layout.node("p1").unwrap();
        assert_eq!(first.code.as_deref(), Some("N"));
        assert_eq!(first.duration.as_deref(), Some("0d, 1h, 5min"));
        assert!(layout.node("p2").unwrap().duration.is_none());
        assert!(layout.warnings.is_empty());
    }

    #[test]
    fn incident_scenario_toggles_deviation_arc() {
        let (net, inputs) = incident_net();
        let size = ContainerSize::new(1000.0, 300.0);
        let cfg = config();
        let hidden = build_layout(&net, &inputs, false, size, &Theme::dark(), &cfg);
        assert_eq!(hidden.arcs.len(), 4);
        assert!(hidden.arcs.iter().all(|arc| arc.compliant));
        assert!(
            hidden
                .arcs
                .iter()
                .all(|arc| matches!(arc.path, ArcPath::Line { .. }))
        );
        let valid: Vec<String> = hidden.valid_transitions().map(|k| k.to_string()).collect();
        assert_eq!(valid, vec!["A->W", "N->A", "R->C", "W->R"]);
        assert_eq!(hidden.non_compliant_transitions(), &[TransitionKey::new("N", "W")]);

        let shown = with_non_compliant(&hidden, true, &cfg);
        assert_eq!(shown.arcs.len(), 5);
        let deviation = shown.arcs.iter().find(|arc| !arc.compliant).unwrap();
        assert_eq!((deviation.source.as_str(), deviation.target.as_str()), ("p1", "p3"));
        assert_eq!(deviation.path.sweep(), Some(Sweep::Under));
        assert_eq!(deviation.label.as_deref(), Some("2"));
        assert_eq!(shown.nodes, hidden.nodes);

        let rebuilt = build_layout(&net, &inputs, true, size, &Theme::dark(), &cfg);
        assert_eq!(rebuilt.arcs, shown.arcs);
    }

    #[test]
    fn compliant_arcs_carry_observed_statistics() {
        let (net, inputs) = incident_net();
        let layout = build_layout(
            &net,
            &inputs,
            false,
            ContainerSize::new(1000.0, 300.0),
            &Theme::dark(),
            &config(),
        );
        assert_eq!(layout.arc("p1", "p2").unwrap().label.as_deref(), Some("5"));
        assert!(layout.arc("p3", "p4").unwrap().label.is_none());
    }

    #[test]
    fn dragging_only_touches_incident_arcs() {
        let (net, inputs) = incident_net();
        let cfg = config();
        let before = build_layout(
            &net,
            &inputs,
            false,
            ContainerSize::new(1000.0, 300.0),
            &Theme::dark(),
            &cfg,
        );
        let a = before.node("p2").unwrap();
        let after = reposition(&before, &NodePatch::new("p2", a.x + 37.0, a.y), &cfg);

        for (source, target) in [("p1", "p2"), ("p2", "p3")] {
            assert_ne!(
                before.arc(source, target).unwrap().path,
                after.arc(source, target).unwrap().path
            );
        }
        for (source, target) in [("p3", "p4"), ("p4", "p5")] {
            assert_eq!(
                before.arc(source, target).unwrap().path,
                after.arc(source, target).unwrap().path
            );
        }
        assert_eq!(after.node("p2").unwrap().x, a.x + 37.0);
    }

    #[test]
    fn unknown_patch_changes_nothing() {
        let (net, inputs) = incident_net();
        let cfg = config();
        let before = build_layout(
            &net,
            &inputs,
            true,
            ContainerSize::new(1000.0, 300.0),
            &Theme::dark(),
            &cfg,
        );
        let after = reposition(&before, &NodePatch::new("nope", 1.0, 1.0), &cfg);
        assert_eq!(before, after);
    }

    #[test]
    fn each_unmapped_node_warns_once() {
        let (net, inputs) = incident_net();
        let mut nodes = layout_nodes(
            &net,
            ContainerSize::new(1000.0, 300.0),
            &Theme::dark(),
            &config(),
        );
        nodes[1].label = "Renamed".to_string();
        nodes[3].label = "Also renamed".to_string();
        let warnings = resolve_state_codes(&mut nodes, &inputs.mapping, &inputs.durations);
        assert_eq!(
            warnings,
            vec![
                BuildWarning::UnmappedLabel {
                    node_id: "p2".to_string(),
                    label: "Renamed".to_string()
                },
                BuildWarning::UnmappedLabel {
                    node_id: "p4".to_string(),
                    label: "Also renamed".to_string()
                },
            ]
        );
        assert!(nodes[1].code.is_none());

        let empty = StateMapping::new();
        assert!(resolve_state_codes(&mut nodes, &empty, &inputs.durations).is_empty());
    }

    #[test]
    fn malformed_keys_and_unmapped_labels_warn() {
        let (mut net, mut inputs) = incident_net();
        net.add_transition("tau", None);
        inputs
            .transition_stats
            .insert("garbage".to_string(), Statistic::Number(1.0));
        let layout = build_layout(
            &net,
            &inputs,
            false,
            ContainerSize::new(1000.0, 300.0),
            &Theme::dark(),
            &config(),
        );
        assert!(layout.warnings.contains(&BuildWarning::MalformedTransitionKey {
            key: "garbage".to_string()
        }));
        assert!(layout.warnings.contains(&BuildWarning::UnmappedLabel {
            node_id: "tau".to_string(),
            label: "tau".to_string()
        }));
    }
}
