//! Arc geometry: straight segments between neighbours, circular arcs when
//! other nodes sit between the endpoints.
//!
//! Model arcs that skip nodes arc over the node axis, synthesized deviation
//! arcs always arc under it, so the two kinds never share a side.

use crate::config::LayoutConfig;

use super::{ArcLayout, ArcPath, NodeLayout, Sweep};

/// Recomputes every arc path and label anchor from the current node
/// positions.
pub fn route_arcs(nodes: &[NodeLayout], arcs: &mut [ArcLayout], config: &LayoutConfig) {
    for arc in arcs.iter_mut() {
        let (path, anchor) = route_arc(nodes, &arc.source, &arc.target, arc.compliant, config);
        arc.path = path;
        arc.label_anchor = anchor;
    }
}

pub fn route_arc(
    nodes: &[NodeLayout],
    source_id: &str,
    target_id: &str,
    compliant: bool,
    config: &LayoutConfig,
) -> (ArcPath, Option<(f32, f32)>) {
    let source = nodes.iter().find(|node| node.id == source_id);
    let target = nodes.iter().find(|node| node.id == target_id);
    let (Some(source), Some(target)) = (source, target) else {
        return (ArcPath::Hidden, None);
    };

    let from = (source.x, source.y);
    let to = (target.x, target.y);
    let dx = target.x - source.x;
    let mid_x = (source.x + target.x) / 2.0;
    let mid_y = (source.y + target.y) / 2.0;

    if compliant && !has_nodes_between(nodes, source, target) {
        let anchor = (mid_x, mid_y - config.line_label_lift);
        return (ArcPath::Line { from, to }, Some(anchor));
    }

    let radius = arc_radius(dx, config);
    let lift = sagitta(radius, dx) + config.arc_label_gap;
    let (sweep, anchor_y) = if compliant {
        (Sweep::Over, source.y - lift)
    } else {
        (Sweep::Under, source.y + lift)
    };
    (
        ArcPath::Circular {
            from,
            to,
            radius,
            sweep,
        },
        Some((mid_x, anchor_y)),
    )
}

/// True when some node other than the endpoints lies strictly between them
/// horizontally or vertically. Shared coordinates do not count.
pub fn has_nodes_between(nodes: &[NodeLayout], source: &NodeLayout, target: &NodeLayout) -> bool {
    let (min_x, max_x) = ordered(source.x, target.x);
    let (min_y, max_y) = ordered(source.y, target.y);
    nodes
        .iter()
        .filter(|node| node.id != source.id && node.id != target.id)
        .any(|node| (node.x > min_x && node.x < max_x) || (node.y > min_y && node.y < max_y))
}

pub fn arc_radius(dx: f32, config: &LayoutConfig) -> f32 {
    let divisor = if config.arc_radius_divisor > 0.0 {
        config.arc_radius_divisor
    } else {
        0.75
    };
    (dx.abs() / divisor).max(config.min_arc_radius.max(f32::EPSILON))
}

/// Height of the circular segment of `radius` spanning a chord of width `dx`.
pub fn sagitta(radius: f32, dx: f32) -> f32 {
    let half = dx / 2.0;
    radius - (radius * radius - half * half).max(0.0).sqrt()
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}
