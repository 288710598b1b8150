use std::collections::BTreeMap;

use crate::conformance::{BuildWarning, ConformanceDiff};
use crate::ir::{NodeKind, TransitionKey};

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub label: String,
    pub label_block: TextBlock,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    /// Process-state code resolved through the label mapping.
    pub code: Option<String>,
    /// Average time spent in the state, preformatted by the backend.
    pub duration: Option<String>,
}

/// SVG arc sweep direction, relative to the source-to-target direction.
///
/// The names describe a chord drawn left to right. A right-to-left chord
/// with the same flag bulges to the opposite side, while its label anchor
/// stays on the named side of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Flag 0: bulges below a left-to-right chord.
    Under,
    /// Flag 1: bulges above a left-to-right chord.
    Over,
}

impl Sweep {
    pub fn flag(self) -> u8 {
        match self {
            Sweep::Under => 0,
            Sweep::Over => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArcPath {
    /// An endpoint is missing; nothing is drawn.
    Hidden,
    Line {
        from: (f32, f32),
        to: (f32, f32),
    },
    Circular {
        from: (f32, f32),
        to: (f32, f32),
        radius: f32,
        sweep: Sweep,
    },
}

impl ArcPath {
    pub fn is_drawn(&self) -> bool {
        !matches!(self, ArcPath::Hidden)
    }

    pub fn sweep(&self) -> Option<Sweep> {
        match self {
            ArcPath::Circular { sweep, .. } => Some(*sweep),
            _ => None,
        }
    }

    /// Path data for the `d` attribute of an SVG `<path>`.
    pub fn to_svg_d(&self) -> String {
        match self {
            ArcPath::Hidden => String::new(),
            ArcPath::Line { from, to } => {
                format!("M{:.2},{:.2} L{:.2},{:.2}", from.0, from.1, to.0, to.1)
            }
            ArcPath::Circular {
                from,
                to,
                radius,
                sweep,
            } => format!(
                "M{:.2},{:.2} A{:.2},{:.2} 0 0,{} {:.2},{:.2}",
                from.0,
                from.1,
                radius,
                radius,
                sweep.flag(),
                to.0,
                to.1
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcLayout {
    pub source: String,
    pub target: String,
    pub compliant: bool,
    /// Observed statistic for the transition between the endpoint states.
    pub label: Option<String>,
    pub path: ArcPath,
    pub label_anchor: Option<(f32, f32)>,
}

/// A single drag step: move node `id` to `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePatch {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

impl NodePatch {
    pub fn new(id: &str, x: f32, y: f32) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
        }
    }
}

/// Positioned conformance graph for one (model, observed transitions, toggle)
/// build.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformanceLayout {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeLayout>,
    pub arcs: Vec<ArcLayout>,
    pub diff: ConformanceDiff,
    pub show_non_compliant: bool,
    pub transition_labels: BTreeMap<TransitionKey, String>,
    pub warnings: Vec<BuildWarning>,
}

impl ConformanceLayout {
    pub fn empty(size: ContainerSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            nodes: Vec::new(),
            arcs: Vec::new(),
            diff: ConformanceDiff::default(),
            show_non_compliant: false,
            transition_labels: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn arc(&self, source: &str, target: &str) -> Option<&ArcLayout> {
        self.arcs
            .iter()
            .find(|arc| arc.source == source && arc.target == target)
    }

    pub fn drawn_arcs(&self) -> impl Iterator<Item = &ArcLayout> {
        self.arcs.iter().filter(|arc| arc.path.is_drawn())
    }
}
