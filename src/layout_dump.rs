use crate::conformance::BuildWarning;
use crate::ir::NodeKind;
use crate::layout::{ConformanceLayout, RadialChart};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub show_non_compliant: bool,
    pub nodes: Vec<NodeDump>,
    pub arcs: Vec<ArcDump>,
    pub valid_transitions: Vec<String>,
    pub non_compliant_transitions: Vec<String>,
    pub charts: Vec<ChartDump>,
    pub warnings: Vec<BuildWarning>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub label_width: f32,
    pub label_height: f32,
    pub label_lines: Vec<String>,
    pub code: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcDump {
    pub source: String,
    pub target: String,
    pub compliant: bool,
    pub shape: &'static str,
    pub sweep: Option<u8>,
    pub path: String,
    pub label: Option<String>,
    pub label_anchor: Option<[f32; 2]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDump {
    pub node_id: String,
    pub code: String,
    pub total: u64,
    pub values: Vec<u64>,
}

impl LayoutDump {
    pub fn from_layout(layout: &ConformanceLayout, charts: &[RadialChart]) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: node.kind,
                label: node.label.clone(),
                x: node.x,
                y: node.y,
                label_width: node.label_block.width,
                label_height: node.label_block.height,
                label_lines: node.label_block.lines.clone(),
                code: node.code.clone(),
                duration: node.duration.clone(),
            })
            .collect();

        let arcs = layout
            .arcs
            .iter()
            .map(|arc| ArcDump {
                source: arc.source.clone(),
                target: arc.target.clone(),
                compliant: arc.compliant,
                shape: match arc.path {
                    crate::layout::ArcPath::Hidden => "hidden",
                    crate::layout::ArcPath::Line { .. } => "line",
                    crate::layout::ArcPath::Circular { .. } => "arc",
                },
                sweep: arc.path.sweep().map(|sweep| sweep.flag()),
                path: arc.path.to_svg_d(),
                label: arc.label.clone(),
                label_anchor: arc.label_anchor.map(|(x, y)| [x, y]),
            })
            .collect();

        let charts = charts
            .iter()
            .map(|chart| ChartDump {
                node_id: chart.node_id.clone(),
                code: chart.code.clone(),
                total: chart.total,
                values: chart.bars.iter().map(|bar| bar.value).collect(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            show_non_compliant: layout.show_non_compliant,
            nodes,
            arcs,
            valid_transitions: layout.diff.valid.iter().map(|key| key.to_string()).collect(),
            non_compliant_transitions: layout
                .diff
                .non_compliant
                .iter()
                .map(|key| key.to_string())
                .collect(),
            charts,
            warnings: layout.warnings.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &ConformanceLayout, charts: &[RadialChart]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, charts);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
