//! Stateful conformance view: owns the current build and applies user
//! interactions (drag, chart toggles, the deviation toggle) on top of it.

use crate::config::Config;
use crate::error::Result;
use crate::ir::{ConformanceInputs, PetriNet};
use crate::layout::{
    ConformanceLayout, ContainerSize, NodePatch, RadialChart, build_layout, radial_chart,
    reposition, with_non_compliant,
};
use crate::parser::parse_pnml;
use crate::render::{Scene, render_svg};
use crate::source::DataSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging { node_id: String },
}

/// Outcome of clicking a node to show or hide its deviation chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartToggle {
    Shown,
    Hidden,
    /// The node's label has no state code, so there is nothing to chart.
    Unmapped,
    UnknownNode,
}

#[derive(Debug, Clone)]
pub struct Visualization {
    config: Config,
    size: ContainerSize,
    show_non_compliant: bool,
    net: PetriNet,
    inputs: ConformanceInputs,
    layout: ConformanceLayout,
    node_order: Vec<String>,
    charts: Vec<RadialChart>,
    drag: DragPhase,
}

impl Visualization {
    /// Fetches every input from `source` and performs the first build.
    pub fn mount(
        source: &dyn DataSource,
        size: ContainerSize,
        show_non_compliant: bool,
        config: Config,
    ) -> Result<Self> {
        let mut view = Self {
            config,
            size,
            show_non_compliant,
            net: PetriNet::new(),
            inputs: ConformanceInputs::default(),
            layout: ConformanceLayout::empty(size),
            node_order: Vec::new(),
            charts: Vec::new(),
            drag: DragPhase::Idle,
        };
        view.refresh(source)?;
        Ok(view)
    }

    /// Refetches all inputs and rebuilds. On failure the previous graph stays
    /// in place.
    pub fn refresh(&mut self, source: &dyn DataSource) -> Result<()> {
        let fetched = source
            .reference_model()
            .and_then(|model| Ok((model, source.conformance_inputs()?)));
        match fetched {
            Ok((model, inputs)) => self.load(&model, inputs),
            Err(err) => {
                log::error!("failed to fetch conformance inputs: {err}");
                Err(err)
            }
        }
    }

    /// Rebuilds from an already fetched model and inputs.
    pub fn load(&mut self, model: &str, inputs: ConformanceInputs) -> Result<()> {
        let net = match parse_pnml(model) {
            Ok(net) => net,
            Err(err) => {
                log::error!("rebuild aborted, keeping previous graph: {err}");
                return Err(err);
            }
        };
        self.net = net;
        self.inputs = inputs;
        self.rebuild();
        Ok(())
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = ContainerSize::new(width, height);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.layout = build_layout(
            &self.net,
            &self.inputs,
            self.show_non_compliant,
            self.size,
            &self.config.theme,
            &self.config.layout,
        );
        self.node_order = self.layout.nodes.iter().map(|node| node.id.clone()).collect();
        self.charts.clear();
        self.drag = DragPhase::Idle;
    }

    pub fn set_show_non_compliant(&mut self, show: bool) {
        if show == self.show_non_compliant {
            return;
        }
        self.show_non_compliant = show;
        self.layout = with_non_compliant(&self.layout, show, &self.config.layout);
        log::debug!("deviation arcs {}", if show { "shown" } else { "hidden" });
    }

    pub fn toggle_show_non_compliant(&mut self) -> bool {
        self.set_show_non_compliant(!self.show_non_compliant);
        self.show_non_compliant
    }

    /// Raises `node_id` to the top of the paint order.
    pub fn drag_start(&mut self, node_id: &str) -> bool {
        let Some(pos) = self.node_order.iter().position(|id| id == node_id) else {
            log::debug!("drag_start on unknown node {node_id}");
            return false;
        };
        let id = self.node_order.remove(pos);
        self.node_order.push(id);
        self.drag = DragPhase::Dragging {
            node_id: node_id.to_string(),
        };
        true
    }

    pub fn drag_move(&mut self, node_id: &str, x: f32, y: f32) {
        if self.layout.node(node_id).is_none() {
            log::debug!("drag_move on unknown node {node_id}, ignored");
            return;
        }
        self.layout = reposition(&self.layout, &NodePatch::new(node_id, x, y), &self.config.layout);
        for chart in self.charts.iter_mut().filter(|chart| chart.node_id == node_id) {
            chart.center = (x, y);
        }
    }

    pub fn drag_end(&mut self, node_id: &str) {
        if let DragPhase::Dragging { node_id: active } = &self.drag
            && active != node_id
        {
            log::debug!("drag_end for {node_id} while dragging {active}");
        }
        self.drag = DragPhase::Idle;
    }

    pub fn toggle_chart(&mut self, node_id: &str) -> ChartToggle {
        if let Some(pos) = self.charts.iter().position(|chart| chart.node_id == node_id) {
            self.charts.remove(pos);
            return ChartToggle::Hidden;
        }
        let Some(node) = self.layout.node(node_id) else {
            log::warn!("chart requested for unknown node {node_id}");
            return ChartToggle::UnknownNode;
        };
        match radial_chart(
            node,
            &self.inputs.deviations,
            &self.config.theme,
            &self.config.layout,
        ) {
            Some(chart) => {
                self.charts.push(chart);
                ChartToggle::Shown
            }
            None => {
                log::warn!("Label not found in the mapping: {}", node.label);
                ChartToggle::Unmapped
            }
        }
    }

    pub fn render_svg(&self) -> String {
        let scene = Scene::new(&self.layout)
            .with_charts(&self.charts)
            .with_node_order(&self.node_order);
        render_svg(&scene, &self.config.theme, &self.config.layout)
    }

    pub fn layout(&self) -> &ConformanceLayout {
        &self.layout
    }

    pub fn charts(&self) -> &[RadialChart] {
        &self.charts
    }

    pub fn node_order(&self) -> &[String] {
        &self.node_order
    }

    pub fn drag_phase(&self) -> &DragPhase {
        &self.drag
    }

    pub fn show_non_compliant(&self) -> bool {
        self.show_non_compliant
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
