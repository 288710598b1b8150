use std::collections::BTreeMap;

use pnml_conformance_renderer::ir::{ConformanceInputs, DeviationCounts, StateMapping, Statistic};
use pnml_conformance_renderer::{NodePatch, RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Everything the page fetched from the backend, in one JSON document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConformancePayload {
    reference_model: String,
    #[serde(default)]
    mapping: StateMapping,
    #[serde(default)]
    transition_times: BTreeMap<String, Statistic>,
    #[serde(default)]
    deviations: DeviationCounts,
    #[serde(default)]
    state_times: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConformanceRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text: Option<bool>,
    width: Option<f32>,
    height: Option<f32>,
    show_non_compliant: Option<bool>,
    #[serde(default)]
    charts: Vec<String>,
    #[serde(default)]
    moves: Vec<MoveOption>,
}

#[derive(Debug, Deserialize)]
struct MoveOption {
    id: String,
    x: f32,
    y: f32,
}

fn build_render_options(options: ConformanceRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("light") {
        RenderOptions::light()
    } else {
        RenderOptions::dark()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    // Browsers have no system font database to measure with.
    render_options.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    if let Some(width) = options.width {
        render_options.width = width;
    }
    if let Some(height) = options.height {
        render_options.height = height;
    }
    render_options.show_non_compliant = options.show_non_compliant.unwrap_or(false);
    render_options.charts = options.charts;
    render_options.moves = options
        .moves
        .into_iter()
        .map(|m| NodePatch::new(&m.id, m.x, m.y))
        .collect();

    render_options
}

fn split_payload(payload: ConformancePayload) -> (String, ConformanceInputs) {
    let inputs = ConformanceInputs {
        mapping: payload.mapping,
        transition_stats: payload.transition_times,
        deviations: payload.deviations,
        durations: payload.state_times,
    };
    (payload.reference_model, inputs)
}

#[wasm_bindgen]
pub fn render_conformance_svg(inputs_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let payload = serde_json::from_str::<ConformancePayload>(inputs_json)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<ConformanceRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        ConformanceRenderOptions::default()
    };

    let (model, inputs) = split_payload(payload);
    render_with_options(&model, &inputs, build_render_options(options))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use pnml_conformance_renderer::render_with_options;

    use crate::{ConformancePayload, ConformanceRenderOptions, build_render_options, split_payload};

    #[test]
    fn renders_payload_with_deviation_arc() {
        let raw = r#"{
            "referenceModel": "<pnml><net id=\"n\"><place id=\"p1\"><name><text>Open</text></name></place><place id=\"p2\"><name><text>Done</text></name></place><arc id=\"a\" source=\"p1\" target=\"p2\"/></net></pnml>",
            "mapping": {"Open": "O", "Done": "D"},
            "transitionTimes": {"O->D": 3, "D->O": "0d, 1h, 0min"},
            "deviations": {"missing": {"O": 1}}
        }"#;
        let payload: ConformancePayload = serde_json::from_str(raw).unwrap();
        let options: ConformanceRenderOptions =
            serde_json::from_str(r#"{"showNonCompliant": true, "charts": ["p1"], "moves": [{"id": "p2", "x": 300, "y": 90}]}"#)
                .unwrap();
        let (model, inputs) = split_payload(payload);

        let svg = render_with_options(&model, &inputs, build_render_options(options))
            .expect("conformance payload should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("non-compliant"));
        assert!(svg.contains("0d, 1h, 0min"));
        assert!(svg.contains("class=\"chart\""));
    }
}
