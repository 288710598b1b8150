use crate::error::{Error, Result};
use crate::ir::{PetriNet, StateMapping};
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node as XmlNode;
use serde::de::DeserializeOwned;

static MAPPING_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^['"]?(?P<label>.+?)['"]?\s*:\s*['"]?(?P<code>[^'",]*?)['"]?\s*,?$"#).unwrap()
});

/// Parses a PNML document into its places, transitions and arcs.
///
/// Only the first `net` is read. Elements wrapped in `page` elements are
/// flattened in document order. Nodes without an `id` and arcs without both
/// endpoints are skipped.
pub fn parse_pnml(input: &str) -> Result<PetriNet> {
    let doc = roxmltree::Document::parse(input)?;
    let root = doc.root_element();
    if root.tag_name().name() != "pnml" {
        return Err(Error::MissingNet);
    }
    let net = root
        .children()
        .find(|child| child.has_tag_name("net"))
        .ok_or(Error::MissingNet)?;

    let mut parsed = PetriNet::new();
    collect_net_elements(net, &mut parsed);
    log::debug!(
        "parsed PNML net: {} places, {} transitions, {} arcs",
        parsed.places.len(),
        parsed.transitions.len(),
        parsed.arcs.len()
    );
    Ok(parsed)
}

fn collect_net_elements(parent: XmlNode<'_, '_>, net: &mut PetriNet) {
    for child in parent.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "page" => collect_net_elements(child, net),
            "place" => {
                if let Some(id) = child.attribute("id") {
                    net.add_place(id, node_name(child).as_deref());
                } else {
                    log::warn!("skipping place without an id attribute");
                }
            }
            "transition" => {
                if let Some(id) = child.attribute("id") {
                    net.add_transition(id, node_name(child).as_deref());
                } else {
                    log::warn!("skipping transition without an id attribute");
                }
            }
            "arc" => match (child.attribute("source"), child.attribute("target")) {
                (Some(source), Some(target)) => net.add_arc(source, target),
                _ => log::warn!(
                    "skipping arc {} without source/target",
                    child.attribute("id").unwrap_or("<unnamed>")
                ),
            },
            _ => {}
        }
    }
}

fn node_name(node: XmlNode<'_, '_>) -> Option<String> {
    let name = node.children().find(|c| c.has_tag_name("name"))?;
    let text = name.children().find(|c| c.has_tag_name("text"))?;
    let value = text.text()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Reads a label-to-code mapping.
///
/// Accepts a JSON object, its relaxed JSON5 form, or the line-oriented
/// `'Detection': 'N',` format written by the mapping editor. Unrecognised
/// lines in that format are logged and skipped; the mapping is rejected only
/// when no line could be read at all.
pub fn parse_state_mapping(input: &str) -> Result<StateMapping> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(StateMapping::new());
    }
    if let Ok(mapping) = serde_json::from_str::<StateMapping>(trimmed) {
        return Ok(mapping);
    }
    if let Ok(mapping) = json5::from_str::<StateMapping>(trimmed) {
        return Ok(mapping);
    }

    let mut mapping = StateMapping::new();
    let mut recognised = 0usize;
    let mut first_skipped = None;
    for raw_line in trimmed.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line == "{" || line == "}" {
            continue;
        }
        let Some(caps) = MAPPING_LINE_RE.captures(line) else {
            log::warn!("skipping unrecognised mapping line '{line}'");
            if first_skipped.is_none() {
                first_skipped = Some(line);
            }
            continue;
        };
        recognised += 1;
        let label = caps["label"].trim();
        let code = caps["code"].trim();
        if !code.is_empty() {
            mapping.insert(label, code);
        }
    }
    match first_skipped {
        Some(line) if recognised == 0 => {
            Err(Error::InvalidMapping(format!("unrecognised line '{line}'")))
        }
        _ => Ok(mapping),
    }
}

/// Deserializes a collaborator payload, retrying as JSON5 when strict JSON
/// fails.
pub fn parse_json_payload<T: DeserializeOwned>(what: &'static str, input: &str) -> Result<T> {
    match serde_json::from_str::<T>(input) {
        Ok(value) => Ok(value),
        Err(strict) => json5::from_str::<T>(input).map_err(|_| Error::Json {
            what,
            message: strict.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{NodeKind, Statistic};
    use std::collections::BTreeMap;

    const LINEAR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pnml xmlns="http://www.pnml.org/version-2009/grammar/pnml">
  <net id="net1" type="http://www.pnml.org/version-2009/grammar/ptnet">
    <place id="p1"><name><text>Detection</text></name></place>
    <place id="p2"><name><text> Activation </text></name></place>
    <transition id="t1"/>
    <arc id="a1" source="p1" target="t1"/>
    <arc id="a2" source="t1" target="p2"/>
  </net>
</pnml>"#;

    #[test]
    fn parses_places_transitions_and_arcs() {
        let net = parse_pnml(LINEAR).unwrap();
        assert_eq!(net.places.len(), 2);
        assert_eq!(net.places[0].label, "Detection");
        assert_eq!(net.places[1].label, "Activation");
        assert_eq!(net.transitions[0].label, "t1");
        assert_eq!(net.transitions[0].kind, NodeKind::Transition);
        assert_eq!(net.arcs.len(), 2);
        assert_eq!(net.arcs[1].source, "t1");
        assert_eq!(net.arcs[1].target, "p2");
    }

    #[test]
    fn missing_net_is_structural() {
        let err = parse_pnml("<pnml><page/></pnml>").unwrap_err();
        assert!(matches!(err, Error::MissingNet));
        assert!(err.is_structural());

        let err = parse_pnml("<other><net/></other>").unwrap_err();
        assert!(matches!(err, Error::MissingNet));
    }

    #[test]
    fn malformed_xml_is_structural() {
        let err = parse_pnml("<pnml><net>").unwrap_err();
        assert!(matches!(err, Error::Xml(_)));
        assert!(err.is_structural());
    }

    #[test]
    fn empty_net_yields_empty_collections() {
        let net = parse_pnml("<pnml><net id=\"n\"/></pnml>").unwrap();
        assert_eq!(net, PetriNet::new());
    }

    #[test]
    fn only_first_net_is_used() {
        let input = r#"<pnml>
            <net id="a"><place id="first"/></net>
            <net id="b"><place id="second"/></net>
        </pnml>"#;
        let net = parse_pnml(input).unwrap();
        assert_eq!(net.places.len(), 1);
        assert_eq!(net.places[0].id, "first");
    }

    #[test]
    fn pages_are_flattened_in_document_order() {
        let input = r#"<pnml><net id="n">
            <page id="pg1">
              <place id="p1"/>
              <transition id="t1"><name><text>Assign</text></name></transition>
            </page>
            <page id="pg2">
              <place id="p2"/>
              <arc id="a" source="p1" target="t1"/>
            </page>
        </net></pnml>"#;
        let net = parse_pnml(input).unwrap();
        let ids: Vec<&str> = net.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "t1"]);
        assert_eq!(net.arcs.len(), 1);
    }

    #[test]
    fn incomplete_elements_are_skipped() {
        let input = r#"<pnml><net>
            <place><name><text>No id</text></name></place>
            <place id="p1"/>
            <arc source="p1"/>
        </net></pnml>"#;
        let net = parse_pnml(input).unwrap();
        assert_eq!(net.places.len(), 1);
        assert!(net.arcs.is_empty());
    }

    #[test]
    fn reads_legacy_mapping_file() {
        let input = "{\n    'Detection': 'N',\n    'Activation': 'A',\n}\n";
        let mapping = parse_state_mapping(input).unwrap();
        assert_eq!(mapping.code_for("Detection"), Some("N"));
        assert_eq!(mapping.code_for("Activation"), Some("A"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn keeps_valid_lines_around_unreadable_ones() {
        let input = "{\n    'Detection': 'N',\n    'Awaiting Customer's Reply': 'W',\n    \
                     stray text\n    'Closure': 'C',\n}\n";
        let mapping = parse_state_mapping(input).unwrap();
        assert_eq!(mapping.code_for("Detection"), Some("N"));
        assert_eq!(mapping.code_for("Awaiting Customer's Reply"), Some("W"));
        assert_eq!(mapping.code_for("Closure"), Some("C"));
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn mapping_without_any_readable_line_is_rejected() {
        let err = parse_state_mapping("just some notes\nmore notes").unwrap_err();
        assert!(matches!(err, Error::InvalidMapping(_)));
    }

    #[test]
    fn reads_unquoted_mapping_lines() {
        let mapping = parse_state_mapping("Detection: N\nIn Progress: W").unwrap();
        assert_eq!(mapping.code_for("In Progress"), Some("W"));
    }

    #[test]
    fn reads_json_mapping() {
        let mapping = parse_state_mapping(r#"{"Resolved": "R"}"#).unwrap();
        assert_eq!(mapping.code_for("Resolved"), Some("R"));
        assert!(parse_state_mapping("   ").unwrap().is_empty());
    }

    #[test]
    fn payloads_fall_back_to_json5() {
        let stats: BTreeMap<String, Statistic> =
            parse_json_payload("transition statistics", "{'N->A': 5, // comment\n}").unwrap();
        assert_eq!(stats.len(), 1);
        let err = parse_json_payload::<BTreeMap<String, Statistic>>("transition statistics", "[")
            .unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
