//! Comparison of the transitions a reference model allows against the
//! transitions observed in an event log.

use crate::ir::{ModelArc, Node, PetriNet, StateMapping, TransitionKey};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Non-fatal problems found while building a conformance graph. The affected
/// arc or transition is dropped and the build carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BuildWarning {
    UnknownArcEndpoint { source: String, target: String },
    UnresolvedTransition { key: String },
    MalformedTransitionKey { key: String },
    UnmappedLabel { node_id: String, label: String },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::UnknownArcEndpoint { source, target } => {
                write!(f, "arc {source} -> {target} references an unknown node")
            }
            BuildWarning::UnresolvedTransition { key } => {
                write!(f, "observed transition {key} does not resolve to model nodes")
            }
            BuildWarning::MalformedTransitionKey { key } => {
                write!(f, "observed transition key '{key}' is not of the form A->B")
            }
            BuildWarning::UnmappedLabel { node_id, label } => {
                write!(f, "node {node_id} label '{label}' has no state code")
            }
        }
    }
}

/// Transitions keyed by source code, then target code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionSet(BTreeMap<String, BTreeSet<String>>);

impl TransitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: &str, target: &str) -> bool {
        self.0
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string())
    }

    pub fn contains(&self, key: &TransitionKey) -> bool {
        self.0
            .get(&key.source)
            .is_some_and(|targets| targets.contains(&key.target))
    }

    pub fn targets_of(&self, source: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(source)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = TransitionKey> + '_ {
        self.0.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |target| TransitionKey::new(source, target))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceArc {
    pub source: String,
    pub target: String,
    pub compliant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceDiff {
    pub valid: TransitionSet,
    /// Observed keys with no model arc, sorted.
    pub non_compliant: Vec<TransitionKey>,
    pub compliant_arcs: Vec<ConformanceArc>,
    pub non_compliant_arcs: Vec<ConformanceArc>,
    pub warnings: Vec<BuildWarning>,
}

impl ConformanceDiff {
    /// Arcs to draw: the model arcs, plus the synthesized ones when deviations
    /// are shown.
    pub fn arcs(&self, show_non_compliant: bool) -> Vec<ConformanceArc> {
        let mut arcs = self.compliant_arcs.clone();
        if show_non_compliant {
            arcs.extend(self.non_compliant_arcs.iter().cloned());
        }
        arcs
    }
}

/// Derives the valid transition set from the model arcs and synthesizes an
/// arc for every observed transition that the model does not contain.
pub fn diff_transitions<'a, I>(net: &PetriNet, mapping: &StateMapping, observed: I) -> ConformanceDiff
where
    I: IntoIterator<Item = &'a TransitionKey>,
{
    let mut diff = ConformanceDiff::default();

    for arc in &net.arcs {
        let (Some(source), Some(target)) = (net.node(&arc.source), net.node(&arc.target)) else {
            warn(
                &mut diff.warnings,
                BuildWarning::UnknownArcEndpoint {
                    source: arc.source.clone(),
                    target: arc.target.clone(),
                },
            );
            continue;
        };
        if let Some(key) = model_transition(source, target, mapping) {
            diff.valid.insert(&key.source, &key.target);
        }
        diff.compliant_arcs.push(compliant_arc(arc));
    }

    let observed: BTreeSet<&TransitionKey> = observed.into_iter().collect();
    diff.non_compliant = observed
        .into_iter()
        .filter(|key| !diff.valid.contains(key))
        .cloned()
        .collect();

    for key in &diff.non_compliant {
        let source = first_node_with_code(net, mapping, &key.source);
        let target = first_node_with_code(net, mapping, &key.target);
        match (source, target) {
            (Some(source), Some(target)) => diff.non_compliant_arcs.push(ConformanceArc {
                source: source.id.clone(),
                target: target.id.clone(),
                compliant: false,
            }),
            _ => warn(
                &mut diff.warnings,
                BuildWarning::UnresolvedTransition {
                    key: key.to_string(),
                },
            ),
        }
    }

    log::debug!(
        "conformance diff: {} valid, {} non-compliant ({} drawable)",
        diff.valid.len(),
        diff.non_compliant.len(),
        diff.non_compliant_arcs.len()
    );
    diff
}

fn model_transition(source: &Node, target: &Node, mapping: &StateMapping) -> Option<TransitionKey> {
    let source_code = mapping.code_for(&source.label)?;
    let target_code = mapping.code_for(&target.label)?;
    Some(TransitionKey::new(source_code, target_code))
}

fn compliant_arc(arc: &ModelArc) -> ConformanceArc {
    ConformanceArc {
        source: arc.source.clone(),
        target: arc.target.clone(),
        compliant: true,
    }
}

fn first_node_with_code<'n>(net: &'n PetriNet, mapping: &StateMapping, code: &str) -> Option<&'n Node> {
    net.nodes()
        .find(|node| mapping.code_for(&node.label) == Some(code))
}

pub(crate) fn warn(warnings: &mut Vec<BuildWarning>, warning: BuildWarning) {
    log::warn!("{warning}");
    warnings.push(warning);
}
