use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Place,
    Transition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArc {
    pub source: String,
    pub target: String,
}

/// Structural view of a PNML net: places, transitions and the arcs between
/// their ids, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetriNet {
    pub places: Vec<Node>,
    pub transitions: Vec<Node>,
    pub arcs: Vec<ModelArc>,
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All places followed by all transitions. Layout and index-based
    /// addressing depend on this order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.places.iter().chain(self.transitions.iter())
    }

    pub fn node_count(&self) -> usize {
        self.places.len() + self.transitions.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes().find(|node| node.id == id)
    }

    pub fn add_place(&mut self, id: &str, label: Option<&str>) {
        self.places.push(Node {
            id: id.to_string(),
            label: label.unwrap_or(id).to_string(),
            kind: NodeKind::Place,
        });
    }

    pub fn add_transition(&mut self, id: &str, label: Option<&str>) {
        self.transitions.push(Node {
            id: id.to_string(),
            label: label.unwrap_or(id).to_string(),
            kind: NodeKind::Transition,
        });
    }

    pub fn add_arc(&mut self, source: &str, target: &str) {
        self.arcs.push(ModelArc {
            source: source.to_string(),
            target: target.to_string(),
        });
    }
}

/// Separator between the two codes of an observed transition key.
pub const TRANSITION_SEPARATOR: &str = "->";

/// A transition between two process states, addressed by state code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionKey {
    pub source: String,
    pub target: String,
}

impl TransitionKey {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// Splits `"N->A"` on the first separator. Codes are not escaped in the
    /// input format, so a code that itself contains `->` cannot round-trip.
    pub fn parse(raw: &str) -> Option<Self> {
        let (source, target) = raw.split_once(TRANSITION_SEPARATOR)?;
        let source = source.trim();
        let target = target.trim();
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self::new(source, target))
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.source, TRANSITION_SEPARATOR, self.target)
    }
}

/// Per-transition statistic supplied by the event-log backend: either a raw
/// number or an already formatted string such as `"1d, 2h, 5min"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Statistic {
    Number(f64),
    Text(String),
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Number(value) => {
                // At most two decimals, without trailing zeros.
                let text = format!("{value:.2}");
                f.write_str(text.trim_end_matches('0').trim_end_matches('.'))
            }
            Statistic::Text(text) => f.write_str(text),
        }
    }
}

/// Place/transition label to process-state code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMapping(BTreeMap<String, String>);

impl StateMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: &str, code: &str) {
        self.0.insert(label.to_string(), code.to_string());
    }

    pub fn code_for(&self, label: &str) -> Option<&str> {
        self.0
            .get(label)
            .map(String::as_str)
            .filter(|code| !code.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for StateMapping {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviationCategory {
    Missing,
    Repetition,
    Mismatch,
}

impl DeviationCategory {
    pub const ALL: [DeviationCategory; 3] = [
        DeviationCategory::Missing,
        DeviationCategory::Repetition,
        DeviationCategory::Mismatch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeviationCategory::Missing => "MISSING",
            DeviationCategory::Repetition => "REPETITION",
            DeviationCategory::Mismatch => "MISMATCH",
        }
    }
}

/// Alignment deviation counts per state code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviationCounts {
    #[serde(default)]
    pub missing: BTreeMap<String, u64>,
    #[serde(default)]
    pub repetition: BTreeMap<String, u64>,
    #[serde(default)]
    pub mismatch: BTreeMap<String, u64>,
}

impl DeviationCounts {
    /// Unknown codes count as zero.
    pub fn count(&self, category: DeviationCategory, code: &str) -> u64 {
        let table = match category {
            DeviationCategory::Missing => &self.missing,
            DeviationCategory::Repetition => &self.repetition,
            DeviationCategory::Mismatch => &self.mismatch,
        };
        table.get(code).copied().unwrap_or(0)
    }

    pub fn total(&self, code: &str) -> u64 {
        DeviationCategory::ALL
            .iter()
            .map(|category| self.count(*category, code))
            .sum()
    }
}

/// Everything the conformance view needs besides the reference model itself.
#[derive(Debug, Clone, Default)]
pub struct ConformanceInputs {
    pub mapping: StateMapping,
    pub transition_stats: BTreeMap<String, Statistic>,
    pub deviations: DeviationCounts,
    pub durations: BTreeMap<String, String>,
}

impl ConformanceInputs {
    /// Observed transitions with parseable keys; malformed keys are returned
    /// separately so the caller can report them.
    pub fn observed_transitions(&self) -> (BTreeMap<TransitionKey, Statistic>, Vec<String>) {
        let mut observed = BTreeMap::new();
        let mut malformed = Vec::new();
        for (raw, stat) in &self.transition_stats {
            match TransitionKey::parse(raw) {
                Some(key) => {
                    observed.insert(key, stat.clone());
                }
                None => malformed.push(raw.clone()),
            }
        }
        (observed, malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_key_splits_on_first_separator() {
        let key = TransitionKey::parse("N->A").unwrap();
        assert_eq!(key, TransitionKey::new("N", "A"));
        assert_eq!(key.to_string(), "N->A");

        let odd = TransitionKey::parse("X->Y->Z").unwrap();
        assert_eq!(odd.source, "X");
        assert_eq!(odd.target, "Y->Z");

        assert!(TransitionKey::parse("NA").is_none());
        assert!(TransitionKey::parse("->A").is_none());
    }

    #[test]
    fn nodes_iterate_places_before_transitions() {
        let mut net = PetriNet::new();
        net.add_transition("t1", Some("Assign"));
        net.add_place("p1", None);
        let ids: Vec<&str> = net.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "t1"]);
        assert_eq!(net.node("p1").unwrap().label, "p1");
    }

    #[test]
    fn statistic_accepts_numbers_and_text() {
        let stats: BTreeMap<String, Statistic> =
            serde_json::from_str(r#"{"N->A": 5, "A->W": "1d, 2h, 0min", "W->R": 2.5}"#).unwrap();
        assert_eq!(stats["N->A"].to_string(), "5");
        assert_eq!(stats["A->W"].to_string(), "1d, 2h, 0min");
        assert_eq!(stats["W->R"].to_string(), "2.5");
    }

    #[test]
    fn numeric_statistics_drop_trailing_zeros() {
        assert_eq!(Statistic::Number(120.0).to_string(), "120");
        assert_eq!(Statistic::Number(0.126).to_string(), "0.13");
        assert_eq!(Statistic::Number(3.999).to_string(), "4");
        assert_eq!(Statistic::Number(0.0).to_string(), "0");
    }

    #[test]
    fn deviation_counts_default_missing_codes_to_zero() {
        let counts: DeviationCounts =
            serde_json::from_str(r#"{"missing": {"N": 2}, "mismatch": {"N": 1}}"#).unwrap();
        assert_eq!(counts.count(DeviationCategory::Missing, "N"), 2);
        assert_eq!(counts.count(DeviationCategory::Repetition, "N"), 0);
        assert_eq!(counts.total("N"), 3);
        assert_eq!(counts.total("Q"), 0);
    }

    #[test]
    fn empty_codes_do_not_map() {
        let mut mapping = StateMapping::new();
        mapping.insert("Detection", "N");
        mapping.insert("Unused", "");
        assert_eq!(mapping.code_for("Detection"), Some("N"));
        assert_eq!(mapping.code_for("Unused"), None);
    }
}
