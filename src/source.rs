//! Where the conformance view gets its inputs from: the PNML reference model
//! plus the event-log statistics computed by an external backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ir::{ConformanceInputs, DeviationCounts, StateMapping, Statistic};
use crate::parser::{parse_json_payload, parse_state_mapping};

pub const MODEL_FILE: &str = "reference_model.pnml";
pub const MAPPING_FILE: &str = "mapping.txt";
pub const MAPPING_JSON_FILE: &str = "mapping.json";
pub const TRANSITIONS_FILE: &str = "transition_times.json";
pub const DEVIATIONS_FILE: &str = "deviations.json";
pub const DURATIONS_FILE: &str = "state_times.json";

/// Collaborator supplying everything one build needs.
pub trait DataSource {
    fn reference_model(&self) -> Result<String>;
    fn state_mapping(&self) -> Result<StateMapping>;
    fn observed_transition_stats(&self) -> Result<BTreeMap<String, Statistic>>;
    fn deviation_counts(&self) -> Result<DeviationCounts>;
    fn state_durations(&self) -> Result<BTreeMap<String, String>>;

    /// Fetches the non-model inputs in one go.
    fn conformance_inputs(&self) -> Result<ConformanceInputs> {
        Ok(ConformanceInputs {
            mapping: self.state_mapping()?,
            transition_stats: self.observed_transition_stats()?,
            deviations: self.deviation_counts()?,
            durations: self.state_durations()?,
        })
    }
}

/// Reads inputs from files. Every path can be overridden individually; the
/// defaults live under one data directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    pub model: PathBuf,
    pub mapping: Option<PathBuf>,
    pub transitions: PathBuf,
    pub deviations: PathBuf,
    pub durations: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            mapping: None,
            transitions: dir.join(TRANSITIONS_FILE),
            deviations: dir.join(DEVIATIONS_FILE),
            durations: dir.join(DURATIONS_FILE),
        }
        .with_default_mapping(dir)
    }

    fn with_default_mapping(mut self, dir: &Path) -> Self {
        let text = dir.join(MAPPING_FILE);
        let json = dir.join(MAPPING_JSON_FILE);
        self.mapping = Some(if !text.exists() && json.exists() {
            json
        } else {
            text
        });
        self
    }

    pub fn with_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.model = path.into();
        self
    }

    pub fn with_mapping(mut self, path: impl Into<PathBuf>) -> Self {
        self.mapping = Some(path.into());
        self
    }

    pub fn with_transitions(mut self, path: impl Into<PathBuf>) -> Self {
        self.transitions = path.into();
        self
    }

    pub fn with_deviations(mut self, path: impl Into<PathBuf>) -> Self {
        self.deviations = path.into();
        self
    }

    pub fn with_durations(mut self, path: impl Into<PathBuf>) -> Self {
        self.durations = path.into();
        self
    }
}

impl DataSource for DirectorySource {
    fn reference_model(&self) -> Result<String> {
        read_required(&self.model)
    }

    fn state_mapping(&self) -> Result<StateMapping> {
        match self.mapping.as_deref().map(read_optional).transpose()?.flatten() {
            Some(text) => parse_state_mapping(&text),
            None => {
                log::warn!("no state mapping found; nodes will have no state codes");
                Ok(StateMapping::new())
            }
        }
    }

    fn observed_transition_stats(&self) -> Result<BTreeMap<String, Statistic>> {
        read_json_or_default("transition statistics", &self.transitions)
    }

    fn deviation_counts(&self) -> Result<DeviationCounts> {
        read_json_or_default("deviation counts", &self.deviations)
    }

    fn state_durations(&self) -> Result<BTreeMap<String, String>> {
        read_json_or_default("state durations", &self.durations)
    }
}

fn read_required(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("{} not found, using empty value", path.display());
            Ok(None)
        }
        Err(source) => Err(Error::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_json_or_default<T>(what: &'static str, path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match read_optional(path)? {
        Some(text) if !text.trim().is_empty() => parse_json_payload(what, &text),
        _ => Ok(T::default()),
    }
}

/// Inputs held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub model: String,
    pub inputs: ConformanceInputs,
}

impl StaticSource {
    pub fn new(model: impl Into<String>, inputs: ConformanceInputs) -> Self {
        Self {
            model: model.into(),
            inputs,
        }
    }
}

impl DataSource for StaticSource {
    fn reference_model(&self) -> Result<String> {
        Ok(self.model.clone())
    }

    fn state_mapping(&self) -> Result<StateMapping> {
        Ok(self.inputs.mapping.clone())
    }

    fn observed_transition_stats(&self) -> Result<BTreeMap<String, Statistic>> {
        Ok(self.inputs.transition_stats.clone())
    }

    fn deviation_counts(&self) -> Result<DeviationCounts> {
        Ok(self.inputs.deviations.clone())
    }

    fn state_durations(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.inputs.durations.clone())
    }

    fn conformance_inputs(&self) -> Result<ConformanceInputs> {
        Ok(self.inputs.clone())
    }
}
