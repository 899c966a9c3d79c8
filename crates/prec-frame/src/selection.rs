//! Default analysis selection lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use prec_core::{from_yaml_slice, ErrorInfo, PrecError, Regime};
use serde::{Deserialize, Serialize};

/// Named cut expressions in application order.
pub type CutMap = IndexMap<String, String>;

/// Returns the default selection for a regime and sample.
pub trait SelectionProvider {
    /// Named cut expressions applied to `sample` in `regime`.
    fn selection(&self, regime: Regime, sample: &str) -> Result<CutMap, PrecError>;
}

/// Selection table layered as common cuts, then per-regime, then per-sample cuts.
///
/// A later layer replaces a cut of the same name in place, so the application
/// order of the common cuts is kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticSelection {
    /// Cuts applied everywhere.
    #[serde(default)]
    pub common: CutMap,
    /// Cuts specific to a regime.
    #[serde(default)]
    pub regimes: BTreeMap<Regime, CutMap>,
    /// Cuts specific to a sample.
    #[serde(default)]
    pub samples: BTreeMap<String, CutMap>,
}

impl StaticSelection {
    /// Creates a selection with only common cuts.
    pub fn new(common: CutMap) -> Self {
        Self {
            common,
            ..Self::default()
        }
    }

    /// Parses a YAML selection description.
    pub fn from_yaml_slice(data: &[u8]) -> Result<Self, PrecError> {
        from_yaml_slice(data)
    }

    /// Loads a YAML selection description from disk.
    pub fn load(path: &Path) -> Result<Self, PrecError> {
        let bytes = fs::read(path).map_err(|err| {
            PrecError::Config(
                ErrorInfo::new("selection-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_slice(&bytes)
    }
}

impl SelectionProvider for StaticSelection {
    fn selection(&self, regime: Regime, sample: &str) -> Result<CutMap, PrecError> {
        let mut cuts = self.common.clone();
        if let Some(layer) = self.regimes.get(&regime) {
            cuts.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(layer) = self.samples.get(sample) {
            cuts.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(cuts)
    }
}
