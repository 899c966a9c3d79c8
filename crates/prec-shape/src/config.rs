//! Builder configuration and the observable description.

use std::fs;
use std::path::{Path, PathBuf};

use prec_core::{from_yaml_slice, ErrorInfo, PrecError};
use serde::{Deserialize, Serialize};

/// Where observable bounds are applied relative to the cache boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BoundsPolicy {
    /// Cache the pre-bounds category table; bounds never enter the key.
    #[default]
    AfterCache,
    /// Apply bounds before caching and hash them into the key.
    InKey,
}

/// Knobs of a [`crate::Prec`] that do not change which rows are selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecConfig {
    /// Directory holding `pdf_<hash>.json` entries; created on demand.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// When false every category table is rebuilt and nothing is written.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    /// Categories with fewer rows inside the observable are dropped.
    #[serde(default = "default_min_entries")]
    pub min_entries: usize,
    /// Placement of the observable bounds filter.
    #[serde(default)]
    pub bounds_policy: BoundsPolicy,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".prec-cache")
}

fn default_use_cache() -> bool {
    true
}

fn default_min_entries() -> usize {
    30
}

impl Default for PrecConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            use_cache: default_use_cache(),
            min_entries: default_min_entries(),
            bounds_policy: BoundsPolicy::default(),
        }
    }
}

impl PrecConfig {
    /// Configuration caching under `dir`, other fields defaulted.
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Parses a YAML document.
    pub fn from_yaml_slice(data: &[u8]) -> Result<Self, PrecError> {
        from_yaml_slice(data)
    }

    /// Reads a YAML file.
    pub fn load(path: &Path) -> Result<Self, PrecError> {
        let data = fs::read(path).map_err(|err| {
            PrecError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_slice(&data)
    }
}

/// The fit observable: which mass range the density lives on.
///
/// Only its bounds are used, and only after the cache lookup unless
/// [`BoundsPolicy::InKey`] is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    /// Axis label.
    pub name: String,
    /// Lower bound, exclusive for row selection.
    pub low: f64,
    /// Upper bound, exclusive for row selection.
    pub high: f64,
}

impl Observable {
    /// Creates an observable, requiring finite `low < high`.
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Result<Self, PrecError> {
        let name = name.into();
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(PrecError::Config(
                ErrorInfo::new("invalid-observable", "observable bounds must be finite with low < high")
                    .with_context("observable", name)
                    .with_context("bounds", format!("({low}, {high})")),
            ));
        }
        Ok(Self { name, low, high })
    }

    /// `(low, high)`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// Open-interval window on `mass`, e.g. `(4500 < B_M) & (B_M < 6000)`.
    pub fn window_expr(&self, mass: &str) -> String {
        format!("({:?} < {mass}) & ({mass} < {:?})", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fields_default() {
        let config = PrecConfig::from_yaml_slice(b"min_entries: 10\n").expect("yaml");
        assert_eq!(config.min_entries, 10);
        assert_eq!(config.cache_dir, PathBuf::from(".prec-cache"));
        assert!(config.use_cache);
        assert_eq!(config.bounds_policy, BoundsPolicy::AfterCache);

        let config = PrecConfig::from_yaml_slice(b"bounds_policy: in-key\nuse_cache: false\n").expect("yaml");
        assert_eq!(config.bounds_policy, BoundsPolicy::InKey);
        assert!(!config.use_cache);
    }

    #[test]
    fn observable_window_is_open() {
        let obs = Observable::new("mass", 4500.0, 6000.0).expect("obs");
        assert_eq!(obs.window_expr("B_M"), "(4500.0 < B_M) & (B_M < 6000.0)");
        assert!(Observable::new("mass", 6000.0, 4500.0).is_err());
    }
}
