//! Data sources resolving `(sample, trigger)` pairs into frames.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use prec_core::{from_json_slice, ErrorInfo, PrecError};

use crate::frame::Frame;
use crate::table::Table;

/// Turns a sample name and trigger into filterable rows.
pub trait DataSource {
    /// Returns the rows for `sample` recorded under `trigger`.
    fn frame(&self, sample: &str, trigger: &str) -> Result<Frame, PrecError>;
}

fn missing_sample(sample: &str, trigger: &str) -> PrecError {
    PrecError::Data(
        ErrorInfo::new("missing-sample", "no rows registered for sample")
            .with_context("sample", sample)
            .with_context("trigger", trigger),
    )
}

/// Tables held in memory, keyed by `(sample, trigger)`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: BTreeMap<(String, String), Table>,
}

impl InMemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rows of `sample` under `trigger`, replacing earlier rows.
    pub fn insert(&mut self, sample: impl Into<String>, trigger: impl Into<String>, table: Table) {
        self.tables.insert((sample.into(), trigger.into()), table);
    }

    /// Builder-style variant of [`InMemorySource::insert`].
    pub fn with(mut self, sample: impl Into<String>, trigger: impl Into<String>, table: Table) -> Self {
        self.insert(sample, trigger, table);
        self
    }
}

impl DataSource for InMemorySource {
    fn frame(&self, sample: &str, trigger: &str) -> Result<Frame, PrecError> {
        self.tables
            .get(&(sample.to_string(), trigger.to_string()))
            .cloned()
            .map(Frame::new)
            .ok_or_else(|| missing_sample(sample, trigger))
    }
}

/// Tables stored as JSON files under `{root}/{sample}/{trigger}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of the file holding `sample` under `trigger`.
    pub fn path_for(&self, sample: &str, trigger: &str) -> PathBuf {
        self.root.join(sample).join(format!("{trigger}.json"))
    }
}

impl DataSource for JsonDirSource {
    fn frame(&self, sample: &str, trigger: &str) -> Result<Frame, PrecError> {
        let path = self.path_for(sample, trigger);
        if !path.exists() {
            return Err(missing_sample(sample, trigger));
        }
        let bytes = fs::read(&path).map_err(|err| {
            PrecError::Data(
                ErrorInfo::new("sample-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let table: Table = from_json_slice(&bytes)?;
        Ok(Frame::new(table))
    }
}
