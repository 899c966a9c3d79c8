//! Per-event weight readers.

use std::collections::BTreeMap;

use prec_core::{ErrorInfo, PrecError};
use prec_frame::{RowView, Table};
use serde::{Deserialize, Serialize};

/// Final-state legs whose truth lineage drives the decay weight.
pub const LEGS: [&str; 3] = ["L1", "L2", "H"];

/// Column tagging each row with its source sample.
pub const PROC_COLUMN: &str = "proc";

/// Computes a decay weight for one row from the truth information of `legs`.
pub trait DecayWeightReader {
    /// Weight of `row`; `legs` are column prefixes such as `L1`.
    fn read_weight(&self, row: &RowView<'_>, legs: &[&str]) -> Result<f64, PrecError>;
}

/// Computes weights balancing the samples mixed in a combined table.
pub trait SampleWeightReader {
    /// One weight per row of `table`, which carries a `proc` text column.
    fn weights(&self, table: &Table) -> Result<Vec<f64>, PrecError>;
}

/// Decay weights from the parent identity of each leg.
///
/// The weight is the product over legs of the factor registered for
/// `|{leg}_MC_MOTHER_ID|`, or `default_factor` for ids without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotherIdDecayWeights {
    /// Factor per absolute mother id.
    pub factors: BTreeMap<i64, f64>,
    /// Factor for unlisted ids.
    pub default_factor: f64,
}

impl Default for MotherIdDecayWeights {
    fn default() -> Self {
        Self {
            factors: BTreeMap::new(),
            default_factor: 1.0,
        }
    }
}

impl MotherIdDecayWeights {
    /// Reader with no registered ids.
    pub fn new(default_factor: f64) -> Self {
        Self {
            factors: BTreeMap::new(),
            default_factor,
        }
    }

    /// Registers the factor for mother id `id` (sign ignored).
    pub fn with_factor(mut self, id: i64, factor: f64) -> Self {
        self.factors.insert(id.abs(), factor);
        self
    }
}

impl DecayWeightReader for MotherIdDecayWeights {
    fn read_weight(&self, row: &RowView<'_>, legs: &[&str]) -> Result<f64, PrecError> {
        let mut weight = 1.0;
        for leg in legs {
            let id = row.get(&format!("{leg}_MC_MOTHER_ID"))?.abs().round() as i64;
            weight *= self.factors.get(&id).copied().unwrap_or(self.default_factor);
        }
        Ok(weight)
    }
}

/// Sample weights that give every source sample a target share of the mix.
///
/// A row of sample `p` weighs `share[p] · N / n[p]`, with `N` the total row
/// count and `n[p]` the rows contributed by `p`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessShareWeights {
    /// Target share per sample name.
    pub shares: BTreeMap<String, f64>,
    /// Share of samples missing from `shares`; `None` makes them an error.
    #[serde(default)]
    pub default_share: Option<f64>,
}

impl ProcessShareWeights {
    /// Reader with no shares.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader giving every sample the same share.
    pub fn uniform() -> Self {
        Self {
            shares: BTreeMap::new(),
            default_share: Some(1.0),
        }
    }

    /// Sets the share of `sample`.
    pub fn with_share(mut self, sample: impl Into<String>, share: f64) -> Self {
        self.shares.insert(sample.into(), share);
        self
    }
}

impl SampleWeightReader for ProcessShareWeights {
    fn weights(&self, table: &Table) -> Result<Vec<f64>, PrecError> {
        let procs = table.text(PROC_COLUMN)?;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for proc in procs {
            *counts.entry(proc.as_str()).or_default() += 1;
        }
        let total = procs.len() as f64;
        let mut per_proc = BTreeMap::new();
        for (proc, count) in counts {
            let share = self.shares.get(proc).copied().or(self.default_share);
            let share = share.ok_or_else(|| {
                PrecError::Weight(
                    ErrorInfo::new("missing-share", format!("no sample share for '{proc}'"))
                        .with_context("sample", proc),
                )
            })?;
            per_proc.insert(proc, share * total / count as f64);
        }
        Ok(procs.iter().map(|proc| per_proc[proc.as_str()]).collect())
    }
}
