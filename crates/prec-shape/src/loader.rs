//! Per-sample row loading: derived columns, selection, projection.

use log::{debug, info, warn};
use prec_core::{ErrorInfo, PrecError, Regime};
use prec_frame::{CutMap, CutReport, DataSource, Frame, SelectionProvider, Table};
use serde::{Deserialize, Serialize};

use crate::readers::PROC_COLUMN;

/// Name of the selection entry that is never applied at load time.
pub const MASS_CUT: &str = "mass";

/// Brem multiplicity requirement on the electron pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BremCategory {
    /// No recovered photon.
    Zero,
    /// Exactly one recovered photon.
    One,
    /// Two or more recovered photons.
    TwoOrMore,
}

impl BremCategory {
    /// Filter expression over the `nbrem` column.
    pub fn expr(&self) -> &'static str {
        match self {
            BremCategory::Zero => "nbrem == 0",
            BremCategory::One => "nbrem == 1",
            BremCategory::TwoOrMore => "nbrem >= 2",
        }
    }
}

impl TryFrom<u32> for BremCategory {
    type Error = PrecError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BremCategory::Zero),
            1 => Ok(BremCategory::One),
            2 => Ok(BremCategory::TwoOrMore),
            other => Err(PrecError::Config(
                ErrorInfo::new("invalid-nbrem", format!("invalid nbrem value: {other}"))
                    .with_hint("expected 0, 1 or 2 (meaning two or more)"),
            )),
        }
    }
}

/// Columns kept after selection: identities, mother identities and masses.
pub fn is_needed_column(name: &str) -> bool {
    name.ends_with("ID") || name.starts_with("B_const_mass") || name == "B_M" || name == "B_Mass"
}

/// Rows of one sample after selection.
#[derive(Debug, Clone)]
pub struct LoadedSample {
    /// Projected rows, tagged with the sample name in `proc`.
    pub table: Table,
    /// Cut flow of the selection.
    pub report: CutReport,
}

/// Turns a sample name into its selected, projected rows.
pub struct SampleLoader<'a> {
    source: &'a dyn DataSource,
    selection: &'a dyn SelectionProvider,
}

impl<'a> SampleLoader<'a> {
    /// Loader over the given collaborators.
    pub fn new(source: &'a dyn DataSource, selection: &'a dyn SelectionProvider) -> Self {
        Self { source, selection }
    }

    /// Loads `sample` for `trigger`.
    ///
    /// `overrides` replace default cuts of the same name and are appended when
    /// new. The cut named `mass` is skipped: mass windows belong to the density
    /// step.
    pub fn load(
        &self,
        sample: &str,
        trigger: &str,
        regime: Regime,
        overrides: Option<&CutMap>,
        nbrem: Option<BremCategory>,
    ) -> Result<LoadedSample, PrecError> {
        self.load_inner(sample, trigger, regime, overrides, nbrem)
            .map_err(|err| err.with_context("sample", sample).with_context("trigger", trigger))
    }

    fn load_inner(
        &self,
        sample: &str,
        trigger: &str,
        regime: Regime,
        overrides: Option<&CutMap>,
        nbrem: Option<BremCategory>,
    ) -> Result<LoadedSample, PrecError> {
        let mut frame = self.source.frame(sample, trigger)?;
        frame = add_derived_columns(frame)?;

        let cuts = merged_selection(self.selection.selection(regime, sample)?, overrides);
        for (name, expr) in &cuts {
            if name == MASS_CUT {
                debug!("Skipping mass cut for {sample}: {expr}");
                continue;
            }
            frame = frame.filter(expr, name)?;
        }
        if let Some(brem) = nbrem {
            debug!("Applying nbrem requirement: {}", brem.expr());
            frame = frame.filter(brem.expr(), "nbrem")?;
        }

        let columns: Vec<String> = frame
            .column_names()
            .into_iter()
            .filter(|name| is_needed_column(name))
            .collect();
        let mut table = frame.materialize(&columns)?;
        let n_rows = frame.n_rows();
        table.insert_text(PROC_COLUMN, vec![sample.to_string(); n_rows])?;

        let (_, report) = frame.into_parts();
        report.log(&format!("{sample} / {trigger}"));
        info!("Loaded {n_rows} rows from {sample} / {trigger}");
        Ok(LoadedSample { table, report })
    }
}

fn add_derived_columns(frame: Frame) -> Result<Frame, PrecError> {
    if !frame.has_column("nbrem") && frame.has_column("L1_HASBREM") && frame.has_column("L2_HASBREM") {
        return frame.define("nbrem", "L1_HASBREM + L2_HASBREM");
    }
    Ok(frame)
}

fn merged_selection(mut cuts: CutMap, overrides: Option<&CutMap>) -> CutMap {
    let Some(overrides) = overrides else {
        return cuts;
    };
    warn!("Overriding default selection");
    for (name, expr) in overrides {
        if let Some(previous) = cuts.insert(name.clone(), expr.clone()) {
            if previous != *expr {
                warn!("Cut {name}: {previous} -> {expr}");
            }
        }
    }
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;
    use prec_frame::{InMemorySource, StaticSelection};

    fn source() -> InMemorySource {
        let table = Table::new()
            .with_float("B_M", vec![5000.0, 5100.0, 5200.0, 5300.0])
            .and_then(|t| t.with_float("B_TRUEID", vec![521.0, 521.0, 511.0, 531.0]))
            .and_then(|t| t.with_float("L1_HASBREM", vec![0.0, 1.0, 1.0, 1.0]))
            .and_then(|t| t.with_float("L2_HASBREM", vec![0.0, 0.0, 1.0, 1.0]))
            .and_then(|t| t.with_float("mva_cmb", vec![0.1, 0.6, 0.7, 0.9]))
            .expect("table");
        InMemorySource::new().with("bu", "hlt", table)
    }

    fn selection() -> StaticSelection {
        StaticSelection::new(CutMap::from([
            ("bdt".to_string(), "mva_cmb > 0.5".to_string()),
            ("mass".to_string(), "B_M > 5250".to_string()),
        ]))
    }

    #[test]
    fn applies_selection_but_not_the_mass_cut() {
        let (source, selection) = (source(), selection());
        let loaded = SampleLoader::new(&source, &selection)
            .load("bu", "hlt", Regime::Jpsi, None, None)
            .expect("load");
        assert_eq!(loaded.table.n_rows(), 3);
        assert!(loaded.report.get("mass").is_none());
        assert_eq!(
            loaded.table.column_names().collect::<Vec<_>>(),
            vec!["B_M", "B_TRUEID", "proc"]
        );
        assert_eq!(loaded.table.text("proc").expect("proc")[0], "bu");
    }

    #[test]
    fn overrides_replace_named_cuts_and_brem_filters() {
        let (source, selection) = (source(), selection());
        let overrides = CutMap::from([("bdt".to_string(), "mva_cmb > 0.65".to_string())]);
        let loaded = SampleLoader::new(&source, &selection)
            .load("bu", "hlt", Regime::Jpsi, Some(&overrides), Some(BremCategory::TwoOrMore))
            .expect("load");
        let bdt = loaded.report.get("bdt").expect("bdt");
        assert_eq!(bdt.expr, "mva_cmb > 0.65");
        assert_eq!(bdt.passed, 2);
        assert_eq!(loaded.report.get("nbrem").expect("nbrem").passed, 2);
        assert_eq!(loaded.table.float("B_M").expect("mass"), &[5200.0, 5300.0]);
    }

    #[test]
    fn nbrem_values_above_two_are_invalid() {
        assert_eq!(BremCategory::try_from(1).expect("one"), BremCategory::One);
        assert_eq!(BremCategory::try_from(3).expect_err("three").code(), "invalid-nbrem");
    }

    #[test]
    fn failures_name_the_sample() {
        let source = source();
        let selection = StaticSelection::new(CutMap::from([(
            "pid".to_string(),
            "L1_PROBNN_E > 0.2".to_string(),
        )]));
        let err = SampleLoader::new(&source, &selection)
            .load("bu", "hlt", Regime::Jpsi, None, None)
            .expect_err("unknown column");
        assert_eq!(err.code(), "unknown-column");
        assert_eq!(err.info().context["sample"], "bu");
        assert_eq!(err.info().context["trigger"], "hlt");
    }
}
