//! Per-category kernel densities.

use log::{debug, info, warn};
use prec_core::{PrecError, RngHandle};
use prec_frame::{CutRecord, Table};
use prec_pdf::{Density, KdeOptions, KdePdf, Parameter};

use crate::assembler::{WGT_BR, WGT_DEC, WGT_SAM};
use crate::config::Observable;
use crate::report::{BuildReport, SkippedCategory};

/// Kernel density of one category plus the arrays it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDensity {
    pdf: KdePdf,
    mass: Vec<f64>,
    wgt_br: Vec<f64>,
    wgt_dec: Vec<f64>,
    wgt_sam: Vec<f64>,
}

impl CategoryDensity {
    /// Fits a KDE of `mass` weighted by `wgt_br` over the rows of `table`.
    pub fn fit(
        label: &str,
        table: &Table,
        mass: &str,
        observable: &Observable,
        options: &KdeOptions,
    ) -> Result<Self, PrecError> {
        let values = table.float(mass)?.to_vec();
        let wgt_br = table.float(WGT_BR)?.to_vec();
        let pdf = KdePdf::fit(label, observable.bounds(), &values, &wgt_br, options)?;
        Ok(Self {
            pdf,
            mass: values,
            wgt_br,
            wgt_dec: table.float(WGT_DEC)?.to_vec(),
            wgt_sam: table.float(WGT_SAM)?.to_vec(),
        })
    }

    /// Underlying estimate.
    pub fn kde(&self) -> &KdePdf {
        &self.pdf
    }

    /// Mass values the estimate was built from.
    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    /// Combined weights.
    pub fn weights(&self) -> &[f64] {
        &self.wgt_br
    }

    /// Decay weights.
    pub fn decay_weights(&self) -> &[f64] {
        &self.wgt_dec
    }

    /// Sample weights.
    pub fn sample_weights(&self) -> &[f64] {
        &self.wgt_sam
    }

    /// Sum of the combined weights.
    pub fn weighted_yield(&self) -> f64 {
        self.wgt_br.iter().sum()
    }
}

impl Density for CategoryDensity {
    fn name(&self) -> &str {
        self.pdf.name()
    }

    fn support(&self) -> (f64, f64) {
        self.pdf.support()
    }

    fn log_pdf(&self, x: f64) -> f64 {
        self.pdf.log_pdf(x)
    }

    fn pdf(&self, x: f64) -> f64 {
        self.pdf.pdf(x)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.pdf.parameters()
    }

    fn sample(&self, n: usize, rng: &mut RngHandle) -> Result<Vec<f64>, PrecError> {
        self.pdf.sample(n, rng)
    }
}

/// Applies the observable window and the entries threshold, then fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityBuilder {
    min_entries: usize,
}

impl Default for DensityBuilder {
    fn default() -> Self {
        Self { min_entries: 30 }
    }
}

impl DensityBuilder {
    /// Builder dropping categories with fewer than `min_entries` rows.
    pub fn new(min_entries: usize) -> Self {
        Self { min_entries }
    }

    /// Threshold in force.
    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    /// Builds the density of `label` from its category table.
    ///
    /// Rows outside the open observable interval are removed first. Returns
    /// `None` when fewer than `min_entries` rows remain (never fewer than one).
    pub fn build(
        &self,
        label: &str,
        table: &Table,
        mass: &str,
        observable: &Observable,
        options: &KdeOptions,
        report: &mut BuildReport,
    ) -> Result<Option<CategoryDensity>, PrecError> {
        let window = observable.window_expr(mass);
        debug!("Applying: {window}");
        let inside = table.query(&window)?;
        report.cut_flow.push(CutRecord {
            name: format!("{label} / mass"),
            expr: window,
            total: table.n_rows(),
            passed: inside.n_rows(),
        });

        let entries = inside.n_rows();
        if entries < self.min_entries.max(1) {
            warn!(
                "Skipping category {label}: {entries} entries below threshold {}",
                self.min_entries
            );
            report.skipped.push(SkippedCategory {
                label: label.to_string(),
                entries,
                min_entries: self.min_entries,
            });
            return Ok(None);
        }

        info!("Using mass: {mass} for component {label}");
        CategoryDensity::fit(label, &inside, mass, observable, options).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Table {
        let mass: Vec<f64> = (0..n).map(|i| 4990.0 + 20.0 * i as f64).collect();
        Table::new()
            .with_float("B_M", mass)
            .and_then(|t| t.with_float(WGT_BR, vec![1.0; n]))
            .and_then(|t| t.with_float(WGT_DEC, vec![1.0; n]))
            .and_then(|t| t.with_float(WGT_SAM, vec![1.0; n]))
            .expect("table")
    }

    #[test]
    fn bounds_are_an_open_interval() {
        let obs = Observable::new("m", 5010.0, 5050.0).expect("obs");
        let mut report = BuildReport::default();
        let density = DensityBuilder::new(1)
            .build("c", &table(5), "B_M", &obs, &KdeOptions::fixed(10.0), &mut report)
            .expect("build")
            .expect("density");
        assert_eq!(density.mass(), &[5030.0]);
        let record = &report.cut_flow.records()[0];
        assert_eq!((record.total, record.passed), (5, 1));
    }

    #[test]
    fn below_threshold_is_skipped_not_failed() {
        let obs = Observable::new("m", 4900.0, 6000.0).expect("obs");
        let mut report = BuildReport::default();
        let out = DensityBuilder::default()
            .build("few", &table(10), "B_M", &obs, &KdeOptions::default(), &mut report)
            .expect("build");
        assert!(out.is_none());
        assert_eq!(
            report.skipped,
            vec![SkippedCategory {
                label: "few".into(),
                entries: 10,
                min_entries: 30
            }]
        );
    }
}
