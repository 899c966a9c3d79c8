//! Column-addable, filterable row source with a per-cut report.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::expr::CompiledExpr;
use crate::table::{Column, Table};
use prec_core::PrecError;

/// Outcome of a single named cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutRecord {
    /// Name under which the cut was applied.
    pub name: String,
    /// Expression text of the cut.
    pub expr: String,
    /// Rows entering the cut.
    pub total: usize,
    /// Rows passing the cut.
    pub passed: usize,
}

impl CutRecord {
    /// Fraction of rows passing the cut; zero when no rows entered.
    pub fn efficiency(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

/// Ordered cut flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CutReport {
    records: Vec<CutRecord>,
}

impl CutReport {
    /// Appends a record.
    pub fn push(&mut self, record: CutRecord) {
        self.records.push(record);
    }

    /// Appends all records of `other`.
    pub fn extend(&mut self, other: &CutReport) {
        self.records.extend(other.records.iter().cloned());
    }

    /// Records in application order.
    pub fn records(&self) -> &[CutRecord] {
        &self.records
    }

    /// Returns the first record with the given name.
    pub fn get(&self, name: &str) -> Option<&CutRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// Writes the cut flow as a table at debug level.
    pub fn log(&self, title: &str) {
        debug!("{}", "-".repeat(60));
        debug!("{title}");
        debug!("{:<30}{:>15}{:>15}", "Cut", "Total", "Passed");
        debug!("{}", "-".repeat(60));
        for record in &self.records {
            debug!("{:<30}{:>15}{:>15}", record.name, record.total, record.passed);
        }
        debug!("{}", "-".repeat(60));
    }
}

/// Rows of one `(sample, trigger)` pair, transformed by derived columns and filters.
///
/// Operations consume and return the frame so that calls chain the way a
/// dataframe pipeline reads.
#[derive(Debug, Clone)]
pub struct Frame {
    table: Table,
    report: CutReport,
}

impl Frame {
    /// Wraps a table.
    pub fn new(table: Table) -> Self {
        Self {
            table,
            report: CutReport::default(),
        }
    }

    /// Adds a numeric column computed from `expr`.
    pub fn define(mut self, name: &str, expr: &str) -> Result<Self, PrecError> {
        let compiled = CompiledExpr::compile(expr)?;
        let values = self.table.eval(&compiled)?;
        self.table.insert(name, Column::Float(values))?;
        Ok(self)
    }

    /// Keeps the rows for which `expr` holds, recording the cut as `name`.
    pub fn filter(mut self, expr: &str, name: &str) -> Result<Self, PrecError> {
        let compiled = CompiledExpr::compile(expr)?;
        let mask = self.table.mask(&compiled)?;
        let total = self.table.n_rows();
        self.table = self.table.filter(&mask)?;
        self.report.push(CutRecord {
            name: name.to_string(),
            expr: expr.to_string(),
            total,
            passed: self.table.n_rows(),
        });
        Ok(self)
    }

    /// Column names currently available.
    pub fn column_names(&self) -> Vec<String> {
        self.table.column_names().map(str::to_string).collect()
    }

    /// Returns true when `name` is available.
    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }

    /// Rows currently passing all filters.
    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }

    /// Cut flow accumulated so far.
    pub fn report(&self) -> &CutReport {
        &self.report
    }

    /// Materializes the named columns into a table.
    pub fn materialize<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table, PrecError> {
        self.table.select(columns)
    }

    /// Splits the frame into its rows and cut flow.
    pub fn into_parts(self) -> (Table, CutReport) {
        (self.table, self.report)
    }
}
