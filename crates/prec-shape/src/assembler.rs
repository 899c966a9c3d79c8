//! Concatenation of per-sample tables and the three weight columns.

use log::{info, warn};
use prec_core::PrecError;
use prec_frame::Table;

use crate::readers::{DecayWeightReader, SampleWeightReader, LEGS};
use crate::weights::{log_frequencies, normalize, WeightConfig};

/// Normalized decay weight column.
pub const WGT_DEC: &str = "wgt_dec";
/// Normalized sample weight column.
pub const WGT_SAM: &str = "wgt_sam";
/// Normalized product of the decay and sample weights.
pub const WGT_BR: &str = "wgt_br";

/// Builds the combined, weighted table from per-sample tables.
pub struct TableAssembler<'a> {
    weights: WeightConfig,
    decay: &'a dyn DecayWeightReader,
    sample: &'a dyn SampleWeightReader,
}

impl<'a> TableAssembler<'a> {
    /// Assembler for `weights` using the given readers.
    pub fn new(
        weights: WeightConfig,
        decay: &'a dyn DecayWeightReader,
        sample: &'a dyn SampleWeightReader,
    ) -> Self {
        Self {
            weights,
            decay,
            sample,
        }
    }

    /// Concatenates `tables` and attaches `wgt_dec`, `wgt_sam` and `wgt_br`.
    ///
    /// Decay weights are normalized per sample, sample weights over the whole
    /// mix. Columns missing from any input are dropped; rows never are.
    pub fn assemble(&self, tables: Vec<Table>) -> Result<Table, PrecError> {
        if !self.weights.dec() {
            warn!("Not using decay weights");
        }
        if !self.weights.sam() {
            warn!("Not using sample weights");
        }

        let common = common_columns(&tables);
        let mut parts = Vec::with_capacity(tables.len());
        for table in &tables {
            let mut part = table.select(&common)?;
            let wgt_dec = self.decay_weights(&part)?;
            part.insert_float(WGT_DEC, wgt_dec)?;
            parts.push(part);
        }
        let mut combined = Table::concat(&parts)?;

        let wgt_sam = if self.weights.sam() {
            normalize(&self.sample.weights(&combined)?)?
        } else {
            vec![1.0; combined.n_rows()]
        };
        let product: Vec<f64> = combined
            .float(WGT_DEC)?
            .iter()
            .zip(&wgt_sam)
            .map(|(d, s)| d * s)
            .collect();
        let wgt_br = normalize(&product)?;
        log_frequencies("wgt_br", &wgt_br);

        combined.insert_float(WGT_SAM, wgt_sam)?;
        combined.insert_float(WGT_BR, wgt_br)?;
        info!("Combined table: {} rows from {} samples", combined.n_rows(), tables.len());
        Ok(combined)
    }

    fn decay_weights(&self, table: &Table) -> Result<Vec<f64>, PrecError> {
        if !self.weights.dec() {
            return Ok(vec![1.0; table.n_rows()]);
        }
        let raw = (0..table.n_rows())
            .map(|index| self.decay.read_weight(&table.row(index), &LEGS))
            .collect::<Result<Vec<_>, _>>()?;
        log_frequencies("wgt_dec", &raw);
        normalize(&raw)
    }
}

fn common_columns(tables: &[Table]) -> Vec<String> {
    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };
    first
        .column_names()
        .filter(|name| rest.iter().all(|table| table.has_column(name)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::{MotherIdDecayWeights, ProcessShareWeights, PROC_COLUMN};

    fn sample(name: &str, ids: Vec<f64>) -> Table {
        let n = ids.len();
        Table::new()
            .with_float("B_M", (0..n).map(|i| 5000.0 + i as f64).collect())
            .and_then(|t| t.with_float("L1_MC_MOTHER_ID", ids.clone()))
            .and_then(|t| t.with_float("L2_MC_MOTHER_ID", ids.clone()))
            .and_then(|t| t.with_float("H_MC_MOTHER_ID", ids))
            .and_then(|t| t.with_text(PROC_COLUMN, vec![name.to_string(); n]))
            .expect("table")
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn every_weight_stream_has_unit_mean() {
        let decay = MotherIdDecayWeights::new(1.0).with_factor(443, 1.5);
        let shares = ProcessShareWeights::new().with_share("a", 0.7).with_share("b", 0.3);
        let tables = vec![
            sample("a", vec![443.0, 521.0, 443.0]),
            sample("b", vec![511.0, 443.0, 511.0, 511.0, 521.0]),
        ];
        let combined = TableAssembler::new(WeightConfig::ALL, &decay, &shares)
            .assemble(tables)
            .expect("assemble");
        assert_eq!(combined.n_rows(), 8);
        for column in [WGT_DEC, WGT_SAM, WGT_BR] {
            let values = combined.float(column).expect("weights");
            assert!((mean(values) - 1.0).abs() < 1e-12, "{column}");
        }
        let dec = combined.float(WGT_DEC).expect("dec");
        assert!((mean(&dec[..3]) - 1.0).abs() < 1e-12);
        assert!((mean(&dec[3..]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disabled_streams_are_constant_one() {
        let decay = MotherIdDecayWeights::new(3.0);
        let shares = ProcessShareWeights::new();
        let combined = TableAssembler::new(WeightConfig::NONE, &decay, &shares)
            .assemble(vec![sample("a", vec![443.0; 4])])
            .expect("assemble");
        for column in [WGT_DEC, WGT_SAM, WGT_BR] {
            assert!(combined.float(column).expect("w").iter().all(|w| *w == 1.0));
        }
    }

    #[test]
    fn columns_missing_from_one_sample_are_dropped() {
        let a = sample("a", vec![443.0]).with_float("B_const_mass_M", vec![5279.0]).expect("a");
        let b = sample("b", vec![443.0]);
        let decay = MotherIdDecayWeights::default();
        let shares = ProcessShareWeights::uniform();
        let combined = TableAssembler::new(WeightConfig::NONE, &decay, &shares)
            .assemble(vec![a, b])
            .expect("assemble");
        assert!(!combined.has_column("B_const_mass_M"));
        assert_eq!(combined.n_rows(), 2);
    }
}
