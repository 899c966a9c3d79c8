#![allow(dead_code)]

use prec_core::RngHandle;
use prec_frame::{InMemorySource, StaticSelection, Table};
use prec_shape::{Collaborators, MotherIdDecayWeights, Observable, PrecConfig, ProcessShareWeights};
use rand::Rng;

pub const TRIGGER: &str = "Hlt2RD_BuToKpEE_MVA";
pub const SAMPLES: [&str; 3] = ["Bu_JpsiX", "Bd_JpsiX", "Bs_JpsiX"];
pub const MASS: &str = "B_const_mass_M";
const SEED: u64 = 20_240_611;

/// One row per parent id, masses uniform in [5000, 5600).
pub fn sample_table(label: &str, parents: &[f64]) -> Table {
    let mut rng = RngHandle::labelled(SEED, label);
    let n = parents.len();
    let mass: Vec<f64> = (0..n).map(|_| rng.gen_range(5000.0..5600.0)).collect();
    let l1: Vec<f64> = (0..n).map(|i| if i % 3 == 0 { 100443.0 } else { 443.0 }).collect();
    Table::new()
        .with_float(MASS, mass)
        .and_then(|t| t.with_float("B_TRUEID", parents.to_vec()))
        .and_then(|t| t.with_float("L1_MC_MOTHER_ID", l1))
        .and_then(|t| t.with_float("L2_MC_MOTHER_ID", vec![443.0; n]))
        .and_then(|t| t.with_float("H_MC_MOTHER_ID", parents.to_vec()))
        .and_then(|t| t.with_float("mva_cmb", vec![0.9; n]))
        .expect("sample table")
}

/// Three samples partitioning 150 rows as 80 B0, 70 B+ and no Bs.
pub fn partitioned_source() -> InMemorySource {
    let a = vec![-511.0; 50];
    let mut b = vec![511.0; 30];
    b.extend(vec![521.0; 20]);
    let c = vec![-521.0; 50];
    InMemorySource::new()
        .with(SAMPLES[0], TRIGGER, sample_table(SAMPLES[0], &a))
        .with(SAMPLES[1], TRIGGER, sample_table(SAMPLES[1], &b))
        .with(SAMPLES[2], TRIGGER, sample_table(SAMPLES[2], &c))
}

pub fn collaborators(source: InMemorySource) -> Collaborators {
    Collaborators::new(source, StaticSelection::default())
        .with_decay_weights(MotherIdDecayWeights::new(1.0).with_factor(100443, 2.5))
        .with_sample_weights(
            ProcessShareWeights::new()
                .with_share(SAMPLES[0], 0.5)
                .with_share(SAMPLES[1], 0.3)
                .with_share(SAMPLES[2], 0.2),
        )
}

pub fn observable() -> Observable {
    Observable::new("mass", 4500.0, 6000.0).expect("observable")
}

pub fn config(dir: &std::path::Path) -> PrecConfig {
    PrecConfig::with_cache_dir(dir)
}
