mod common;

use std::fs;

use common::*;
use prec_pdf::{Bandwidth, Density, KdeOptions};
use prec_shape::{BoundsPolicy, Observable, PrecBuilder, PrecConfig, WeightConfig};

fn entry_bytes(dir: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .expect("cache dir")
        .map(|entry| entry.expect("entry").path())
        .map(|path| {
            let name = path.file_name().expect("name").to_string_lossy().into_owned();
            (name, fs::read(&path).expect("read"))
        })
        .collect();
    entries.sort();
    entries
}

#[test]
fn warm_cache_reproduces_cold_build_exactly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let build = || {
        PrecBuilder::new(SAMPLES, TRIGGER, "jpsi", WeightConfig::ALL)
            .config(config(dir.path()))
            .build(collaborators(partitioned_source()))
            .expect("prec")
    };

    let cold = build();
    let first = cold
        .get_sum("prec", MASS, &observable(), &KdeOptions::default())
        .expect("cold");
    assert!(first.report.cache.iter().all(|event| !event.hit));
    assert!(cold.is_materialized());
    let written = entry_bytes(dir.path());
    assert_eq!(written.len(), 3);
    assert!(written.iter().all(|(name, _)| name.starts_with("pdf_") && name.ends_with(".json")));

    let warm = build();
    let second = warm
        .get_sum("prec", MASS, &observable(), &KdeOptions::default())
        .expect("warm");
    assert!(second.report.all_cache_hits());
    assert!(!warm.is_materialized());
    assert_eq!(second.report.unmatched_rows, None);
    assert_eq!(first.report.cache_keys(), second.report.cache_keys());

    let (a, b) = (first.shape.expect("cold shape"), second.shape.expect("warm shape"));
    assert_eq!(
        serde_json::to_vec(a.mass()).expect("json"),
        serde_json::to_vec(b.mass()).expect("json")
    );
    assert_eq!(a.weights(), b.weights());
    assert_eq!(a.decay_weights(), b.decay_weights());
    assert_eq!(a.sample_weights(), b.sample_weights());
    assert_eq!(a, b);
    assert_eq!(entry_bytes(dir.path()), written);
}

#[test]
fn weight_config_changes_keys_and_densities() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = |weights: WeightConfig| {
        PrecBuilder::new(SAMPLES, TRIGGER, "jpsi", weights)
            .config(config(dir.path()))
            .build(collaborators(partitioned_source()))
            .expect("prec")
            .get_sum("prec", MASS, &observable(), &KdeOptions::default())
            .expect("get_sum")
    };
    let all = run(WeightConfig::ALL);
    let none = run(WeightConfig::NONE);
    for (a, b) in all.report.cache_keys().iter().zip(none.report.cache_keys()) {
        assert_ne!(*a, b);
    }
    assert!(none.report.cache.iter().all(|event| !event.hit));

    let (all, none) = (all.shape.expect("all"), none.shape.expect("none"));
    assert!(none.weights().iter().all(|w| *w == 1.0));
    assert_ne!(all.weights(), none.weights());
    assert_ne!(all.pdf(5300.0), none.pdf(5300.0));
}

#[test]
fn shape_keywords_enter_the_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let prec = PrecBuilder::new(SAMPLES, TRIGGER, "jpsi", WeightConfig::NONE)
        .config(config(dir.path()))
        .build(collaborators(partitioned_source()))
        .expect("prec");
    let silverman = prec
        .get_sum("prec", MASS, &observable(), &KdeOptions::default())
        .expect("silverman");
    let fixed = KdeOptions {
        bandwidth: Bandwidth::Fixed(20.0),
        padding: 0.0,
    };
    let fixed = prec.get_sum("prec", MASS, &observable(), &fixed).expect("fixed");
    assert_ne!(silverman.report.cache_keys(), fixed.report.cache_keys());
}

#[test]
fn bounds_stay_out_of_the_key_by_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let prec = PrecBuilder::new(SAMPLES, TRIGGER, "jpsi", WeightConfig::NONE)
        .config(PrecConfig {
            min_entries: 5,
            ..config(dir.path())
        })
        .build(collaborators(partitioned_source()))
        .expect("prec");
    let wide = prec
        .get_sum("prec", MASS, &observable(), &KdeOptions::default())
        .expect("wide");
    let narrow_obs = Observable::new("mass", 5000.0, 5300.0).expect("narrow");
    let narrow = prec
        .get_sum("prec", MASS, &narrow_obs, &KdeOptions::default())
        .expect("narrow");

    assert_eq!(wide.report.cache_keys(), narrow.report.cache_keys());
    assert!(narrow.report.all_cache_hits());
    let shape = narrow.shape.expect("shape");
    assert!(shape.mass().iter().all(|m| *m > 5000.0 && *m < 5300.0));
    assert!(shape.mass().len() < wide.shape.expect("wide shape").mass().len());
}

#[test]
fn in_key_bounds_get_their_own_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let prec = PrecBuilder::new(SAMPLES, TRIGGER, "jpsi", WeightConfig::NONE)
        .config(PrecConfig {
            bounds_policy: BoundsPolicy::InKey,
            min_entries: 5,
            ..config(dir.path())
        })
        .build(collaborators(partitioned_source()))
        .expect("prec");
    let wide = prec
        .get_sum("prec", MASS, &observable(), &KdeOptions::default())
        .expect("wide");
    let narrow_obs = Observable::new("mass", 5000.0, 5300.0).expect("narrow");
    let narrow = prec
        .get_sum("prec", MASS, &narrow_obs, &KdeOptions::default())
        .expect("narrow");
    for (a, b) in wide.report.cache_keys().iter().zip(narrow.report.cache_keys()) {
        assert_ne!(*a, b);
    }
    assert!(narrow.report.cache.iter().all(|event| !event.hit));
    let shape = narrow.shape.expect("shape");
    assert!(shape.mass().iter().all(|m| *m > 5000.0 && *m < 5300.0));
}

#[test]
fn disabled_cache_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_dir = dir.path().join("cache");
    let prec = PrecBuilder::new(SAMPLES, TRIGGER, "jpsi", WeightConfig::NONE)
        .config(PrecConfig {
            use_cache: false,
            ..config(&cache_dir)
        })
        .build(collaborators(partitioned_source()))
        .expect("prec");
    let outcome = prec
        .get_sum("prec", MASS, &observable(), &KdeOptions::default())
        .expect("get_sum");
    assert!(outcome.report.cache.is_empty());
    assert!(!cache_dir.exists());
}
