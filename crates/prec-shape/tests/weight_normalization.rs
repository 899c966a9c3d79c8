use prec_shape::{normalize, WeightConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalized_weights_have_unit_mean(weights in proptest::collection::vec(1e-3f64..1e3, 1..500)) {
        let out = normalize(&weights).expect("normalize");
        prop_assert_eq!(out.len(), weights.len());
        let mean = out.iter().sum::<f64>() / out.len() as f64;
        prop_assert!((mean - 1.0).abs() < 1e-9);
        for (w, n) in weights.iter().zip(&out) {
            prop_assert!((n / w - out[0] / weights[0]).abs() < 1e-9 * (out[0] / weights[0]));
        }
    }

    #[test]
    fn normalization_is_idempotent(weights in proptest::collection::vec(0.0f64..10.0, 1..100)) {
        prop_assume!(weights.iter().sum::<f64>() > 0.0);
        let once = normalize(&weights).expect("once");
        let twice = normalize(&once).expect("twice");
        for (a, b) in once.iter().zip(&twice) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }
}

#[test]
fn weight_config_serializes_as_flags() {
    let json = serde_json::to_string(&WeightConfig::new(true, false)).expect("json");
    assert_eq!(json, r#"{"dec":1,"sam":0}"#);
}
