use prec_frame::{CompiledExpr, Table};
use proptest::prelude::*;

proptest! {
    #[test]
    fn query_matches_manual_filter(values in proptest::collection::vec(-1000.0f64..1000.0, 0..200), cut in -1000.0f64..1000.0) {
        let table = Table::new().with_float("x", values.clone()).expect("table");
        let expr = format!("x > {cut:?}");
        let filtered = table.query(&expr).expect("query");
        let expected: Vec<f64> = values.iter().copied().filter(|v| *v > cut).collect();
        prop_assert_eq!(filtered.float("x").expect("x"), expected.as_slice());
    }

    #[test]
    fn complement_partitions_rows(ids in proptest::collection::vec(prop::sample::select(vec![511.0, -511.0, 521.0, -521.0, 531.0]), 1..100)) {
        let table = Table::new().with_float("B_TRUEID", ids).expect("table");
        let chain = "(abs(B_TRUEID) == 521)";
        let complement = "(abs(B_TRUEID) != 521)";
        let a = table.query(chain).expect("chain").n_rows();
        let b = table.query(complement).expect("complement").n_rows();
        prop_assert_eq!(a + b, table.n_rows());
    }
}

#[test]
fn constant_expressions_broadcast() {
    let table = Table::new().with_float("x", vec![1.0, 2.0]).expect("table");
    let compiled = CompiledExpr::compile("1 > 0").expect("compile");
    assert_eq!(table.mask(&compiled).expect("mask"), vec![true, true]);
}
