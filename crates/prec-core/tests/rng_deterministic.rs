use prec_core::rng::{derive_label_seed, derive_substream_seed, RngHandle};
use rand::{Rng, RngCore};

fn draws(rng: &mut RngHandle, n: usize) -> Vec<u64> {
    (0..n).map(|_| rng.next_u64()).collect()
}

#[test]
fn equal_seeds_give_equal_streams() {
    let mut a = RngHandle::from_seed(1234);
    let mut b = RngHandle::from_seed(1234);
    assert_eq!(draws(&mut a, 64), draws(&mut b, 64));
    assert_eq!(a.seed(), 1234);
}

#[test]
fn indexed_substreams_match_their_derived_seed() {
    assert_ne!(derive_substream_seed(7, 0), derive_substream_seed(7, 1));
    let mut child = RngHandle::substream(7, 3);
    let mut manual = RngHandle::from_seed(derive_substream_seed(7, 3));
    assert_eq!(child.next_u64(), manual.next_u64());
}

#[test]
fn labels_select_independent_streams() {
    assert_eq!(derive_label_seed(5, "Bu_JpsiX"), derive_label_seed(5, "Bu_JpsiX"));
    assert_ne!(derive_label_seed(5, "Bu_JpsiX"), derive_label_seed(5, "Bd_JpsiX"));
    assert_ne!(derive_label_seed(5, "Bu_JpsiX"), derive_label_seed(6, "Bu_JpsiX"));

    let mut bu = RngHandle::labelled(5, "Bu_JpsiX");
    let mut bd = RngHandle::labelled(5, "Bd_JpsiX");
    assert_ne!(draws(&mut bu, 8), draws(&mut bd, 8));
}

#[test]
fn forks_ignore_the_parent_position() {
    let mut parent = RngHandle::from_seed(42);
    let early = parent.fork("bdt");
    let _: f64 = parent.gen_range(0.0..1.0);
    let late = parent.fork("bdt");
    assert_eq!(early.seed(), late.seed());
    assert_eq!(early.seed(), derive_label_seed(42, "bdt"));
}
