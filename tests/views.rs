// tests/views.rs

mod common;

use common::{assert_all_close, ctx, tagged, unit, MockSim};
use simarray::{ArrayError, CmpOp, IndexSpec, NumericContainer, SimArray, SliceRange};

fn ramp(n: usize) -> SimArray<f64> {
    SimArray::from_vec((0..n).map(|i| i as f64).collect())
}

//===================================================================
// -------------------------- Native views --------------------------
//===================================================================

#[test]
fn reshape_and_transpose_alias_the_buffer() {
    let a = SimArray::new((0..6).map(|i| i as f64).collect(), vec![2, 3]).unwrap();
    let mut t = a.transpose();
    assert_eq!(t.shape(), &[3, 2]);
    assert!(t.is_view());
    assert!(t.shares_storage_with(&a));

    t.set(&[2, 1], 50.0).unwrap();
    assert_eq!(a.get(&[1, 2]).unwrap(), 50.0);

    let flat = a.flatten_view().unwrap();
    assert_eq!(flat.get(&[5]).unwrap(), 50.0);
    assert!(matches!(t.flatten_view(), Err(ArrayError::NotContiguous)));
}

#[test]
fn strided_slices_write_through() {
    let a = ramp(10);
    let mut s = a.slice(&[SliceRange::new(1, 10, 3)]).unwrap();
    assert_eq!(s.to_vec(), vec![1.0, 4.0, 7.0]);
    s.fill(-1.0);
    assert_eq!(a.get(&[4]).unwrap(), -1.0);
    assert_eq!(a.get(&[5]).unwrap(), 5.0);
    assert_eq!(s.ancestor().shape(), &[10]);
}

#[test]
fn views_share_units_with_their_base() {
    let a = tagged(&[1.0, 2.0, 3.0], "kpc");
    let v = a.row(1).unwrap();
    assert_eq!(v.units(), unit("kpc"));

    v.set_units("Mpc").unwrap();
    assert_eq!(a.units(), unit("Mpc"));
}

#[test]
fn copies_are_independent() {
    let a = tagged(&[1.0, 2.0], "kpc");
    let mut c = a.copy();
    c.set(&[0], 9.0).unwrap();
    assert_eq!(a.get(&[0]).unwrap(), 1.0);
    assert_eq!(c.units(), unit("kpc"));
    assert!(!c.is_view());
}

//===================================================================
// -------------------------- Indexed views -------------------------
//===================================================================

#[test]
fn indexed_view_writes_reach_the_base() {
    let base = ramp(6);
    let mut v = base.index(IndexSpec::range(2, 5)).unwrap();
    assert_eq!(v.len(), 3);
    assert_eq!(v.get(&[0]).unwrap(), 2.0);

    v.set(&[1], 30.0).unwrap();
    assert_eq!(base.get(&[3]).unwrap(), 30.0);
    assert!(matches!(v.get(&[3]), Err(ArrayError::IndexOutOfBounds { .. })));
}

#[test]
fn reindexing_chains_collapse_onto_the_base() {
    let base = ramp(10);
    let evens = base.index(IndexSpec::stepped(0, 10, 2)).unwrap();
    let picked = evens.index(IndexSpec::positions(vec![1, 3])).unwrap();
    assert_eq!(picked.index_spec(), &IndexSpec::positions(vec![2, 6]));

    let mut picked = picked;
    picked.set(&[1], -6.0).unwrap();
    assert_eq!(base.get(&[6]).unwrap(), -6.0);
    assert_eq!(evens.get(&[3]).unwrap(), -6.0);
}

#[test]
fn range_of_range_stays_a_range() {
    let base = ramp(10);
    let odds = base.index(IndexSpec::stepped(1, 10, 2)).unwrap();
    let sub = odds.index(IndexSpec::stepped(1, 5, 2)).unwrap();
    assert!(matches!(sub.index_spec(), IndexSpec::Range(_)));
    assert_all_close(&sub.realize().to_vec(), &[3.0, 7.0]);
}

#[test]
fn out_of_range_index_specs_are_rejected() {
    let base = ramp(4);
    assert!(base.index(IndexSpec::positions(vec![0, 4])).is_err());
    assert!(base.index(IndexSpec::range(0, 5)).is_err());
    assert!(SimArray::scalar(1.0).index(IndexSpec::range(0, 1)).is_err());
}

#[test]
fn indexed_views_select_whole_rows() {
    let base = SimArray::new((0..6).map(|i| i as f64).collect(), vec![3, 2]).unwrap();
    let v = base.index(IndexSpec::positions(vec![2, 0])).unwrap();
    assert_eq!(v.shape(), vec![2, 2]);
    assert_eq!(v.get(&[0, 1]).unwrap(), 5.0);
    assert_eq!(v.realize().to_vec(), vec![4.0, 5.0, 0.0, 1.0]);
}

#[test]
fn masks_select_matching_rows() {
    let base = ramp(6);
    let mask = base.compare_scalar(3.0, CmpOp::Ge);
    assert_eq!(mask.count(), 3);

    let mut v = base.mask(&mask).unwrap();
    v.assign_all(&SimArray::scalar(0.0)).unwrap();
    assert_eq!(base.to_vec(), vec![0.0, 1.0, 2.0, 0.0, 0.0, 0.0]);
}

#[test]
fn assignment_converts_into_the_base_units() {
    let mut base = tagged(&[0.0, 0.0, 0.0], "kpc");
    base.assign(&IndexSpec::positions(vec![0, 2]), &tagged(&[1.0], "Mpc"))
        .unwrap();
    assert_all_close(&base.to_vec(), &[1000.0, 0.0, 1000.0]);

    let plain = SimArray::from_vec(vec![5.0]);
    base.assign(&IndexSpec::range(1, 2), &plain).unwrap();
    assert_all_close(&base.to_vec(), &[1000.0, 5.0, 1000.0]);
}

#[test]
fn views_delegate_units_to_the_base() {
    let sim = MockSim::new(1.0);
    let base = tagged(&[1.0, 2.0, 3.0], "Mpc").with_context(ctx(&sim));
    let mut v = base.index(IndexSpec::range(0, 2)).unwrap();

    assert_eq!(v.units(), unit("Mpc"));
    assert!(v.context().is_some());

    let in_kpc = v.in_units("kpc").unwrap();
    assert_all_close(&in_kpc.to_vec(), &[1000.0, 2000.0]);
    assert_eq!(base.units(), unit("Mpc"));

    // In-place conversion acts on the whole base.
    v.convert_units("kpc").unwrap();
    assert_eq!(base.units(), unit("kpc"));
    assert_all_close(&base.to_vec(), &[1000.0, 2000.0, 3000.0]);
}

#[test]
fn realize_copies_without_the_name() {
    let sim = MockSim::new(1.0);
    let base = tagged(&[1.0, 2.0], "kpc").with_context(ctx(&sim)).with_name("pos");
    let v = base.index(IndexSpec::range(0, 1)).unwrap();
    let r = v.realize();
    assert_eq!(v.name().as_deref(), Some("pos"));
    assert!(r.name().is_none());
    assert!(r.context().is_some());
    assert!(!r.shares_storage_with(&base));
}

#[test]
fn modify_writes_back_once() {
    let sim = MockSim::new(1.0);
    let base = ramp(4).with_context(ctx(&sim)).with_name("mass");
    let mut v = base.index(IndexSpec::range(1, 3)).unwrap();
    v.modify(|c| {
        c.mul_assign_scalar(10.0);
        Ok(())
    })
    .unwrap();
    assert_eq!(base.to_vec(), vec![0.0, 10.0, 20.0, 3.0]);
    assert_eq!(sim.dirty_log(), vec!["mass".to_string()]);
}

#[test]
fn indexed_views_are_numeric_containers() {
    let base = tagged(&[1.0, 2.0, 3.0, 4.0], "kpc");
    let v = base.index(IndexSpec::range(2, 4)).unwrap();
    let other = tagged(&[1.0, 1.0], "kpc");

    let s = other.checked_add(&v).unwrap();
    assert_all_close(&s.to_vec(), &[4.0, 5.0]);

    let total = NumericContainer::sum(&v, None).unwrap();
    assert_all_close(&total.to_vec(), &[7.0]);
    assert_eq!(total.units(), unit("kpc"));
    assert_eq!(v.to_string(), "SimArray([3, 4], 'kpc')");
}

#[test]
fn ancestor_of_a_view_is_the_base() {
    let base = ramp(3);
    let v = base.index(IndexSpec::range(0, 2)).unwrap();
    let root = v.ancestor();
    assert!(root.shares_storage_with(&base));
    assert_eq!(root.shape(), base.shape());
}
