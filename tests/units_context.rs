// tests/units_context.rs

mod common;

use common::{assert_all_close, ctx, tagged, unit, FamilySim, MockSim};
use simarray::{ArrayError, CmpOp, ConversionContext, Family, SimArray, SimContext, UnitsError};
use std::rc::Rc;

//===================================================================
// --------------------------- Conversion ---------------------------
//===================================================================

#[test]
fn in_units_uses_the_context_scale_factor() {
    let sim = MockSim::new(0.5);
    let pos = tagged(&[1.0, 2.0], "kpc a").with_context(ctx(&sim));
    let physical = pos.in_units("kpc").unwrap();
    assert_all_close(&physical.to_vec(), &[0.5, 1.0]);
    assert_eq!(physical.units(), unit("kpc"));
    assert_eq!(pos.units(), unit("kpc a"));
}

#[test]
fn per_call_overrides_win_over_the_context() {
    let sim = MockSim::new(0.5);
    let pos = tagged(&[1.0, 2.0], "kpc a").with_context(ctx(&sim));
    let mut overrides = ConversionContext::new();
    overrides.insert("a".into(), 0.1);
    let early = pos.in_units_with("kpc", &overrides).unwrap();
    assert_all_close(&early.to_vec(), &[0.1, 0.2]);
}

#[test]
fn contextual_conversion_without_a_context_fails() {
    let pos = tagged(&[1.0], "kpc a");
    let err = pos.in_units("kpc").unwrap_err();
    assert!(matches!(err, ArrayError::Units(UnitsError::Incompatible { .. })));
}

#[test]
fn untagged_arrays_cannot_be_converted() {
    let mut a = SimArray::from_vec(vec![1.0]);
    assert!(matches!(a.in_units("kpc"), Err(ArrayError::UnitsUnknown)));
    assert!(matches!(a.convert_units("kpc"), Err(ArrayError::UnitsUnknown)));
}

#[test]
fn convert_units_rewrites_values_and_tag() {
    let mut a = tagged(&[1.0, 2.5], "Mpc");
    a.convert_units("kpc").unwrap();
    assert_all_close(&a.to_vec(), &[1000.0, 2500.0]);
    assert_eq!(a.units(), unit("kpc"));
}

#[test]
fn integer_conversion_truncates() {
    let a = SimArray::from_vec(vec![1500i64, 2999])
        .with_units("m")
        .unwrap();
    assert_eq!(a.in_units("km").unwrap().to_vec(), vec![1, 2]);
}

#[test]
fn unparsable_units_are_rejected() {
    let a = SimArray::from_vec(vec![1.0]);
    assert!(matches!(
        a.set_units("furlong"),
        Err(ArrayError::Units(UnitsError::UnknownSymbol(_)))
    ));
    assert!(!a.has_units());
}

//===================================================================
// ------------------------- Context helpers ------------------------
//===================================================================

#[test]
fn set_units_like_asks_the_context() {
    let sim = MockSim::new(1.0);
    let rho = SimArray::from_vec(vec![1.0]).with_context(ctx(&sim));
    rho.set_units_like("kg m^-3").unwrap();
    assert_eq!(rho.units(), unit("Msol kpc^-3"));

    let orphan = SimArray::from_vec(vec![1.0]);
    assert!(matches!(orphan.set_units_like("kg"), Err(ArrayError::NoContext)));
}

#[test]
fn default_units_come_from_the_name() {
    let sim = MockSim::new(1.0);
    let pos = SimArray::from_vec(vec![1.0]).with_context(ctx(&sim)).with_name("pos");
    pos.set_default_units(false).unwrap();
    assert_eq!(pos.units(), unit("kpc a"));

    let odd = tagged(&[1.0], "km").with_context(ctx(&sim)).with_name("odd");
    odd.set_default_units(true).unwrap();
    assert_eq!(odd.units(), unit("km"));
    assert!(odd.set_default_units(false).is_err());

    let unnamed = SimArray::from_vec(vec![1.0]).with_context(ctx(&sim));
    assert!(matches!(unnamed.set_default_units(false), Err(ArrayError::NoContext)));
}

#[test]
fn original_units_follow_the_context_scheme() {
    let sim = MockSim::new(1.0);
    let m = tagged(&[1.988_47e30], "kg").with_context(ctx(&sim));
    let native = m.in_original_units().unwrap();
    assert_eq!(native.units(), unit("Msol"));
    assert_all_close(&native.to_vec(), &[1.0]);
}

#[test]
fn derived_flag_can_only_be_revoked() {
    let sim = MockSim::new(1.0);
    sim.mark_derived("rho");
    let rho = tagged(&[1.0], "Msol kpc^-3").with_context(ctx(&sim)).with_name("rho");

    assert!(rho.derived());
    assert!(matches!(rho.set_derived(true), Err(ArrayError::DerivationForced)));
    rho.set_derived(false).unwrap();
    assert!(!rho.derived());
    assert!(!tagged(&[1.0], "kpc").derived());
}

#[test]
fn write_goes_through_the_context() {
    let sim = MockSim::new(1.0);
    let gas = tagged(&[1.0], "K")
        .with_context(ctx(&sim))
        .with_name("temp")
        .with_family(Family::new("gas"));
    gas.write().unwrap();
    assert_eq!(
        sim.written.borrow().as_slice(),
        &[("temp".to_string(), Some("gas".to_string()))]
    );

    assert!(matches!(tagged(&[1.0], "K").write(), Err(ArrayError::NoContext)));
}

#[test]
fn binding_a_subcontext_stores_its_ancestor() {
    let sim = MockSim::new(1.0);
    let sub: Rc<dyn SimContext> = Rc::new(FamilySim {
        parent: Rc::clone(&sim),
        family: Family::new("dm"),
    });
    let a = SimArray::from_vec(vec![1.0]).with_context(sub);
    // The sub-context itself is gone; the array still resolves through the parent.
    assert!(a.context().is_some());
    assert_eq!(a.conversion_context().get("a"), Some(&1.0));
}

//===================================================================
// --------------------------- Comparisons --------------------------
//===================================================================

#[test]
fn comparisons_rescale_the_rhs() {
    let a = tagged(&[500.0, 1500.0], "kpc");
    let one_mpc = tagged(&[1.0], "Mpc");
    let lt = a.lt(&one_mpc).unwrap();
    assert_eq!(lt.as_slice(), &[true, false]);
    assert!(a.compare(&one_mpc, CmpOp::Ne).unwrap().all());
}

#[test]
fn one_sided_comparisons_fail_both_ways() {
    let a = tagged(&[1.0], "kpc");
    let plain = SimArray::from_vec(vec![1.0]);
    assert!(matches!(a.gt(&plain), Err(ArrayError::Units(UnitsError::OneSided { .. }))));
    assert!(matches!(plain.gt(&a), Err(ArrayError::Units(UnitsError::OneSided { .. }))));

    let untagged = SimArray::from_vec(vec![0.5]);
    assert!(plain.gt(&untagged).unwrap().all());
}

#[test]
fn display_includes_the_unit() {
    let a = tagged(&[1.0, 2.0], "kpc");
    assert_eq!(a.to_string(), "SimArray([1, 2], 'kpc')");
    assert_eq!(SimArray::from_vec(vec![3i32]).to_string(), "SimArray([3])");
}
