// tests/arithmetic.rs

mod common;

use common::{approx_eq, assert_all_close, ctx, tagged, unit, MockSim};
use simarray::{ArrayError, SimArray, UnitsError};

//===================================================================
// ---------------------- Addition / Subtraction --------------------
//===================================================================

#[test]
fn adding_kpc_to_mpc_converts_rhs() {
    let a = tagged(&[1.0, 2.0], "Mpc");
    let b = tagged(&[1.0, 2.0], "kpc");

    let ab = &a + &b;
    assert_all_close(&ab.to_vec(), &[1.001, 2.002]);
    assert_eq!(ab.units(), unit("Mpc"));

    let ba = &b + &a;
    assert_all_close(&ba.to_vec(), &[1001.0, 2002.0]);
    assert_eq!(ba.units(), unit("kpc"));
}

#[test]
fn units_equal_only_under_the_context_keep_the_lhs_unit() {
    let sim = MockSim::new(1.0);
    let comoving = tagged(&[1.0], "kpc a").with_context(ctx(&sim));
    let physical = tagged(&[2.0], "kpc");

    let sum = comoving.checked_add(&physical).unwrap();
    assert_all_close(&sum.to_vec(), &[3.0]);
    assert_eq!(sum.units(), unit("kpc a"));
    assert!(sum.context().is_some());

    let mut in_place = comoving.copy();
    in_place += &physical;
    assert_eq!(in_place.units(), sum.units());
}

#[test]
fn subtraction_converts_like_addition() {
    let a = tagged(&[1.0], "km");
    let b = tagged(&[500.0], "m");
    let d = a.checked_sub(&b).unwrap();
    assert_all_close(&d.to_vec(), &[0.5]);
    assert_eq!(d.units(), unit("km"));
}

#[test]
fn untagged_addition_never_fails() {
    let a = SimArray::from_vec(vec![1, 2, 3]);
    let b = SimArray::from_vec(vec![4, 5, 6]);
    let c = &a + &b;
    assert_eq!(c.to_vec(), vec![5, 7, 9]);
    assert!(!c.has_units());
    assert!(c.units().is_no_unit());
}

#[test]
fn incompatible_addition_is_a_units_error() {
    let a = tagged(&[1.0], "Mpc");
    let m = tagged(&[1.0], "Msol");
    let err = a.checked_add(&m).unwrap_err();
    assert!(err.is_units_error());
    assert!(matches!(err, ArrayError::Units(UnitsError::Incompatible { .. })));
}

#[test]
#[should_panic(expected = "incompatible units")]
fn incompatible_operator_panics() {
    let a = tagged(&[1.0], "Mpc");
    let m = tagged(&[1.0], "Msol");
    let _ = &a + &m;
}

#[test]
fn one_tagged_operand_lends_its_units() {
    let a = tagged(&[1.0, 2.0], "kpc");
    let plain = SimArray::from_vec(vec![10.0, 20.0]);

    let l = &a + &plain;
    assert_eq!(l.units(), unit("kpc"));
    assert_all_close(&l.to_vec(), &[11.0, 22.0]);

    let r = &plain + &a;
    assert_eq!(r.units(), unit("kpc"));
}

#[test]
fn contextual_units_add_with_the_owning_context() {
    let sim = MockSim::new(0.5);
    let a = tagged(&[1.0], "kpc").with_context(ctx(&sim));
    let b = tagged(&[2.0], "kpc a").with_context(ctx(&sim));
    let c = a.checked_add(&b).unwrap();
    assert_all_close(&c.to_vec(), &[2.0]);
    assert_eq!(c.units(), unit("kpc"));

    // Without a context `a` has no value and the ratio does not exist.
    let unbound = tagged(&[2.0], "kpc a");
    assert!(tagged(&[1.0], "kpc").checked_add(&unbound).is_err());
}

#[test]
fn scalar_operands_take_the_array_units() {
    let a = tagged(&[1.0, 2.0], "kpc");
    let b = a.add_scalar(1.0);
    assert_all_close(&b.to_vec(), &[2.0, 3.0]);
    assert_eq!(b.units(), unit("kpc"));
    assert_eq!(a.mul_scalar(3.0).units(), unit("kpc"));
}

//===================================================================
// -------------------- Multiplication / Division -------------------
//===================================================================

#[test]
fn products_and_quotients_combine_units() {
    let m = tagged(&[2.0, 4.0], "Msol");
    let v = tagged(&[2.0, 8.0], "kpc^3");

    let rho = &m / &v;
    assert_all_close(&rho.to_vec(), &[1.0, 0.5]);
    assert_eq!(rho.units(), unit("Msol kpc^-3"));

    let back = &rho * &v;
    assert_eq!(back.units(), unit("Msol"));
}

#[test]
fn dividing_plain_by_tagged_inverts() {
    let one = SimArray::from_vec(vec![1.0]);
    let t = tagged(&[4.0], "s");
    let f = one.checked_div(&t).unwrap();
    assert_eq!(f.units(), unit("s^-1"));
    assert_all_close(&f.to_vec(), &[0.25]);
}

#[test]
fn integer_division_by_zero_yields_zero() {
    let a = SimArray::from_vec(vec![4i32, 5]);
    let b = SimArray::from_vec(vec![0i32, 2]);
    assert_eq!((&a / &b).to_vec(), vec![0, 2]);
}

#[test]
fn broadcasting_follows_trailing_axes() {
    let a = SimArray::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
    let row = SimArray::from_vec(vec![10.0, 20.0, 30.0]);
    let c = &a + &row;
    assert_eq!(c.shape(), &[2, 3]);
    assert_eq!(c.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);

    let bad = SimArray::from_vec(vec![1.0, 2.0]);
    assert!(matches!(a.checked_add(&bad), Err(ArrayError::ShapeMismatch { .. })));
}

//===================================================================
// ------------------------------ Powers ----------------------------
//===================================================================

#[test]
fn integer_power_raises_units() {
    let x = tagged(&[1.0, 4.0], "Msol Mpc^-3");
    let sq = x.pow(2);
    assert_all_close(&sq.to_vec(), &[1.0, 16.0]);
    assert_eq!(sq.units().to_string(), "Msol^2 Mpc^-6");
}

#[test]
fn rational_power_is_tracked_exactly() {
    let x = tagged(&[4.0], "kpc^2");
    let r = x.pow((1, 2));
    assert_all_close(&r.to_vec(), &[2.0]);
    assert_eq!(r.units(), unit("kpc"));
}

#[test]
fn float_power_drops_units_but_keeps_values() {
    let sim = MockSim::new(1.0);
    let x = tagged(&[1.0, 4.0], "Msol Mpc^-3").with_context(ctx(&sim));
    let p = x.pow(0.333);
    assert!(!p.has_units());
    assert!(p.context().is_none());
    assert!(approx_eq(p.to_vec()[1], 4.0f64.powf(0.333)));
}

#[test]
fn negation_and_abs_keep_units() {
    let x = tagged(&[-1.0, 2.0], "km s^-1");
    let n = -&x;
    assert_eq!(n.to_vec(), vec![1.0, -2.0]);
    assert_eq!(n.units(), unit("km s^-1"));
    assert_eq!(x.abs().units(), unit("km s^-1"));
}

//===================================================================
// ---------------------------- Results -----------------------------
//===================================================================

#[test]
fn results_are_unnamed_copies_in_the_lhs_context() {
    let sim = MockSim::new(1.0);
    let a = tagged(&[1.0], "kpc").with_context(ctx(&sim)).with_name("pos");
    let b = tagged(&[1.0], "kpc");

    let c = &a + &b;
    assert!(c.name().is_none());
    assert!(c.context().is_some());
    assert!(!c.shares_storage_with(&a));

    // An unbound lhs borrows the rhs context.
    let d = &b * &a;
    assert!(d.context().is_some());
    assert_eq!(d.units(), unit("kpc^2"));
}

#[test]
fn retagging_by_a_unit_operand() {
    let a = SimArray::from_vec(vec![3.0]);
    let kpc = unit("kpc");
    let t = &a * &kpc;
    assert_eq!(t.units(), kpc);
    assert_eq!(t.to_vec(), vec![3.0]);

    let per = &t / &unit("Gyr");
    assert_eq!(per.units(), unit("kpc Gyr^-1"));
}

//===================================================================
// ------------------------ Floor div / modulo ----------------------
//===================================================================

#[test]
fn modulo_follows_floor_division() {
    let mut a = tagged(&[7.0, -7.0], "kpc");
    a.checked_floor_div_assign(&SimArray::from_vec(vec![2.0, 2.0])).unwrap();
    assert_eq!(a.to_vec(), vec![3.0, -4.0]);
    a %= &SimArray::from_vec(vec![3.0, 3.0]);
    assert_eq!(a.to_vec(), vec![0.0, 2.0]);
    assert_eq!(a.units(), unit("kpc"));

    let mut ints = SimArray::from_vec(vec![-7i64, 7, -7, 5]);
    ints %= &SimArray::from_vec(vec![3i64, -3, -3, 0]);
    assert_eq!(ints.to_vec(), vec![2, -2, -1, 0]);
}
