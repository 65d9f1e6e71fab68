// tests/properties.rs

mod common;

use common::approx_eq;
use proptest::prelude::*;
use simarray::{IndexSpec, SimArray};

fn values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e6f64..1e6, 1..32)
}

proptest! {
    #[test]
    fn conversion_round_trips(v in values()) {
        let a = SimArray::from_vec(v.clone()).with_units("kpc").unwrap();
        let back = a.in_units("Mpc").unwrap().in_units("kpc").unwrap();
        for (x, y) in v.iter().zip(back.to_vec()) {
            prop_assert!(approx_eq(*x, y), "{x} vs {y}");
        }
    }

    #[test]
    fn in_place_conversion_round_trips(v in values()) {
        let mut a = SimArray::from_vec(v.clone()).with_units("kpc").unwrap();
        a.convert_units("Mpc").unwrap();
        a.convert_units("kpc").unwrap();
        prop_assert_eq!(a.units(), simarray::Unit::parse("kpc").unwrap());
        for (x, y) in v.iter().zip(a.to_vec()) {
            prop_assert!(approx_eq(*x, y), "{x} vs {y}");
        }
    }

    #[test]
    fn addition_matches_manual_rescaling(pairs in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..32)) {
        let (lhs, rhs): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let a = SimArray::from_vec(lhs.clone()).with_units("kpc").unwrap();
        let b = SimArray::from_vec(rhs.clone()).with_units("Mpc").unwrap();
        let sum = a.checked_add(&b).unwrap();
        for ((x, y), s) in lhs.iter().zip(&rhs).zip(sum.to_vec()) {
            prop_assert!(approx_eq(x + 1000.0 * y, s));
        }
    }

    #[test]
    fn writes_through_reindexed_views_reach_the_base(
        n in 4usize..64,
        step in 1usize..4,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
        value in -1e3f64..1e3,
    ) {
        let base = SimArray::from_vec(vec![0.0; n]);
        let outer = base.index(IndexSpec::stepped(0, n, step)).unwrap();
        let positions: Vec<usize> = picks.iter().map(|p| p.index(outer.len())).collect();
        let mut inner = outer.index(IndexSpec::positions(positions.clone())).unwrap();

        for i in 0..inner.len() {
            inner.set(&[i], value).unwrap();
        }
        for &p in &positions {
            prop_assert_eq!(base.get(&[p * step]).unwrap(), value);
            prop_assert_eq!(outer.get(&[p]).unwrap(), value);
        }
        let touched = base.to_vec().iter().filter(|&&x| x != 0.0).count();
        prop_assert!(touched <= positions.len());
    }
}
