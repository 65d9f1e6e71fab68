// tests/common/mod.rs
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use simarray::{ConversionContext, Family, SimArray, SimContext, Unit, UnitsError};

//===================================================================
// ---------------------------- Helpers -----------------------------
//===================================================================

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

pub fn assert_all_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "length mismatch: {got:?} vs {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!(approx_eq(*g, *w), "{got:?} != {want:?}");
    }
}

pub fn unit(expr: &str) -> Unit {
    Unit::parse(expr).unwrap()
}

/// 1-d `f64` array tagged with `units`.
pub fn tagged(values: &[f64], units: &str) -> SimArray<f64> {
    SimArray::from_vec(values.to_vec()).with_units(units).unwrap()
}

//===================================================================
// ---------------------------- MockSim -----------------------------
//===================================================================

/// Minimal owning context: records notifications and writes.
pub struct MockSim {
    pub scale_factor: f64,
    pub dirty: RefCell<Vec<String>>,
    pub written: RefCell<Vec<(String, Option<String>)>>,
    pub derived: RefCell<HashSet<String>>,
}

impl MockSim {
    pub fn new(scale_factor: f64) -> Rc<Self> {
        Rc::new(MockSim {
            scale_factor,
            dirty: RefCell::new(Vec::new()),
            written: RefCell::new(Vec::new()),
            derived: RefCell::new(HashSet::new()),
        })
    }

    pub fn dirty_log(&self) -> Vec<String> {
        self.dirty.borrow().clone()
    }

    pub fn mark_derived(&self, name: &str) {
        self.derived.borrow_mut().insert(name.to_string());
    }
}

/// `sim` as a trait object.
pub fn ctx(sim: &Rc<MockSim>) -> Rc<dyn SimContext> {
    sim.clone()
}

const NATIVE_UNITS: &[&str] = &["Msol kpc^-3", "kpc", "Msol", "km s^-1"];

fn infer(unit: &Unit) -> Result<Unit, UnitsError> {
    let empty = ConversionContext::new();
    for native in NATIVE_UNITS {
        let n = Unit::parse(native)?;
        if unit.is_convertible(&n, &empty) {
            return Ok(n);
        }
    }
    Err(UnitsError::Incompatible {
        from: unit.clone(),
        to: Unit::NoUnit,
        context: empty,
    })
}

fn default_units(name: &str) -> Result<Unit, UnitsError> {
    match name {
        "pos" => Unit::parse("kpc a"),
        "mass" => Unit::parse("Msol"),
        other => Err(UnitsError::UnknownSymbol(other.to_string())),
    }
}

impl SimContext for MockSim {
    fn conversion_context(&self) -> ConversionContext {
        let mut c = ConversionContext::new();
        c.insert("a".to_string(), self.scale_factor);
        c.insert("h".to_string(), 0.7);
        c
    }

    fn mark_dirty(&self, name: &str) {
        self.dirty.borrow_mut().push(name.to_string());
    }

    fn infer_original_units(&self, unit: &Unit) -> Result<Unit, UnitsError> {
        infer(unit)
    }

    fn default_units_for(&self, name: &str) -> Result<Unit, UnitsError> {
        default_units(name)
    }

    fn narrow(self: Rc<Self>, family: &Family) -> Rc<dyn SimContext> {
        Rc::new(FamilySim {
            parent: self,
            family: family.clone(),
        })
    }

    fn is_derived_array(&self, name: &str, _family: Option<&Family>) -> bool {
        self.derived.borrow().contains(name)
    }

    fn unlink_array(&self, name: &str) {
        self.derived.borrow_mut().remove(name);
    }

    fn write_array(&self, name: &str, family: Option<&Family>) -> simarray::Result<()> {
        self.written
            .borrow_mut()
            .push((name.to_string(), family.map(|f| f.name().to_string())));
        Ok(())
    }
}

/// The particles of one family inside a [`MockSim`].
pub struct FamilySim {
    pub parent: Rc<MockSim>,
    pub family: Family,
}

impl SimContext for FamilySim {
    fn conversion_context(&self) -> ConversionContext {
        self.parent.conversion_context()
    }

    fn mark_dirty(&self, name: &str) {
        self.parent.mark_dirty(&format!("{}/{}", self.family, name));
    }

    fn infer_original_units(&self, unit: &Unit) -> Result<Unit, UnitsError> {
        infer(unit)
    }

    fn default_units_for(&self, name: &str) -> Result<Unit, UnitsError> {
        default_units(name)
    }

    fn narrow(self: Rc<Self>, family: &Family) -> Rc<dyn SimContext> {
        Rc::new(FamilySim {
            parent: Rc::clone(&self.parent),
            family: family.clone(),
        })
    }

    fn ancestor(&self) -> Option<Rc<dyn SimContext>> {
        Some(self.parent.clone())
    }

    fn is_derived_array(&self, name: &str, family: Option<&Family>) -> bool {
        self.parent.is_derived_array(name, family)
    }

    fn unlink_array(&self, name: &str) {
        self.parent.unlink_array(name);
    }

    fn write_array(&self, name: &str, _family: Option<&Family>) -> simarray::Result<()> {
        self.parent.write_array(name, Some(&self.family))
    }
}
