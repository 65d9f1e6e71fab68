// src/ufunc/rules.rs
//! Built-in unit rules.

use std::sync::Arc;

use ahash::AHashMap;
use simunits::{ConversionContext, Unit, UnitsError};

use super::registry::UnitRule;
use super::{ops, Operand};

#[inline]
fn unit_at(operands: &[Operand], i: usize) -> Option<&Unit> {
    operands.get(i).and_then(Operand::units)
}

#[inline]
fn or_no_unit(u: Option<&Unit>) -> Unit {
    u.cloned().unwrap_or(Unit::NoUnit)
}

/// Halves every exponent.
fn sqrt_units(operands: &[Operand]) -> Result<Unit, UnitsError> {
    Ok(unit_at(operands, 0).map_or(Unit::NoUnit, |u| u.pow((1, 2))))
}

/// Product of the units; an untagged operand contributes nothing.
fn mul_units(operands: &[Operand]) -> Result<Unit, UnitsError> {
    Ok(match (unit_at(operands, 0), unit_at(operands, 1)) {
        (Some(a), Some(b)) => a * b,
        (Some(a), None) => a.clone(),
        (None, b) => or_no_unit(b),
    })
}

/// Quotient of the units; an untagged numerator leaves `1 / b`.
fn div_units(operands: &[Operand]) -> Result<Unit, UnitsError> {
    Ok(match (unit_at(operands, 0), unit_at(operands, 1)) {
        (Some(a), Some(b)) => a / b,
        (Some(a), None) => a.clone(),
        (None, Some(b)) => b.recip(),
        (None, None) => Unit::NoUnit,
    })
}

/// Both sides must already agree.
fn consistent_units(operands: &[Operand]) -> Result<Unit, UnitsError> {
    match (unit_at(operands, 0), unit_at(operands, 1)) {
        (Some(a), Some(b)) if a == b => Ok(a.clone()),
        (Some(a), Some(b)) => Err(UnitsError::Incompatible {
            from: b.clone(),
            to: a.clone(),
            context: ConversionContext::new(),
        }),
        (Some(a), None) => Ok(a.clone()),
        (None, b) => Ok(or_no_unit(b)),
    }
}

/// Integer and rational exponents only.
fn pow_units(operands: &[Operand]) -> Result<Unit, UnitsError> {
    let Some(base) = unit_at(operands, 0) else {
        return Ok(Unit::NoUnit);
    };
    match operands.get(1).and_then(Operand::number).and_then(|n| n.exact()) {
        Some(e) => Ok(base.pow(e)),
        None => Err(UnitsError::Untrackable {
            op: ops::POWER.to_string(),
        }),
    }
}

/// Input units are not checked.
fn trig_units(_: &[Operand]) -> Result<Unit, UnitsError> {
    Ok(Unit::dimensionless())
}

fn comparison_units(_: &[Operand]) -> Result<Unit, UnitsError> {
    Ok(Unit::NoUnit)
}

fn same_units(operands: &[Operand]) -> Result<Unit, UnitsError> {
    Ok(or_no_unit(unit_at(operands, 0)))
}

pub(super) fn builtin() -> AHashMap<String, UnitRule> {
    let mut map: AHashMap<String, UnitRule> = AHashMap::default();
    let mut put = |name: &str, rule: UnitRule| {
        map.insert(name.to_string(), rule);
    };

    put(ops::SQRT, Arc::new(sqrt_units));
    put(ops::MULTIPLY, Arc::new(mul_units));
    put(ops::DIVIDE, Arc::new(div_units));
    put(ops::ADD, Arc::new(consistent_units));
    put(ops::SUBTRACT, Arc::new(consistent_units));
    put(ops::POWER, Arc::new(pow_units));
    put(ops::NORM, Arc::new(same_units));
    put(ops::NEGATIVE, Arc::new(same_units));
    for &name in ops::TRIG {
        put(name, Arc::new(trig_units));
    }
    for &name in ops::COMPARISONS {
        put(name, Arc::new(comparison_units));
    }
    map
}
