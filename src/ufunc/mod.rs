// src/ufunc/mod.rs
/*!
Unit rules for elementwise and reduction operations.

Every operation an array performs is identified by a name (see [`ops`]). Before
producing a result the array asks the process-wide registry for that name's
[`UnitRule`] and feeds it the operands' units:

- a rule returning `Ok(unit)` tags the result with `unit` (`Unit::NoUnit` means
  "no unit", but the result stays linked to the operand's context);
- a missing rule, or a rule returning `Err`, degrades the result to a plain
  untagged array. Unit tracking never blocks a valid numeric computation.

Downstream code adds rules for its own operations with [`register_rule`].
*/

mod registry;
mod rules;

use num_rational::Ratio;
use simunits::{Exponent, Unit};

pub use registry::{register_rule, registered_ops, resolve_units, rule_for, UnitRule};

/// Operation names understood by the built-in rule set.
pub mod ops {
    pub const SQRT: &str = "sqrt";
    pub const MULTIPLY: &str = "multiply";
    pub const DIVIDE: &str = "divide";
    pub const ADD: &str = "add";
    pub const SUBTRACT: &str = "subtract";
    pub const POWER: &str = "power";
    pub const NEGATIVE: &str = "negative";
    pub const NORM: &str = "norm";

    pub const TRIG: &[&str] = &[
        "sin", "cos", "tan", "arcsin", "arccos", "arctan", "arctan2", "sinh", "cosh", "tanh",
        "arcsinh", "arccosh", "arctanh",
    ];

    pub const COMPARISONS: &[&str] = &[
        "greater",
        "greater_equal",
        "less",
        "less_equal",
        "equal",
        "not_equal",
    ];
}

/// Mutating operations that notify the owning context before they run.
pub const DIRTY_OPERATIONS: &[&str] = &[
    "setitem",
    "setslice",
    "iadd",
    "isub",
    "imul",
    "itruediv",
    "ifloordiv",
    "imod",
    "ipow",
    "ilshift",
    "irshift",
    "iand",
    "ior",
    "ixor",
    "invert",
];

// ============================================================================
// -------------------------------- Operands ----------------------------------
// ============================================================================

/// A plain number passed to an operation (e.g. the exponent of `power`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Rational(Ratio<i32>),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Rational(r) => f64::from(*r.numer()) / f64::from(*r.denom()),
            Number::Float(x) => x,
        }
    }

    /// Exact exponent, if this number is an integer or a rational.
    pub fn exact(self) -> Option<Exponent> {
        match self {
            Number::Int(i) => i32::try_from(i).ok().map(Exponent::from_integer),
            Number::Rational(r) => Some(r),
            Number::Float(_) => None,
        }
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(i64::from(v))
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

/// `(numerator, denominator)`. A zero denominator is not a rational; it becomes
/// the float `n / 0`, which no unit rule can track.
impl From<(i32, i32)> for Number {
    fn from((n, d): (i32, i32)) -> Self {
        if d == 0 {
            Number::Float(f64::from(n) / 0.0)
        } else {
            Number::Rational(Ratio::new(n, d))
        }
    }
}

impl From<Ratio<i32>> for Number {
    fn from(r: Ratio<i32>) -> Self {
        Number::Rational(r)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// What a rule sees of one operand.
#[derive(Debug, Clone)]
pub enum Operand {
    /// An array operand and its unit tag (`None` when untagged).
    Array(Option<Unit>),
    Number(Number),
}

impl Operand {
    /// The operand's unit, if it is a tagged array.
    pub fn units(&self) -> Option<&Unit> {
        match self {
            Operand::Array(Some(u)) if !u.is_no_unit() => Some(u),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<Number> {
        match self {
            Operand::Number(n) => Some(*n),
            Operand::Array(_) => None,
        }
    }
}
