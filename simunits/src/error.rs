// simunits/src/error.rs
use thiserror::Error;

use crate::unit::{ConversionContext, Unit};

/// Failures of the unit algebra.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitsError {
    /// No conversion ratio exists between two units under the given context.
    #[error("incompatible units: cannot express {from} in {to} (context {context:?})")]
    Incompatible {
        from: Unit,
        to: Unit,
        context: ConversionContext,
    },
    /// Exactly one operand of a comparison carries a unit.
    #[error("one side of a comparison has units and the other does not ({lhs} vs {rhs})")]
    OneSided { lhs: Unit, rhs: Unit },
    #[error("unknown unit symbol '{0}'")]
    UnknownSymbol(String),
    #[error("cannot parse unit expression '{expr}': {reason}")]
    Parse { expr: String, reason: &'static str },
    /// The result unit of an operation cannot be represented (e.g. a float power).
    #[error("cannot track units through {op}")]
    Untrackable { op: String },
}
