// src/error.rs
use simunits::UnitsError;
use thiserror::Error;

/// All errors returned by `simarray`.
///
/// The variants fall into three classes:
/// - unit algebra failures, wrapped from [`UnitsError`] (incompatible dimensions,
///   one-sided comparisons);
/// - *value* failures: units requested from an array that has none, forcing derivation;
/// - *runtime* failures: an operation needs the owning context but none is bound.
#[derive(Debug, Error)]
pub enum ArrayError {
    #[error(transparent)]
    Units(#[from] UnitsError),

    /// A conversion was requested from an array whose units are unknown.
    #[error("units of array unknown")]
    UnitsUnknown,

    /// `derived` can only be revoked, never forced.
    #[error("can only unlink an array; delete the array to force re-derivation")]
    DerivationForced,

    /// The operation needs an owning context (and possibly a name) but none is bound.
    #[error("no link to an owning simulation context")]
    NoContext,

    /// Operand shapes cannot be broadcast together.
    #[error("shape mismatch: {lhs:?} vs {rhs:?}")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("invalid shape {shape:?}: {reason}")]
    InvalidShape {
        shape: Vec<usize>,
        reason: &'static str,
    },

    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[error("axis {axis} out of bounds for array with {ndim} dimensions")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    /// A reshape was requested on a non-contiguous view.
    #[error("operation requires a contiguous layout")]
    NotContiguous,

    #[error("reduction over an empty array")]
    EmptyReduction,

    /// A value computed in `f64` does not fit the element type.
    #[error("value {value} cannot be represented in the element type")]
    Cast { value: f64 },

    #[error("shared memory allocation failed: {0}")]
    SharedMemory(#[from] std::io::Error),
}

impl ArrayError {
    /// True for failures originating in the unit algebra.
    #[inline]
    pub fn is_units_error(&self) -> bool {
        matches!(self, ArrayError::Units(_))
    }
}

/// Convenience alias used throughout `simarray`.
pub type Result<T> = std::result::Result<T, ArrayError>;
