// src/array/compare.rs
//! Unit-aware comparisons.
//!
//! - exactly one side tagged: `UnitsError::OneSided`;
//! - both tagged with different units: the rhs is rescaled into the lhs unit first;
//! - comparisons against a bare scalar are always allowed.

use serde::{Deserialize, Serialize};
use simunits::UnitsError;

use super::container::NumericContainer;
use super::SimArray;
use crate::error::{ArrayError, Result};
use crate::math::Scalar;

/// Elementwise comparison result. Also usable as a boolean mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolArray {
    shape: Vec<usize>,
    data: Vec<bool>,
}

impl BoolArray {
    pub fn new(data: Vec<bool>, shape: Vec<usize>) -> Result<Self> {
        if data.len() != shape.iter().product::<usize>() {
            return Err(ArrayError::InvalidShape {
                shape,
                reason: "mask length does not match shape",
            });
        }
        Ok(BoolArray { shape, data })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn all(&self) -> bool {
        self.data.iter().all(|&b| b)
    }

    pub fn any(&self) -> bool {
        self.data.iter().any(|&b| b)
    }

    /// Number of `true` entries.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    /// Elementwise negation.
    pub fn invert(&self) -> BoolArray {
        BoolArray {
            shape: self.shape.clone(),
            data: self.data.iter().map(|b| !b).collect(),
        }
    }
}

impl From<Vec<bool>> for BoolArray {
    fn from(data: Vec<bool>) -> Self {
        BoolArray {
            shape: vec![data.len()],
            data,
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    /// Operation name in the rule registry.
    pub fn name(self) -> &'static str {
        match self {
            CmpOp::Lt => "less",
            CmpOp::Le => "less_equal",
            CmpOp::Gt => "greater",
            CmpOp::Ge => "greater_equal",
            CmpOp::Eq => "equal",
            CmpOp::Ne => "not_equal",
        }
    }

    #[inline]
    fn apply<P: PartialOrd>(self, a: P, b: P) -> bool {
        match self {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
        }
    }
}

impl<T: Scalar> SimArray<T> {
    /// Elementwise `self <op> rhs`, broadcasting.
    pub fn compare<R: NumericContainer<T> + ?Sized>(&self, rhs: &R, op: CmpOp) -> Result<BoolArray> {
        let rhs = rhs.as_array();
        let ratio = match (self.units_opt(), rhs.units_opt()) {
            (Some(l), Some(r)) if l != r => Some(r.ratio(&l, &rhs.conversion_context())?),
            (Some(_), Some(_)) | (None, None) => None,
            (l, r) => {
                return Err(UnitsError::OneSided {
                    lhs: l.unwrap_or(simunits::Unit::NoUnit),
                    rhs: r.unwrap_or(simunits::Unit::NoUnit),
                }
                .into())
            }
        };
        let (shape, data) = match ratio {
            Some(cr) => self.zip_with(&rhs, |x, y| op.apply(x.to_f64_lossy(), y.to_f64_lossy() * cr))?,
            None => self.zip_with(&rhs, |x, y| op.apply(x, y))?,
        };
        Ok(BoolArray { shape, data })
    }

    /// Elementwise `self <op> value`; the scalar is taken to be in this array's units.
    pub fn compare_scalar(&self, value: T, op: CmpOp) -> BoolArray {
        BoolArray {
            shape: self.shape().to_vec(),
            data: self.to_vec().iter().map(|&x| op.apply(x, value)).collect(),
        }
    }

    pub fn lt<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<BoolArray> {
        self.compare(rhs, CmpOp::Lt)
    }

    pub fn le<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<BoolArray> {
        self.compare(rhs, CmpOp::Le)
    }

    pub fn gt<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<BoolArray> {
        self.compare(rhs, CmpOp::Gt)
    }

    pub fn ge<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<BoolArray> {
        self.compare(rhs, CmpOp::Ge)
    }

    pub fn equal<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<BoolArray> {
        self.compare(rhs, CmpOp::Eq)
    }

    pub fn not_equal<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<BoolArray> {
        self.compare(rhs, CmpOp::Ne)
    }
}
