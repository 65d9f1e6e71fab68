// src/array/arith.rs
/*!
Binary arithmetic with unit reconciliation.

# Addition / subtraction
1. Both operands tagged: the ratio `rhs.units -> lhs.units` is computed under the
   merged conversion context (the lhs context wins on key collisions). No ratio
   means `UnitsError::Incompatible`.
2. Ratio exactly `1`: combine directly. Otherwise the rhs is rescaled (combined in
   `f64`, cast back to `T`). Either way the rhs tag is dropped, so the result takes
   the lhs unit even when the two units only agree under the context.
3. One operand tagged: the other is taken to be in that unit already.
4. Neither tagged: plain elementwise arithmetic.

# Multiplication / division / power
Result units come from the rule registry (product, quotient, exact powers).
A rule that cannot track the units yields a plain, untagged result.

All binary operations broadcast with numpy's trailing-axis rule.
*/

use std::ops::{Add, Div, Mul, Neg, Sub};

use rayon::prelude::*;

use super::container::NumericContainer;
use super::SimArray;
use crate::error::{ArrayError, Result};
use crate::math::buffer::Buffer;
use crate::math::{broadcast_shapes, Scalar};
use crate::ufunc::{ops, resolve_units, Number, Operand};

/// `x / y`, with integer division by zero giving zero.
#[inline]
pub(crate) fn safe_div<T: Scalar>(x: T, y: T) -> T {
    if T::INTEGER && y.is_zero() {
        T::zero()
    } else {
        x / y
    }
}

/// Floor modulo (sign follows `y`), with integer modulo by zero giving zero.
#[inline]
pub(crate) fn safe_rem<T: Scalar>(x: T, y: T) -> T {
    if T::INTEGER && y.is_zero() {
        T::zero()
    } else {
        x.floor_mod(y)
    }
}

impl<T: Scalar> SimArray<T> {
    /// Broadcast both operands to a common shape and combine them elementwise.
    pub(crate) fn zip_with<R, F>(&self, rhs: &SimArray<T>, f: F) -> Result<(Vec<usize>, Vec<R>)>
    where
        R: Send,
        F: Fn(T, T) -> R + Send + Sync,
    {
        let shape = broadcast_shapes(self.shape(), rhs.shape())?;
        let a = self.values_as(&shape)?;
        let b = rhs.values_as(&shape)?;
        let out = a.par_iter().zip(b.par_iter()).map(|(&x, &y)| f(x, y)).collect();
        Ok((shape, out))
    }

    /// Tag a fresh same-shape result of a unary operation by the rule for `op`.
    pub(crate) fn unary_result(&self, op: &str, operands: &[Operand], data: Vec<T>) -> SimArray<T> {
        let shape = self.shape().to_vec();
        match resolve_units(op, operands) {
            Some(units) => self.derive(shape, data, Some(units)),
            None => SimArray::from_buffer(Buffer::from(data), shape),
        }
    }

    /// Tag a fresh binary result by the rule for `op`. The context comes from
    /// `self`, falling back to `rhs`.
    pub(crate) fn binary_result(
        &self,
        rhs: &SimArray<T>,
        op: &str,
        operands: &[Operand],
        shape: Vec<usize>,
        data: Vec<T>,
    ) -> SimArray<T> {
        match resolve_units(op, operands) {
            Some(units) => {
                let owner = if self.context_handle().is_bound() || !rhs.context_handle().is_bound() {
                    self
                } else {
                    rhs
                };
                owner.derive(shape, data, Some(units))
            }
            None => SimArray::from_buffer(Buffer::from(data), shape),
        }
    }

    /// Ratio that brings `rhs` into this array's units, if both are tagged.
    ///
    /// `Ok(None)` when at most one side carries a unit.
    pub(crate) fn rescale_ratio(&self, rhs: &SimArray<T>) -> Result<Option<f64>> {
        let (Some(lhs_units), Some(rhs_units)) = (self.units_opt(), rhs.units_opt()) else {
            return Ok(None);
        };
        let mut context = rhs.conversion_context();
        context.extend(self.conversion_context());
        Ok(Some(rhs_units.ratio(&lhs_units, &context)?))
    }

    pub(crate) fn generic_add(&self, rhs: &SimArray<T>, subtract: bool) -> Result<SimArray<T>> {
        let op = if subtract { ops::SUBTRACT } else { ops::ADD };
        let lhs_units = Operand::Array(self.units_opt());

        match self.rescale_ratio(rhs)? {
            Some(cr) if cr != 1.0 => {
                let (shape, wide) = self.zip_with(rhs, |x, y| {
                    let (x, y) = (x.to_f64_lossy(), y.to_f64_lossy() * cr);
                    if subtract {
                        x - y
                    } else {
                        x + y
                    }
                })?;
                let data = wide
                    .into_par_iter()
                    .map(|v| T::from_f64(v).ok_or(ArrayError::Cast { value: v }))
                    .collect::<Result<Vec<T>>>()?;
                Ok(self.binary_result(rhs, op, &[lhs_units, Operand::Array(None)], shape, data))
            }
            ratio => {
                let (shape, data) =
                    self.zip_with(rhs, |x, y| if subtract { x - y } else { x + y })?;
                let rhs_units = match ratio {
                    Some(_) => Operand::Array(None),
                    None => Operand::Array(rhs.units_opt()),
                };
                Ok(self.binary_result(rhs, op, &[lhs_units, rhs_units], shape, data))
            }
        }
    }

    fn generic_mul(&self, rhs: &SimArray<T>, divide: bool) -> Result<SimArray<T>> {
        let (op, (shape, data)) = if divide {
            (ops::DIVIDE, self.zip_with(rhs, safe_div)?)
        } else {
            (ops::MULTIPLY, self.zip_with(rhs, |x, y| x * y)?)
        };
        let operands = [Operand::Array(self.units_opt()), Operand::Array(rhs.units_opt())];
        Ok(self.binary_result(rhs, op, &operands, shape, data))
    }

    // ------------------------------ Public surface ----------------------------

    /// `self + rhs`, converting `rhs` into this array's units.
    pub fn checked_add<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        self.generic_add(&rhs.as_array(), false)
    }

    /// `self - rhs`, converting `rhs` into this array's units.
    pub fn checked_sub<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        self.generic_add(&rhs.as_array(), true)
    }

    pub fn checked_mul<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        self.generic_mul(&rhs.as_array(), false)
    }

    /// Integer division by zero yields zero.
    pub fn checked_div<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        self.generic_mul(&rhs.as_array(), true)
    }

    /// Raise to `exponent`. Integer and rational exponents scale the unit;
    /// any other exponent gives a plain, untagged result.
    pub fn pow(&self, exponent: impl Into<Number>) -> SimArray<T> {
        let n = exponent.into();
        let e = n.as_f64();
        let data = self.to_vec().into_par_iter().map(|x| x.powf_real(e)).collect();
        let operands = [Operand::Array(self.units_opt()), Operand::Number(n)];
        self.unary_result(ops::POWER, &operands, data)
    }

    fn map_scalar<F>(&self, op: &str, f: F) -> SimArray<T>
    where
        F: Fn(T) -> T + Send + Sync,
    {
        let data = self.to_vec().into_par_iter().map(f).collect();
        self.unary_result(op, &[Operand::Array(self.units_opt()), Operand::Array(None)], data)
    }

    /// Add an untagged scalar, taken to be in this array's units.
    pub fn add_scalar(&self, v: T) -> SimArray<T> {
        self.map_scalar(ops::ADD, move |x| x + v)
    }

    pub fn sub_scalar(&self, v: T) -> SimArray<T> {
        self.map_scalar(ops::SUBTRACT, move |x| x - v)
    }

    pub fn mul_scalar(&self, v: T) -> SimArray<T> {
        self.map_scalar(ops::MULTIPLY, move |x| x * v)
    }

    pub fn div_scalar(&self, v: T) -> SimArray<T> {
        self.map_scalar(ops::DIVIDE, move |x| safe_div(x, v))
    }
}

//===================================================================
// ------------------------- Operator Traits ------------------------
//===================================================================

macro_rules! impl_array_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl<T: Scalar> $trait<&SimArray<T>> for &SimArray<T> {
            type Output = SimArray<T>;

            /// Panics on incompatible units or shapes; use the `checked_*` form to recover.
            #[inline]
            fn $method(self, rhs: &SimArray<T>) -> SimArray<T> {
                self.$checked(rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl<T: Scalar> $trait for SimArray<T> {
            type Output = SimArray<T>;

            #[inline]
            fn $method(self, rhs: SimArray<T>) -> SimArray<T> {
                (&self).$method(&rhs)
            }
        }
    };
}

impl_array_op!(Add, add, checked_add);
impl_array_op!(Sub, sub, checked_sub);
impl_array_op!(Mul, mul, checked_mul);
impl_array_op!(Div, div, checked_div);

impl<T: Scalar + Neg<Output = T>> Neg for &SimArray<T> {
    type Output = SimArray<T>;

    fn neg(self) -> SimArray<T> {
        let data = self.to_vec().into_par_iter().map(|x| -x).collect();
        self.unary_result(ops::NEGATIVE, &[Operand::Array(self.units_opt())], data)
    }
}

impl<T: Scalar + Neg<Output = T>> Neg for SimArray<T> {
    type Output = SimArray<T>;

    #[inline]
    fn neg(self) -> SimArray<T> {
        -&self
    }
}
