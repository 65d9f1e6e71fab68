// src/array/elementwise.rs
//! Elementwise ufuncs, tagged through the rule registry.
//!
//! `apply` / `apply_binary` are the entry points for operations defined outside
//! this crate: register a rule under the operation's name with
//! [`register_rule`](crate::ufunc::register_rule) and the result is tagged by it.

use num_traits::Float;
use rayon::prelude::*;

use super::container::NumericContainer;
use super::SimArray;
use crate::error::{ArrayError, Result};
use crate::math::Scalar;
use crate::ufunc::{ops, Number, Operand};

impl<T: Scalar> SimArray<T> {
    /// Apply `f` elementwise as operation `op`. `params` are passed to the
    /// unit rule after this array's units.
    pub fn apply<F>(&self, op: &str, params: &[Number], f: F) -> SimArray<T>
    where
        F: Fn(T) -> T + Send + Sync,
    {
        let mut operands = Vec::with_capacity(params.len() + 1);
        operands.push(Operand::Array(self.units_opt()));
        operands.extend(params.iter().map(|&n| Operand::Number(n)));
        let data = self.to_vec().into_par_iter().map(f).collect();
        self.unary_result(op, &operands, data)
    }

    /// Combine with `rhs` elementwise (broadcasting) as operation `op`.
    pub fn apply_binary<R, F>(&self, op: &str, rhs: &R, f: F) -> Result<SimArray<T>>
    where
        R: NumericContainer<T> + ?Sized,
        F: Fn(T, T) -> T + Send + Sync,
    {
        let rhs = rhs.as_array();
        let (shape, data) = self.zip_with(&rhs, f)?;
        let operands = [Operand::Array(self.units_opt()), Operand::Array(rhs.units_opt())];
        Ok(self.binary_result(&rhs, op, &operands, shape, data))
    }

    /// Square root; the unit's exponents are halved.
    pub fn sqrt(&self) -> SimArray<T> {
        self.apply(ops::SQRT, &[], T::sqrt_real)
    }

    /// Absolute value; keeps the unit.
    pub fn abs(&self) -> SimArray<T> {
        let data = self.to_vec().into_par_iter().map(T::abs_real).collect();
        self.derive(self.shape().to_vec(), data, self.units_opt())
    }

    /// Euclidean norm of all elements, as a 0-d array in this array's units.
    pub fn norm(&self) -> Result<SimArray<T>> {
        let sq: f64 = self
            .to_vec()
            .par_iter()
            .map(|&x| {
                let v = x.to_f64_lossy();
                v * v
            })
            .sum();
        let n = sq.sqrt();
        let value = T::from_f64(n).ok_or(ArrayError::Cast { value: n })?;
        let units = crate::ufunc::resolve_units(ops::NORM, &[Operand::Array(self.units_opt())]);
        Ok(match units {
            Some(u) => self.derive(Vec::new(), vec![value], Some(u)),
            None => SimArray::scalar(value),
        })
    }
}

macro_rules! impl_trig {
    ($($name:ident => $f:ident),* $(,)?) => {
        /// Trigonometric and hyperbolic functions. Results are dimensionless;
        /// input units are not checked.
        impl<T: Scalar + Float> SimArray<T> {
            $(
                pub fn $name(&self) -> SimArray<T> {
                    self.apply(stringify!($name), &[], |x| x.$f())
                }
            )*

            /// Four-quadrant `atan2(self, x)`.
            pub fn arctan2<R: NumericContainer<T> + ?Sized>(&self, x: &R) -> Result<SimArray<T>> {
                self.apply_binary("arctan2", x, |y, x| y.atan2(x))
            }
        }
    };
}

impl_trig!(
    sin => sin,
    cos => cos,
    tan => tan,
    arcsin => asin,
    arccos => acos,
    arctan => atan,
    sinh => sinh,
    cosh => cosh,
    tanh => tanh,
    arcsinh => asinh,
    arccosh => acosh,
    arctanh => atanh,
);
