// src/array/inplace.rs
/*!
In-place arithmetic and bitwise operators.

Each operator validates first (shape, units), then notifies the owning context
once, then writes. The right-hand side must broadcast to this array's shape.
On a view the write lands in the shared storage.

| operator | notification | unit effect |
|---|---|---|
| `+=`, `-=` | `iadd`, `isub` | rhs converted into self's unit; an untagged self adopts rhs's unit |
| `*=`, `/=` | `imul`, `itruediv` | product / quotient |
| `//=`, `%=` | `ifloordiv`, `imod` | unchanged |
| `**=` | `ipow` | exact exponents raise the unit, others clear it |
| `<<=`, `>>=`, `&=`, `\|=`, `^=`, `~` | `ilshift`, `irshift`, `iand`, `ior`, `ixor`, `invert` | unchanged |
*/

use std::ops::{
    AddAssign, BitAndAssign, BitOrAssign, BitXorAssign, DivAssign, Mul, MulAssign, RemAssign, SubAssign,
};

use rayon::prelude::*;
use simunits::Unit;

use super::arith::{safe_div, safe_rem};
use super::container::NumericContainer;
use super::SimArray;
use crate::error::{ArrayError, Result};
use crate::math::{IntScalar, Scalar};
use crate::ufunc::{ops, resolve_units, Number, Operand};

impl<T: Scalar> SimArray<T> {
    /// Notify, then overwrite with `values` (logical order).
    fn commit(&self, op: &'static str, values: &[T]) {
        self.notify_dirty(op);
        self.write_values(values);
    }

    /// `self[i] = f(self[i], rhs[i])` with `rhs` broadcast to this shape.
    fn assign_with<F>(&mut self, op: &'static str, rhs: &SimArray<T>, f: F) -> Result<()>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        let b = rhs.values_as(self.shape())?;
        let next: Vec<T> = self
            .to_vec()
            .par_iter()
            .zip(b.par_iter())
            .map(|(&x, &y)| f(x, y))
            .collect();
        self.commit(op, &next);
        Ok(())
    }

    fn map_assign<F>(&mut self, op: &'static str, f: F)
    where
        F: Fn(T) -> T + Send + Sync,
    {
        let next: Vec<T> = self.to_vec().into_par_iter().map(f).collect();
        self.commit(op, &next);
    }

    fn generic_add_assign(&mut self, rhs: &SimArray<T>, subtract: bool) -> Result<()> {
        let op = if subtract { "isub" } else { "iadd" };
        let b = rhs.values_as(self.shape())?;
        let a = self.to_vec();

        let next: Vec<T> = match self.rescale_ratio(rhs)? {
            Some(cr) if cr != 1.0 => a
                .par_iter()
                .zip(b.par_iter())
                .map(|(&x, &y)| {
                    let (x, y) = (x.to_f64_lossy(), y.to_f64_lossy() * cr);
                    let v = if subtract { x - y } else { x + y };
                    T::from_f64(v).ok_or(ArrayError::Cast { value: v })
                })
                .collect::<Result<Vec<T>>>()?,
            _ => a
                .par_iter()
                .zip(b.par_iter())
                .map(|(&x, &y)| if subtract { x - y } else { x + y })
                .collect(),
        };

        self.commit(op, &next);
        if !self.has_units() {
            self.set_units_opt(rhs.units_opt());
        }
        Ok(())
    }

    /// `self += rhs`, converting `rhs` into this array's units.
    pub fn checked_add_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.generic_add_assign(&rhs.as_array(), false)
    }

    /// `self -= rhs`, converting `rhs` into this array's units.
    pub fn checked_sub_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.generic_add_assign(&rhs.as_array(), true)
    }

    /// `self *= rhs`; the unit becomes the product.
    pub fn checked_mul_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        let rhs = rhs.as_array();
        self.assign_with("imul", &rhs, |x, y| x * y)?;
        let operands = [Operand::Array(self.units_opt()), Operand::Array(rhs.units_opt())];
        if let Some(u) = resolve_units(ops::MULTIPLY, &operands) {
            self.set_units_opt(Some(u));
        }
        Ok(())
    }

    /// `self /= rhs`; the unit becomes the quotient.
    pub fn checked_div_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        let rhs = rhs.as_array();
        self.assign_with("itruediv", &rhs, safe_div)?;
        let operands = [Operand::Array(self.units_opt()), Operand::Array(rhs.units_opt())];
        if let Some(u) = resolve_units(ops::DIVIDE, &operands) {
            self.set_units_opt(Some(u));
        }
        Ok(())
    }

    /// `self //= rhs` (floor division).
    pub fn checked_floor_div_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("ifloordiv", &rhs.as_array(), |x, y| {
            if T::INTEGER && y.is_zero() {
                T::zero()
            } else {
                x.floor_div(y)
            }
        })
    }

    /// `self %= rhs`.
    pub fn checked_rem_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("imod", &rhs.as_array(), safe_rem)
    }

    /// `self **= exponent`. Integer and rational exponents raise the unit;
    /// any other exponent clears it.
    pub fn pow_assign(&mut self, exponent: impl Into<Number>) {
        let n = exponent.into();
        let e = n.as_f64();
        self.map_assign("ipow", |x| x.powf_real(e));
        let operands = [Operand::Array(self.units_opt()), Operand::Number(n)];
        self.set_units_opt(resolve_units(ops::POWER, &operands));
    }

    pub fn add_assign_scalar(&mut self, v: T) {
        self.map_assign("iadd", move |x| x + v);
    }

    pub fn sub_assign_scalar(&mut self, v: T) {
        self.map_assign("isub", move |x| x - v);
    }

    pub fn mul_assign_scalar(&mut self, v: T) {
        self.map_assign("imul", move |x| x * v);
    }

    pub fn div_assign_scalar(&mut self, v: T) {
        self.map_assign("itruediv", move |x| safe_div(x, v));
    }
}

#[inline]
fn shift_amount<T: IntScalar>(y: T) -> u32 {
    let bits = (std::mem::size_of::<T>() * 8) as u64;
    (y.to_u64().unwrap_or(0) % bits) as u32
}

impl<T: IntScalar> SimArray<T> {
    /// `self <<= rhs`; shift amounts wrap at the element width.
    pub fn checked_shl_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("ilshift", &rhs.as_array(), |x, y| x << shift_amount(y))
    }

    /// `self >>= rhs`; shift amounts wrap at the element width.
    pub fn checked_shr_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("irshift", &rhs.as_array(), |x, y| x >> shift_amount(y))
    }

    pub fn checked_bitand_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("iand", &rhs.as_array(), |x, y| x & y)
    }

    pub fn checked_bitor_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("ior", &rhs.as_array(), |x, y| x | y)
    }

    pub fn checked_bitxor_assign<R: NumericContainer<T> + ?Sized>(&mut self, rhs: &R) -> Result<()> {
        self.assign_with("ixor", &rhs.as_array(), |x, y| x ^ y)
    }

    /// Bitwise NOT of every element, in place.
    pub fn invert_assign(&mut self) {
        self.map_assign("invert", |x| !x);
    }
}

//===================================================================
// ------------------------- Operator Traits ------------------------
//===================================================================

macro_rules! impl_assign_op {
    ($bound:ident, $trait:ident, $method:ident, $checked:ident) => {
        impl<T: $bound> $trait<&SimArray<T>> for SimArray<T> {
            /// Panics on incompatible units or shapes; use the `checked_*` form to recover.
            #[inline]
            fn $method(&mut self, rhs: &SimArray<T>) {
                self.$checked(rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }
    };
}

impl_assign_op!(Scalar, AddAssign, add_assign, checked_add_assign);
impl_assign_op!(Scalar, SubAssign, sub_assign, checked_sub_assign);
impl_assign_op!(Scalar, MulAssign, mul_assign, checked_mul_assign);
impl_assign_op!(Scalar, DivAssign, div_assign, checked_div_assign);
impl_assign_op!(Scalar, RemAssign, rem_assign, checked_rem_assign);
impl_assign_op!(IntScalar, BitAndAssign, bitand_assign, checked_bitand_assign);
impl_assign_op!(IntScalar, BitOrAssign, bitor_assign, checked_bitor_assign);
impl_assign_op!(IntScalar, BitXorAssign, bitxor_assign, checked_bitxor_assign);

// ------------------------- Unit operands ---------------------------

impl<T: Scalar> Mul<&Unit> for &SimArray<T> {
    type Output = SimArray<T>;

    #[inline]
    fn mul(self, unit: &Unit) -> SimArray<T> {
        self.mul_unit(unit)
    }
}

impl<T: Scalar> std::ops::Div<&Unit> for &SimArray<T> {
    type Output = SimArray<T>;

    #[inline]
    fn div(self, unit: &Unit) -> SimArray<T> {
        self.div_unit(unit)
    }
}

impl<T: Scalar> MulAssign<&Unit> for SimArray<T> {
    #[inline]
    fn mul_assign(&mut self, unit: &Unit) {
        self.mul_assign_unit(unit);
    }
}

impl<T: Scalar> DivAssign<&Unit> for SimArray<T> {
    #[inline]
    fn div_assign(&mut self, unit: &Unit) {
        self.div_assign_unit(unit);
    }
}
