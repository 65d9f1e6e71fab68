// src/array/container.rs
/*!
A **unified numeric-container trait** shared by [`SimArray`] and [`IndexedView`](super::IndexedView).

Generic code (and every binary operation's right-hand side) accepts any
`NumericContainer<T>`, so an indexed view can be added to, compared with or
assigned from exactly like an array.

Key points
- Element access (`get`/`set`) and the unit accessors are required: a view must
  implement them without copying, forwarding to its base.
- `as_array` is the single materialization point. An array lends itself; a view
  realizes a copy of the positions it selects.
- Everything else (arithmetic, reductions, comparisons, `in_units`) is provided
  on top of `as_array`.
*/

use std::borrow::Cow;

use simunits::{ConversionContext, IntoUnit, Unit};

use super::compare::{BoolArray, CmpOp};
use super::SimArray;
use crate::error::Result;
use crate::math::Scalar;
use crate::ufunc::Number;

pub trait NumericContainer<T: Scalar> {
    /// Shape vector.
    fn shape(&self) -> Vec<usize>;

    // ------------------------ Element Access ------------------------

    /// Bounds-checked read, no copy.
    fn get(&self, index: &[usize]) -> Result<T>;

    /// Bounds-checked write, visible through every alias of the storage.
    fn set(&mut self, index: &[usize], value: T) -> Result<()>;

    // ------------------------ Units ---------------------------------

    fn units(&self) -> Unit;

    fn has_units(&self) -> bool;

    /// Retag without touching values.
    fn set_units<U: IntoUnit>(&self, units: U) -> Result<()>;

    fn conversion_context(&self) -> ConversionContext;

    /// Convert the backing storage in place.
    fn convert_units<U: IntoUnit>(&mut self, target: U) -> Result<()>;

    // ------------------------ Materialization -----------------------

    /// This container as a standalone array (borrowed when possible).
    fn as_array(&self) -> Cow<'_, SimArray<T>>;

    // ------------------------ Provided ------------------------------

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Owned copy.
    fn to_array(&self) -> SimArray<T> {
        self.as_array().into_owned()
    }

    fn in_units<U: IntoUnit>(&self, target: U) -> Result<SimArray<T>> {
        SimArray::in_units(&self.as_array(), target)
    }

    fn checked_add<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        SimArray::generic_add(&self.as_array(), &rhs.as_array(), false)
    }

    fn checked_sub<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        SimArray::generic_add(&self.as_array(), &rhs.as_array(), true)
    }

    fn checked_mul<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        SimArray::checked_mul(&self.as_array(), rhs)
    }

    fn checked_div<R: NumericContainer<T> + ?Sized>(&self, rhs: &R) -> Result<SimArray<T>> {
        SimArray::checked_div(&self.as_array(), rhs)
    }

    fn pow<N: Into<Number>>(&self, exponent: N) -> SimArray<T> {
        SimArray::pow(&self.as_array(), exponent)
    }

    fn compare<R: NumericContainer<T> + ?Sized>(&self, rhs: &R, op: CmpOp) -> Result<BoolArray> {
        SimArray::compare(&self.as_array(), rhs, op)
    }

    fn sum(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::sum(&self.as_array(), axis)
    }

    fn mean(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::mean(&self.as_array(), axis)
    }

    fn min(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::min(&self.as_array(), axis)
    }

    fn max(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::max(&self.as_array(), axis)
    }

    fn ptp(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::ptp(&self.as_array(), axis)
    }

    fn std(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::std(&self.as_array(), axis)
    }

    fn var(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::var(&self.as_array(), axis)
    }

    fn prod(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::prod(&self.as_array(), axis)
    }

    fn cumsum(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        SimArray::cumsum(&self.as_array(), axis)
    }

    fn abs(&self) -> SimArray<T> {
        SimArray::abs(&self.as_array())
    }
}

//===================================================================
// ---------------------------- SimArray ----------------------------
//===================================================================

impl<T: Scalar> NumericContainer<T> for SimArray<T> {
    #[inline]
    fn shape(&self) -> Vec<usize> {
        SimArray::shape(self).to_vec()
    }

    #[inline]
    fn get(&self, index: &[usize]) -> Result<T> {
        SimArray::get(self, index)
    }

    #[inline]
    fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        SimArray::set(self, index, value)
    }

    #[inline]
    fn units(&self) -> Unit {
        SimArray::units(self)
    }

    #[inline]
    fn has_units(&self) -> bool {
        SimArray::has_units(self)
    }

    #[inline]
    fn set_units<U: IntoUnit>(&self, units: U) -> Result<()> {
        SimArray::set_units(self, units)
    }

    #[inline]
    fn conversion_context(&self) -> ConversionContext {
        SimArray::conversion_context(self)
    }

    #[inline]
    fn convert_units<U: IntoUnit>(&mut self, target: U) -> Result<()> {
        SimArray::convert_units(self, target)
    }

    #[inline]
    fn as_array(&self) -> Cow<'_, SimArray<T>> {
        Cow::Borrowed(self)
    }
}
