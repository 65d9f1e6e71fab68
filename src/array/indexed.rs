// src/array/indexed.rs
/*!
**Indexed views**: non-copying projections over the leading axis of an array.

`IndexedView` stores a handle to its base array plus an [`IndexSpec`] (a range
or an explicit list of positions). Row `i` of the view *is* row `spec.at(i)` of
the base:

- `get` / `set` / `assign` translate the index and act on the base storage
  directly, so writes are visible through the base and every other view;
- re-indexing (`index`) composes the two specs, so chains of views collapse to
  a single translation step;
- unit accessors, `convert_units` and `write` delegate to the base;
- anything else goes through [`realize`](IndexedView::realize), which copies
  the selected rows into a standalone array.

Trailing axes pass through unchanged.
*/

use std::borrow::Cow;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use simunits::{ConversionContext, IntoUnit, Unit};

use super::compare::BoolArray;
use super::container::NumericContainer;
use super::SimArray;
use crate::context::{Family, SimContext};
use crate::error::{ArrayError, Result};
use crate::math::{Scalar, SliceRange};

//===================================================================
// ---------------------------- IndexSpec ---------------------------
//===================================================================

/// Positions selected along the leading axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexSpec {
    Range(SliceRange),
    Positions(Vec<usize>),
}

impl IndexSpec {
    /// `start..stop`.
    pub fn range(start: usize, stop: usize) -> Self {
        IndexSpec::Range(SliceRange::range(start, stop))
    }

    /// `start:stop:step`.
    pub fn stepped(start: usize, stop: usize, step: usize) -> Self {
        IndexSpec::Range(SliceRange::new(start, stop, step))
    }

    pub fn positions(positions: Vec<usize>) -> Self {
        IndexSpec::Positions(positions)
    }

    /// Positions where `mask` is true (a one-dimensional mask).
    pub fn from_mask(mask: &BoolArray) -> Result<Self> {
        if mask.shape().len() != 1 {
            return Err(ArrayError::InvalidShape {
                shape: mask.shape().to_vec(),
                reason: "a mask must be one-dimensional",
            });
        }
        Ok(IndexSpec::Positions(
            mask.as_slice()
                .iter()
                .enumerate()
                .filter_map(|(i, &b)| b.then_some(i))
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        match self {
            IndexSpec::Range(r) => r.len(),
            IndexSpec::Positions(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The base position of entry `i` (caller guarantees `i < len`).
    #[inline]
    pub fn at(&self, i: usize) -> usize {
        match self {
            IndexSpec::Range(r) => r.at(i),
            IndexSpec::Positions(p) => p[i],
        }
    }

    /// Fail unless every position is below `extent`.
    pub fn check(&self, extent: usize) -> Result<()> {
        let out_of_bounds = match self {
            IndexSpec::Range(r) => r.step == 0 || (!r.is_empty() && r.at(r.len() - 1) >= extent),
            IndexSpec::Positions(p) => p.iter().any(|&i| i >= extent),
        };
        if out_of_bounds {
            return Err(ArrayError::IndexOutOfBounds {
                index: self.iter().collect(),
                shape: vec![extent],
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).map(move |i| self.at(i))
    }

    /// `self` followed by `sub`: entry `i` of the result is `self.at(sub.at(i))`.
    pub fn compose(&self, sub: &IndexSpec) -> Result<IndexSpec> {
        sub.check(self.len())?;
        Ok(match (self, sub) {
            (IndexSpec::Range(a), IndexSpec::Range(b)) => {
                let start = a.at(b.start);
                let step = a.step * b.step;
                let n = b.len();
                let stop = if n == 0 { start } else { start + (n - 1) * step + 1 };
                IndexSpec::Range(SliceRange::new(start, stop, step))
            }
            _ => IndexSpec::Positions(sub.iter().map(|i| self.at(i)).collect()),
        })
    }
}

//===================================================================
// --------------------------- IndexedView --------------------------
//===================================================================

/// A write-through view selecting rows of a base [`SimArray`].
pub struct IndexedView<T: Scalar> {
    base: SimArray<T>,
    index: IndexSpec,
}

impl<T: Scalar> SimArray<T> {
    /// Select rows along the leading axis without copying.
    pub fn index(&self, index: IndexSpec) -> Result<IndexedView<T>> {
        let Some(&extent) = self.shape().first() else {
            return Err(ArrayError::InvalidShape {
                shape: Vec::new(),
                reason: "cannot index a 0-d array",
            });
        };
        index.check(extent)?;
        Ok(IndexedView {
            base: self.view(),
            index,
        })
    }

    /// Rows where `mask` is true.
    pub fn mask(&self, mask: &BoolArray) -> Result<IndexedView<T>> {
        if mask.shape().first() != self.shape().first() {
            return Err(ArrayError::ShapeMismatch {
                lhs: self.shape().to_vec(),
                rhs: mask.shape().to_vec(),
            });
        }
        self.index(IndexSpec::from_mask(mask)?)
    }

    /// Copy of the rows selected by `index`.
    pub fn take(&self, index: &IndexSpec) -> Result<SimArray<T>> {
        let mut shape = self.shape().to_vec();
        let Some(&extent) = shape.first() else {
            return Err(ArrayError::InvalidShape {
                shape,
                reason: "cannot index a 0-d array",
            });
        };
        index.check(extent)?;
        let row: usize = shape[1..].iter().product();
        let values = self.to_vec();
        let data = (0..index.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let r = index.at(i);
                values[r * row..(r + 1) * row].iter().copied()
            })
            .collect();
        shape[0] = index.len();
        Ok(self.derive(shape, data, self.units_opt()))
    }

    /// Item assignment: write `values` into the rows selected by `index`.
    ///
    /// When both sides carry units, `values` is converted into this array's
    /// units first. `values` must broadcast to the selected rows' shape.
    pub fn assign<R: NumericContainer<T> + ?Sized>(&mut self, index: &IndexSpec, values: &R) -> Result<()> {
        let Some(&extent) = self.shape().first() else {
            return Err(ArrayError::InvalidShape {
                shape: Vec::new(),
                reason: "cannot index a 0-d array",
            });
        };
        index.check(extent)?;

        let values = values.as_array();
        let values = match (self.units_opt(), values.has_units()) {
            (Some(u), true) => Cow::Owned(values.in_units(u)?),
            _ => values,
        };
        let mut target = self.shape().to_vec();
        target[0] = index.len();
        let src = values.values_as(&target)?;

        self.notify_dirty("setitem");
        let row: usize = target[1..].iter().product();
        let mut buf = self.storage.borrow_mut();
        for i in 0..index.len() {
            let r = index.at(i);
            for c in 0..row {
                let off = self.layout.offset_of_linear(r * row + c);
                buf[off] = src[i * row + c];
            }
        }
        Ok(())
    }
}

impl<T: Scalar> IndexedView<T> {
    /// The array this view reads from and writes to.
    #[inline]
    pub fn base(&self) -> &SimArray<T> {
        &self.base
    }

    #[inline]
    pub fn index_spec(&self) -> &IndexSpec {
        &self.index
    }

    /// Number of selected rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.base.shape().to_vec();
        shape[0] = self.index.len();
        shape
    }

    fn translate(&self, index: &[usize]) -> Result<Vec<usize>> {
        match index.split_first() {
            Some((&i, rest)) if i < self.index.len() => {
                let mut out = Vec::with_capacity(index.len());
                out.push(self.index.at(i));
                out.extend_from_slice(rest);
                Ok(out)
            }
            _ => Err(ArrayError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape(),
            }),
        }
    }

    /// Read through to the base.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        self.base.get(&self.translate(index)?)
    }

    /// Write through to the base.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        let index = self.translate(index)?;
        self.base.set(&index, value)
    }

    /// A view of this view, collapsed onto the base.
    pub fn index(&self, sub: IndexSpec) -> Result<IndexedView<T>> {
        Ok(IndexedView {
            base: self.base.view(),
            index: self.index.compose(&sub)?,
        })
    }

    /// Write `values` into rows `sub` of this view (rows of the base, translated).
    pub fn assign<R: NumericContainer<T> + ?Sized>(&mut self, sub: &IndexSpec, values: &R) -> Result<()> {
        let composed = self.index.compose(sub)?;
        self.base.assign(&composed, values)
    }

    /// Write `values` into every selected row.
    pub fn assign_all<R: NumericContainer<T> + ?Sized>(&mut self, values: &R) -> Result<()> {
        let index = self.index.clone();
        self.base.assign(&index, values)
    }

    /// Standalone copy of the selected rows, carrying units, context and family.
    pub fn realize(&self) -> SimArray<T> {
        let shape = self.shape();
        let row: usize = shape[1..].iter().product();
        let values = self.base.to_vec();
        let index = &self.index;
        let data = (0..index.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let r = index.at(i);
                values[r * row..(r + 1) * row].iter().copied()
            })
            .collect();
        self.base.derive(shape, data, self.base.units_opt())
    }

    /// Realize, apply `f` to the copy, then write the copy back (one notification).
    pub fn modify<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut SimArray<T>) -> Result<()>,
    {
        let mut copy = self.realize();
        f(&mut copy)?;
        self.assign_all(&copy)
    }

    // ------------------------------ Delegation --------------------------------

    pub fn units(&self) -> Unit {
        self.base.units()
    }

    pub fn has_units(&self) -> bool {
        self.base.has_units()
    }

    /// Retags the base, and with it every view of the base.
    pub fn set_units(&self, units: impl IntoUnit) -> Result<()> {
        self.base.set_units(units)
    }

    pub fn conversion_context(&self) -> ConversionContext {
        self.base.conversion_context()
    }

    /// Converts the whole base in place.
    pub fn convert_units(&mut self, target: impl IntoUnit) -> Result<()> {
        self.base.convert_units(target)
    }

    /// Copy of the selected rows expressed in `target`.
    pub fn in_units(&self, target: impl IntoUnit) -> Result<SimArray<T>> {
        self.realize().in_units(target)
    }

    pub fn set_units_like(&self, unit: impl IntoUnit) -> Result<()> {
        self.base.set_units_like(unit)
    }

    pub fn name(&self) -> Option<String> {
        self.base.name()
    }

    pub fn family(&self) -> Option<&Family> {
        self.base.family()
    }

    pub fn context(&self) -> Option<std::rc::Rc<dyn SimContext>> {
        self.base.context()
    }

    pub fn derived(&self) -> bool {
        self.base.derived()
    }

    /// The basemost array.
    pub fn ancestor(&self) -> SimArray<T> {
        self.base.ancestor()
    }

    pub fn write(&self) -> Result<()> {
        self.base.write()
    }
}

impl<T: Scalar> NumericContainer<T> for IndexedView<T> {
    #[inline]
    fn shape(&self) -> Vec<usize> {
        IndexedView::shape(self)
    }

    #[inline]
    fn get(&self, index: &[usize]) -> Result<T> {
        IndexedView::get(self, index)
    }

    #[inline]
    fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        IndexedView::set(self, index, value)
    }

    #[inline]
    fn units(&self) -> Unit {
        IndexedView::units(self)
    }

    #[inline]
    fn has_units(&self) -> bool {
        IndexedView::has_units(self)
    }

    #[inline]
    fn set_units<U: IntoUnit>(&self, units: U) -> Result<()> {
        IndexedView::set_units(self, units)
    }

    #[inline]
    fn conversion_context(&self) -> ConversionContext {
        IndexedView::conversion_context(self)
    }

    #[inline]
    fn convert_units<U: IntoUnit>(&mut self, target: U) -> Result<()> {
        IndexedView::convert_units(self, target)
    }

    fn in_units<U: IntoUnit>(&self, target: U) -> Result<SimArray<T>> {
        IndexedView::in_units(self, target)
    }

    fn as_array(&self) -> Cow<'_, SimArray<T>> {
        Cow::Owned(self.realize())
    }
}

impl<T: Scalar> fmt::Display for IndexedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.realize(), f)
    }
}

impl<T: Scalar> fmt::Debug for IndexedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedView")
            .field("index", &self.index)
            .field("base", &self.base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_after_range() {
        let outer = IndexSpec::stepped(2, 12, 3);
        let inner = outer.compose(&IndexSpec::positions(vec![2, 0])).unwrap();
        assert_eq!(inner, IndexSpec::positions(vec![8, 2]));
    }

    #[test]
    fn range_after_range_keeps_the_stride() {
        let outer = IndexSpec::stepped(1, 10, 2);
        let inner = outer.compose(&IndexSpec::stepped(1, 5, 2)).unwrap();
        assert_eq!(inner.iter().collect::<Vec<_>>(), vec![3, 7]);
        assert!(matches!(inner, IndexSpec::Range(_)));
    }

    #[test]
    fn compose_rejects_positions_past_the_outer_length() {
        let outer = IndexSpec::range(0, 3);
        assert!(outer.compose(&IndexSpec::positions(vec![3])).is_err());
    }

    #[test]
    fn masks_become_positions() {
        let mask = BoolArray::from(vec![true, false, true]);
        assert_eq!(IndexSpec::from_mask(&mask).unwrap(), IndexSpec::positions(vec![0, 2]));
    }
}
