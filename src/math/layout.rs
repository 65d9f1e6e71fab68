// src/math/layout.rs
/*!
Row-major **strided layout** over a flat buffer.

A `Layout` maps a logical multi-index onto a storage offset:

`offset + Σ index[ax] * strides[ax]`

Aliasing views (reshape, transpose, per-axis slicing, broadcasting) are nothing
more than a new `Layout` over the same buffer, so they never copy.

# Semantics
- Logical iteration order is always row-major (C order) over `shape`, regardless of strides.
- Broadcast axes carry stride `0`.
- Bounds are checked on multi-index access; linear access (`offset_of_linear`) assumes `k < numel`.
*/

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ArrayError, Result};

//===================================================================
// ------------------------- Slice Ranges ---------------------------
//===================================================================

/// `start:stop:step` along one axis (`step > 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl SliceRange {
    #[inline]
    pub fn new(start: usize, stop: usize, step: usize) -> Self {
        Self { start, stop, step }
    }

    /// `start..stop` with step 1.
    #[inline]
    pub fn range(start: usize, stop: usize) -> Self {
        Self::new(start, stop, 1)
    }

    /// The full extent of an axis of length `len`.
    #[inline]
    pub fn full(len: usize) -> Self {
        Self::new(0, len, 1)
    }

    /// Number of positions selected.
    #[inline]
    pub fn len(&self) -> usize {
        if self.stop <= self.start || self.step == 0 {
            0
        } else {
            (self.stop - self.start).div_ceil(self.step)
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`-th selected position.
    #[inline]
    pub fn at(&self, i: usize) -> usize {
        self.start + i * self.step
    }
}

//===================================================================
// ---------------------------- Layout ------------------------------
//===================================================================

/// Shape, strides (in elements) and starting offset of a view into a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
}

impl Layout {
    /// Dense row-major layout starting at offset 0.
    pub fn contiguous(shape: Vec<usize>) -> Self {
        let strides = compute_strides(&shape);
        Self { shape, strides, offset: 0 }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// True if logical order equals storage order from `offset` on.
    /// Axes of extent 1 may carry any stride.
    pub fn is_contiguous(&self) -> bool {
        let dense = compute_strides(&self.shape);
        self.shape
            .iter()
            .zip(self.strides.iter().zip(dense.iter()))
            .all(|(&d, (&s, &e))| d <= 1 || s == e)
    }

    /// Storage offset of a bounds-checked multi-index.
    pub fn offset_of(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.ndim() || index.iter().zip(&self.shape).any(|(&i, &d)| i >= d) {
            return Err(ArrayError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(self.offset
            + index
                .iter()
                .zip(&self.strides)
                .map(|(&i, &s)| i * s)
                .sum::<usize>())
    }

    /// Storage offset of the `k`-th element in logical row-major order.
    #[inline(always)]
    pub fn offset_of_linear(&self, k: usize) -> usize {
        let mut rem = k;
        let mut off = self.offset;
        for ax in (0..self.shape.len()).rev() {
            let d = self.shape[ax];
            off += (rem % d) * self.strides[ax];
            rem /= d;
        }
        off
    }

    /// All storage offsets in logical order (parallel).
    pub fn offsets(&self) -> Vec<usize> {
        if self.is_contiguous() {
            return (self.offset..self.offset + self.numel()).collect();
        }
        (0..self.numel())
            .into_par_iter()
            .map(|k| self.offset_of_linear(k))
            .collect()
    }

    // ------------------------------ Views ------------------------------

    /// Same elements under a new shape. Requires a contiguous layout.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<Layout> {
        if shape.iter().product::<usize>() != self.numel() {
            return Err(ArrayError::InvalidShape {
                shape,
                reason: "element count does not match",
            });
        }
        if !self.is_contiguous() {
            return Err(ArrayError::NotContiguous);
        }
        Ok(Layout {
            strides: compute_strides(&shape),
            shape,
            offset: self.offset,
        })
    }

    /// Reorder axes: output axis `i` is input axis `axes[i]`.
    pub fn permute(&self, axes: &[usize]) -> Result<Layout> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        for &ax in axes {
            if ax >= ndim {
                return Err(ArrayError::AxisOutOfBounds { axis: ax, ndim });
            }
            seen[ax] = true;
        }
        if axes.len() != ndim || seen.iter().any(|s| !s) {
            return Err(ArrayError::InvalidShape {
                shape: self.shape.clone(),
                reason: "axes must be a permutation of the array's axes",
            });
        }
        Ok(Layout {
            shape: axes.iter().map(|&a| self.shape[a]).collect(),
            strides: axes.iter().map(|&a| self.strides[a]).collect(),
            offset: self.offset,
        })
    }

    /// Reverse all axes.
    pub fn transpose(&self) -> Layout {
        Layout {
            shape: self.shape.iter().rev().copied().collect(),
            strides: self.strides.iter().rev().copied().collect(),
            offset: self.offset,
        }
    }

    /// Per-axis `start:stop:step` slicing; `ranges.len()` may be shorter than `ndim`
    /// (trailing axes pass through unchanged).
    pub fn slice(&self, ranges: &[SliceRange]) -> Result<Layout> {
        if ranges.len() > self.ndim() {
            return Err(ArrayError::InvalidShape {
                shape: self.shape.clone(),
                reason: "more slice ranges than axes",
            });
        }
        let mut out = self.clone();
        for (ax, r) in ranges.iter().enumerate() {
            if r.step == 0 || r.stop > self.shape[ax] || r.start > r.stop {
                return Err(ArrayError::IndexOutOfBounds {
                    index: vec![r.start, r.stop],
                    shape: self.shape.clone(),
                });
            }
            let len = r.len();
            if len > 0 {
                out.offset += r.start * self.strides[ax];
            }
            out.shape[ax] = len;
            out.strides[ax] = self.strides[ax] * r.step;
        }
        Ok(out)
    }

    /// Fix `axis` at `index`, dropping that axis.
    pub fn select(&self, axis: usize, index: usize) -> Result<Layout> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(ArrayError::AxisOutOfBounds { axis, ndim });
        }
        if index >= self.shape[axis] {
            return Err(ArrayError::IndexOutOfBounds {
                index: vec![index],
                shape: self.shape.clone(),
            });
        }
        let mut out = self.clone();
        out.offset += index * self.strides[axis];
        out.shape.remove(axis);
        out.strides.remove(axis);
        Ok(out)
    }

    /// View this layout under a broadcast `shape` (numpy trailing-axis rule).
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Layout> {
        let mismatch = || ArrayError::ShapeMismatch {
            lhs: self.shape.clone(),
            rhs: shape.to_vec(),
        };
        if shape.len() < self.ndim() {
            return Err(mismatch());
        }
        let lead = shape.len() - self.ndim();
        let mut strides = vec![0usize; shape.len()];
        for (ax, &target) in shape.iter().enumerate().skip(lead) {
            let own = self.shape[ax - lead];
            if own == target {
                strides[ax] = self.strides[ax - lead];
            } else if own != 1 {
                return Err(mismatch());
            }
        }
        Ok(Layout {
            shape: shape.to_vec(),
            strides,
            offset: self.offset,
        })
    }
}

//===================================================================
// -------------------------- Utilities -----------------------------
//===================================================================

/// Row-major (C-order) strides for `shape`.
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let ndim = shape.len();
    if ndim == 0 {
        return vec![];
    }
    let mut strides = vec![1usize; ndim];
    for i in (0..ndim - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Common shape of two operands under numpy broadcasting.
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let n = a.len().max(b.len());
    let mut out = vec![0usize; n];
    for i in 0..n {
        let da = if i + a.len() >= n { a[i + a.len() - n] } else { 1 };
        let db = if i + b.len() >= n { b[i + b.len() - n] } else { 1 };
        out[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => {
                return Err(ArrayError::ShapeMismatch {
                    lhs: a.to_vec(),
                    rhs: b.to_vec(),
                })
            }
        };
    }
    Ok(out)
}
