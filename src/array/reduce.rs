// src/array/reduce.rs
/*!
Reductions. Every reduction keeps the input's unit tag and context, except:
- `var` squares the unit;
- `prod` along an axis raises the unit to that axis's extent, while `prod` over
  the whole array leaves the unit unchanged.

`axis = None` reduces everything to a 0-d array. `mean`, `var` and `std` are
accumulated in `f64` and cast back to the element type.
*/

use rayon::prelude::*;

use super::SimArray;
use crate::error::{ArrayError, Result};
use crate::math::Scalar;

fn mean_f64<T: Scalar>(lane: &[T]) -> Result<f64> {
    if lane.is_empty() {
        return Err(ArrayError::EmptyReduction);
    }
    Ok(lane.iter().map(|x| x.to_f64_lossy()).sum::<f64>() / lane.len() as f64)
}

fn var_f64<T: Scalar>(lane: &[T]) -> Result<f64> {
    let m = mean_f64(lane)?;
    Ok(lane
        .iter()
        .map(|x| {
            let d = x.to_f64_lossy() - m;
            d * d
        })
        .sum::<f64>()
        / lane.len() as f64)
}

#[inline]
fn narrow<T: Scalar>(v: f64) -> Result<T> {
    T::from_f64(v).ok_or(ArrayError::Cast { value: v })
}

fn lane_min<T: Scalar>(lane: &[T]) -> Result<T> {
    lane.iter()
        .copied()
        .reduce(|a, b| if b < a { b } else { a })
        .ok_or(ArrayError::EmptyReduction)
}

fn lane_max<T: Scalar>(lane: &[T]) -> Result<T> {
    lane.iter()
        .copied()
        .reduce(|a, b| if b > a { b } else { a })
        .ok_or(ArrayError::EmptyReduction)
}

impl<T: Scalar> SimArray<T> {
    fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.ndim() {
            return Err(ArrayError::AxisOutOfBounds {
                axis,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }

    /// Apply `f` to every lane along `axis` (or to all elements), returning the
    /// reduced shape and one value per lane.
    fn reduce_lanes<F>(&self, axis: Option<usize>, f: F) -> Result<(Vec<usize>, Vec<T>)>
    where
        F: Fn(&[T]) -> Result<T> + Send + Sync,
    {
        let values = self.to_vec();
        let Some(ax) = axis else {
            return Ok((Vec::new(), vec![f(&values)?]));
        };
        self.check_axis(ax)?;

        let shape = self.shape();
        let n = shape[ax];
        let outer: usize = shape[..ax].iter().product();
        let inner: usize = shape[ax + 1..].iter().product();
        let mut out_shape = shape.to_vec();
        out_shape.remove(ax);

        let out = (0..outer * inner)
            .into_par_iter()
            .map(|k| {
                let (o, i) = (k / inner, k % inner);
                let lane: Vec<T> = (0..n).map(|j| values[(o * n + j) * inner + i]).collect();
                f(&lane)
            })
            .collect::<Result<Vec<T>>>()?;
        Ok((out_shape, out))
    }

    fn reduced(&self, axis: Option<usize>, f: impl Fn(&[T]) -> Result<T> + Send + Sync) -> Result<SimArray<T>> {
        let (shape, data) = self.reduce_lanes(axis, f)?;
        Ok(self.derive(shape, data, self.units_opt()))
    }

    pub fn sum(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        self.reduced(axis, |lane| Ok(lane.iter().copied().sum()))
    }

    pub fn mean(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        self.reduced(axis, |lane| narrow(mean_f64(lane)?))
    }

    pub fn min(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        self.reduced(axis, lane_min)
    }

    pub fn max(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        self.reduced(axis, lane_max)
    }

    /// Peak to peak, `max - min`.
    pub fn ptp(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        self.reduced(axis, |lane| Ok(lane_max(lane)? - lane_min(lane)?))
    }

    /// Standard deviation (population, `ddof = 0`).
    pub fn std(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        self.reduced(axis, |lane| narrow(var_f64(lane)?.sqrt()))
    }

    /// Variance (population, `ddof = 0`); the unit is squared.
    pub fn var(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        let (shape, data) = self.reduce_lanes(axis, |lane| narrow(var_f64(lane)?))?;
        let units = self.units_opt().map(|u| u.pow(2));
        Ok(self.derive(shape, data, units))
    }

    /// Product. Along an axis the unit is raised to that axis's extent; over the
    /// whole array the unit is left unchanged.
    pub fn prod(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        let (shape, data) = self.reduce_lanes(axis, |lane| Ok(lane.iter().copied().product()))?;
        let units = match axis {
            Some(ax) => {
                let extent = i32::try_from(self.shape()[ax]).map_err(|_| ArrayError::InvalidShape {
                    shape: self.shape().to_vec(),
                    reason: "axis too long to raise a unit to its extent",
                })?;
                self.units_opt().map(|u| u.pow(extent))
            }
            None => self.units_opt(),
        };
        Ok(self.derive(shape, data, units))
    }

    /// Running sum. `None` flattens first; `Some(axis)` keeps the shape.
    pub fn cumsum(&self, axis: Option<usize>) -> Result<SimArray<T>> {
        let values = self.to_vec();
        let Some(ax) = axis else {
            let data = values
                .iter()
                .scan(T::zero(), |acc, &x| {
                    *acc = *acc + x;
                    Some(*acc)
                })
                .collect();
            return Ok(self.derive(vec![values.len()], data, self.units_opt()));
        };
        self.check_axis(ax)?;

        let shape = self.shape().to_vec();
        let n = shape[ax];
        let inner: usize = shape[ax + 1..].iter().product();
        let outer: usize = shape[..ax].iter().product();
        let mut data = values.clone();
        for o in 0..outer {
            for i in 0..inner {
                let mut acc = T::zero();
                for j in 0..n {
                    let k = (o * n + j) * inner + i;
                    acc = acc + values[k];
                    data[k] = acc;
                }
            }
        }
        Ok(self.derive(shape, data, self.units_opt()))
    }
}
