// src/array/units.rs
//! Unit conversion and the context-driven unit helpers.

use rayon::prelude::*;
use simunits::{ConversionContext, IntoUnit, Unit};
use tracing::debug;

use super::SimArray;
use crate::error::{ArrayError, Result};
use crate::math::Scalar;

/// Multiply every value by `ratio` in `f64`, casting back to `T`.
pub(crate) fn scaled<T: Scalar>(values: &[T], ratio: f64) -> Result<Vec<T>> {
    values
        .par_iter()
        .map(|&x| {
            let v = x.to_f64_lossy() * ratio;
            T::from_f64(v).ok_or(ArrayError::Cast { value: v })
        })
        .collect()
}

impl<T: Scalar> SimArray<T> {
    /// Copy of this array expressed in `target`.
    ///
    /// Integer arrays are rescaled in `f64` and truncated back to `T`.
    pub fn in_units(&self, target: impl IntoUnit) -> Result<SimArray<T>> {
        self.in_units_with(target, &ConversionContext::new())
    }

    /// As [`in_units`](Self::in_units), with `overrides` taking precedence over
    /// the owning context's scalars (e.g. `{"a": 0.1}`).
    pub fn in_units_with(&self, target: impl IntoUnit, overrides: &ConversionContext) -> Result<SimArray<T>> {
        let target = target.into_unit()?;
        let Some(current) = self.units_opt() else {
            return Err(ArrayError::UnitsUnknown);
        };
        let mut context = self.conversion_context();
        context.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));

        let ratio = current.ratio(&target, &context)?;
        let data = scaled(&self.to_vec(), ratio)?;
        Ok(self.derive(self.shape().to_vec(), data, Some(target)))
    }

    /// Convert in place. On a view the whole underlying buffer is converted,
    /// since a view cannot hold a scale of its own.
    pub fn convert_units(&mut self, target: impl IntoUnit) -> Result<()> {
        let target = target.into_unit()?;
        let Some(current) = self.units_opt() else {
            return Err(ArrayError::UnitsUnknown);
        };
        let ratio = current.ratio(&target, &self.conversion_context())?;
        debug!(
            array = self.name().as_deref().unwrap_or("<unnamed>"),
            from = %current,
            to = %target,
            ratio,
            "converting units"
        );

        let converted = scaled(&self.storage.borrow(), ratio)?;
        self.notify_dirty("imul");
        self.storage
            .borrow_mut()
            .par_iter_mut()
            .zip(converted.par_iter())
            .for_each(|(d, &v)| *d = v);
        self.set_units_opt(Some(target));
        Ok(())
    }

    /// Tag with the context's guess of `unit` in its native unit scheme
    /// (e.g. `kg m^-3` becomes `Msol kpc^-3`). Values are not converted.
    pub fn set_units_like(&self, unit: impl IntoUnit) -> Result<()> {
        let unit = unit.into_unit()?;
        let ctx = self.context().ok_or(ArrayError::NoContext)?;
        let guessed = ctx.infer_original_units(&unit)?;
        self.set_units_opt(Some(guessed));
        Ok(())
    }

    /// Tag with the context's default units for this array's name.
    /// With `quiet`, a failed guess leaves the units untouched instead of erroring.
    pub fn set_default_units(&self, quiet: bool) -> Result<()> {
        let ctx = self.context().ok_or(ArrayError::NoContext)?;
        let name = self.name().ok_or(ArrayError::NoContext)?;
        match ctx.default_units_for(&name) {
            Ok(u) => {
                self.set_units_opt(Some(u));
                Ok(())
            }
            Err(_) if quiet => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy expressed in the context's native unit scheme.
    pub fn in_original_units(&self) -> Result<SimArray<T>> {
        let ctx = self.context().ok_or(ArrayError::NoContext)?;
        let target = ctx.infer_original_units(&self.units())?;
        self.in_units(target)
    }

    // ------------------------------ Retagging ---------------------------------

    /// Copy with the tag multiplied by `unit`. An untagged array takes `unit` as is.
    pub fn mul_unit(&self, unit: &Unit) -> SimArray<T> {
        let out = self.copy();
        out.set_units_opt(Some(match self.units_opt() {
            Some(u) => &u * unit,
            None => unit.clone(),
        }));
        out
    }

    /// Copy with the tag divided by `unit`. An untagged array becomes `1 / unit`.
    pub fn div_unit(&self, unit: &Unit) -> SimArray<T> {
        let out = self.copy();
        out.set_units_opt(Some(match self.units_opt() {
            Some(u) => &u / unit,
            None => unit.recip(),
        }));
        out
    }

    /// In-place [`mul_unit`](Self::mul_unit).
    pub fn mul_assign_unit(&mut self, unit: &Unit) {
        self.notify_dirty("imul");
        let next = match self.units_opt() {
            Some(u) => &u * unit,
            None => unit.clone(),
        };
        self.set_units_opt(Some(next));
    }

    /// In-place [`div_unit`](Self::div_unit).
    pub fn div_assign_unit(&mut self, unit: &Unit) {
        self.notify_dirty("itruediv");
        let next = match self.units_opt() {
            Some(u) => &u / unit,
            None => unit.recip(),
        };
        self.set_units_opt(Some(next));
    }

    // ------------------------------ Context links -----------------------------

    /// Whether the owning context derived (computed) this array.
    pub fn derived(&self) -> bool {
        match (self.context(), self.name()) {
            (Some(ctx), Some(name)) => ctx.is_derived_array(&name, self.family()),
            _ => false,
        }
    }

    /// Derivation can only be revoked: `false` unlinks, `true` fails.
    pub fn set_derived(&self, value: bool) -> Result<()> {
        if value {
            return Err(ArrayError::DerivationForced);
        }
        if self.derived() {
            if let (Some(ctx), Some(name)) = (self.context(), self.name()) {
                ctx.unlink_array(&name);
            }
        }
        Ok(())
    }

    /// Write through the owning context's backing file.
    pub fn write(&self) -> Result<()> {
        match (self.context(), self.name()) {
            (Some(ctx), Some(name)) => ctx.write_array(&name, self.family()),
            _ => Err(ArrayError::NoContext),
        }
    }
}
