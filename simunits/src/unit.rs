// simunits/src/unit.rs
/*!
The [`Unit`] value type and its algebra.

A unit is either the distinguished [`Unit::NoUnit`] ("nothing is known") or a
[`CompositeUnit`]: a numeric scale times a product of named units raised to exact
rational powers, e.g. `2.86e4 kpc a` or `Msol^2 Mpc^-6`.

- `*`, `/` and [`Unit::pow`] combine composites symbol by symbol, so `kpc / kpc`
  cancels to the exact dimensionless identity.
- [`Unit::ratio`] expands both sides into irreducible units and substitutes any
  contextual symbol (`a`, `h`) found in the conversion context.
- `==` compares the irreducible expansion, so `km` equals `1000 m`; the
  contextual symbols are compared symbolically, never substituted.
*/

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Div, Mul};
use std::str::FromStr;

use num_rational::Ratio;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::UnitsError;
use crate::table::Definition;

/// Exact rational exponent of a unit factor.
pub type Exponent = Ratio<i32>;

/// Named contextual scalars used to resolve ratios, e.g. `{"a": 0.5, "h": 0.7}`.
pub type ConversionContext = BTreeMap<String, f64>;

const EQ_TOLERANCE: f64 = 1e-12;

// ============================================================================
// ------------------------------ Struct Defs ---------------------------------
// ============================================================================

/// `scale * Π base^power` over named units from the symbol table.
#[derive(Debug, Clone)]
pub struct CompositeUnit {
    scale: f64,
    bases: Vec<(&'static Definition, Exponent)>,
}

/// A physical unit, or the explicit absence of one.
#[derive(Debug, Clone)]
pub enum Unit {
    /// No unit is known. Distinct from the dimensionless identity.
    NoUnit,
    Composite(CompositeUnit),
}

#[inline]
fn scale_pow(scale: f64, p: Exponent) -> f64 {
    if p.is_integer() {
        scale.powi(*p.numer())
    } else {
        scale.powf(f64::from(*p.numer()) / f64::from(*p.denom()))
    }
}

// ============================================================================
// ----------------------------- CompositeUnit --------------------------------
// ============================================================================

impl CompositeUnit {
    pub(crate) fn new(scale: f64) -> Self {
        Self { scale, bases: Vec::new() }
    }

    /// Numeric prefactor.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// `(symbol, power)` pairs in construction order.
    pub fn bases(&self) -> impl Iterator<Item = (&'static str, Exponent)> + '_ {
        self.bases.iter().map(|(d, p)| (d.symbol, *p))
    }

    /// Multiply in `def^power`, merging with an existing factor of the same symbol.
    pub(crate) fn push(&mut self, def: &'static Definition, power: Exponent) {
        match self.bases.iter_mut().find(|(d, _)| *d == def) {
            Some((_, p)) => *p += power,
            None => self.bases.push((def, power)),
        }
        self.bases.retain(|(_, p)| !p.is_zero());
    }

    pub(crate) fn scale_by(&mut self, factor: f64) {
        self.scale *= factor;
    }

    fn mul(&self, rhs: &CompositeUnit) -> CompositeUnit {
        let mut out = self.clone();
        out.scale *= rhs.scale;
        for &(def, p) in &rhs.bases {
            out.push(def, p);
        }
        out
    }

    fn pow(&self, p: Exponent) -> CompositeUnit {
        CompositeUnit {
            scale: scale_pow(self.scale, p),
            bases: self
                .bases
                .iter()
                .map(|&(d, q)| (d, q * p))
                .filter(|(_, q)| !q.is_zero())
                .collect(),
        }
    }

    /// Expand into irreducible units: `(scale, {irreducible: power})`.
    pub fn irreducible(&self) -> (f64, BTreeMap<&'static str, Exponent>) {
        let mut scale = self.scale;
        let mut dims: BTreeMap<&'static str, Exponent> = BTreeMap::new();
        for &(def, p) in &self.bases {
            scale *= scale_pow(def.scale, p);
            for &(sym, q) in def.dims {
                *dims.entry(sym).or_insert_with(Exponent::zero) += p * q;
            }
        }
        dims.retain(|_, p| !p.is_zero());
        (scale, dims)
    }
}

// ============================================================================
// --------------------------------- Unit -------------------------------------
// ============================================================================

impl Unit {
    /// The dimensionless identity `1`.
    #[inline]
    pub fn dimensionless() -> Self {
        Unit::Composite(CompositeUnit::new(1.0))
    }

    /// Parse a unit expression such as `"km s^-1"`, `"Msol**2 Mpc**-6"` or `"2.86e4 kpc a"`.
    #[inline]
    pub fn parse(expr: &str) -> Result<Self, UnitsError> {
        crate::parse::parse(expr)
    }

    #[inline]
    pub fn is_no_unit(&self) -> bool {
        matches!(self, Unit::NoUnit)
    }

    /// True for any composite whose irreducible expansion has no dimensions left.
    pub fn is_dimensionless(&self) -> bool {
        match self {
            Unit::NoUnit => false,
            Unit::Composite(c) => c.irreducible().1.is_empty(),
        }
    }

    /// Raise to an exact rational power. `NoUnit` stays `NoUnit`.
    ///
    /// # Panics
    /// If `p` is given as a `(numerator, 0)` tuple: `Ratio` rejects a zero denominator.
    pub fn pow(&self, p: impl Into<Exponent>) -> Unit {
        match self {
            Unit::NoUnit => Unit::NoUnit,
            Unit::Composite(c) => Unit::Composite(c.pow(p.into())),
        }
    }

    #[inline]
    pub fn recip(&self) -> Unit {
        self.pow(-1)
    }

    /// How many `to` are in one `self`, resolving contextual symbols from `context`.
    ///
    /// Fails with [`UnitsError::Incompatible`] if either side is `NoUnit` or the
    /// dimensions do not cancel once the context has been substituted.
    pub fn ratio(&self, to: &Unit, context: &ConversionContext) -> Result<f64, UnitsError> {
        let incompatible = || UnitsError::Incompatible {
            from: self.clone(),
            to: to.clone(),
            context: context.clone(),
        };

        let (Unit::Composite(a), Unit::Composite(b)) = (self, to) else {
            return Err(incompatible());
        };

        let (mut scale, dims) = a.mul(&b.pow(-Exponent::one())).irreducible();
        for (sym, p) in dims {
            match context.get(sym) {
                Some(&v) => scale *= scale_pow(v, p),
                None => return Err(incompatible()),
            }
        }
        Ok(scale)
    }

    /// Whether a ratio to `other` exists under `context`.
    #[inline]
    pub fn is_convertible(&self, other: &Unit, context: &ConversionContext) -> bool {
        self.ratio(other, context).is_ok()
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Unit::NoUnit, Unit::NoUnit) => true,
            (Unit::Composite(a), Unit::Composite(b)) => {
                let (sa, da) = a.irreducible();
                let (sb, db) = b.irreducible();
                da == db && ((sa / sb) - 1.0).abs() < EQ_TOLERANCE
            }
            _ => false,
        }
    }
}

// ============================================================================
// ------------------------------ Arithmetic ----------------------------------
// ============================================================================

macro_rules! impl_unit_binop {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<&Unit> for &Unit {
            type Output = Unit;

            fn $method(self, rhs: &Unit) -> Unit {
                match (self, rhs) {
                    (Unit::Composite($a), Unit::Composite($b)) => Unit::Composite($body),
                    _ => Unit::NoUnit,
                }
            }
        }

        impl $trait for Unit {
            type Output = Unit;

            #[inline]
            fn $method(self, rhs: Unit) -> Unit {
                (&self).$method(&rhs)
            }
        }
    };
}

impl_unit_binop!(Mul, mul, |a, b| a.mul(b));
impl_unit_binop!(Div, div, |a, b| a.mul(&b.pow(-Exponent::one())));

// ============================================================================
// ----------------------------- Text & Serde ---------------------------------
// ============================================================================

fn format_scale(scale: f64) -> String {
    let mag = scale.abs();
    if (1e-3..1e5).contains(&mag) {
        format!("{scale}")
    } else {
        format!("{scale:e}")
    }
}

impl fmt::Display for CompositeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.bases.len() + 1);
        if self.scale != 1.0 || self.bases.is_empty() {
            parts.push(format_scale(self.scale));
        }
        for &(def, p) in &self.bases {
            if p.is_one() {
                parts.push(def.symbol.to_string());
            } else if p.is_integer() {
                parts.push(format!("{}^{}", def.symbol, p.numer()));
            } else {
                parts.push(format!("{}^{}/{}", def.symbol, p.numer(), p.denom()));
            }
        }
        write!(f, "{}", parts.join(" "))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::NoUnit => write!(f, "NoUnit()"),
            Unit::Composite(c) => c.fmt(f),
        }
    }
}

impl FromStr for Unit {
    type Err = UnitsError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Unit::NoUnit => serializer.serialize_none(),
            Unit::Composite(c) => serializer.serialize_some(&c.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Unit::NoUnit),
            Some(s) => Unit::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

// ============================================================================
// ------------------------------ Conversion ----------------------------------
// ============================================================================

/// Anything that can name a unit: a parsed [`Unit`] or a unit expression.
pub trait IntoUnit {
    fn into_unit(self) -> Result<Unit, UnitsError>;
}

impl IntoUnit for Unit {
    #[inline]
    fn into_unit(self) -> Result<Unit, UnitsError> {
        Ok(self)
    }
}

impl IntoUnit for &Unit {
    #[inline]
    fn into_unit(self) -> Result<Unit, UnitsError> {
        Ok(self.clone())
    }
}

impl IntoUnit for &str {
    #[inline]
    fn into_unit(self) -> Result<Unit, UnitsError> {
        Unit::parse(self)
    }
}

impl IntoUnit for String {
    #[inline]
    fn into_unit(self) -> Result<Unit, UnitsError> {
        Unit::parse(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Unit {
        Unit::parse(s).unwrap()
    }

    #[test]
    fn kpc_to_mpc_ratio() {
        let r = u("kpc").ratio(&u("Mpc"), &ConversionContext::new()).unwrap();
        assert!((r - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn identical_units_have_exact_unit_ratio() {
        let r = u("Msol kpc^-3").ratio(&u("Msol kpc^-3"), &ConversionContext::new()).unwrap();
        assert_eq!(r, 1.0);
    }

    #[test]
    fn incompatible_dimensions_fail() {
        let err = u("Mpc").ratio(&u("Msol"), &ConversionContext::new()).unwrap_err();
        assert!(matches!(err, UnitsError::Incompatible { .. }));
    }

    #[test]
    fn no_unit_never_converts() {
        assert!(Unit::NoUnit.ratio(&u("m"), &ConversionContext::new()).is_err());
        assert!(u("m").ratio(&Unit::NoUnit, &ConversionContext::new()).is_err());
    }

    #[test]
    fn contextual_scale_factor_is_substituted() {
        let mut ctx = ConversionContext::new();
        ctx.insert("a".into(), 0.5);
        let r = u("kpc a").ratio(&u("kpc"), &ctx).unwrap();
        assert!((r - 0.5).abs() < 1e-15);
        assert!(u("kpc a").ratio(&u("kpc"), &ConversionContext::new()).is_err());
    }

    #[test]
    fn powers_and_display() {
        let x = u("Msol Mpc^-3");
        assert_eq!(x.pow(2).to_string(), "Msol^2 Mpc^-6");
        assert_eq!(x.pow((1, 3)).to_string(), "Msol^1/3 Mpc^-1");
        assert_eq!(u("kpc").pow((1, 2)).pow(2), u("kpc"));
    }

    #[test]
    fn products_cancel_exactly() {
        let q = &u("km s^-1") / &u("km s^-1");
        assert!(q.is_dimensionless());
        assert_eq!(q.to_string(), "1");
    }

    #[test]
    fn equality_uses_irreducible_expansion() {
        assert_eq!(u("km"), u("1000 m"));
        assert_ne!(u("km"), u("m"));
        assert_ne!(u("kpc a"), u("kpc"));
        assert_ne!(Unit::NoUnit, Unit::dimensionless());
        assert!(!Unit::NoUnit.is_dimensionless());
    }

    #[test]
    fn serde_roundtrip_through_strings() {
        let x = u("2.86e4 kpc a");
        let s = serde_json::to_string(&x).unwrap();
        let back: Unit = serde_json::from_str(&s).unwrap();
        assert_eq!(back, x);
        let none: Unit = serde_json::from_str("null").unwrap();
        assert!(none.is_no_unit());
    }
}
