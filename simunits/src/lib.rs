//! `simunits` — unit algebra for simulation arrays.
//!
//! Parses unit expressions, multiplies/divides/raises them to exact rational
//! powers, and computes conversion ratios that may depend on contextual scalars
//! such as the cosmological scale factor `a`.
//!
//! ```
//! use simunits::{ConversionContext, Unit};
//!
//! let kpc = Unit::parse("kpc").unwrap();
//! let mpc = Unit::parse("Mpc").unwrap();
//! let r = kpc.ratio(&mpc, &ConversionContext::new()).unwrap();
//! assert!((r - 1e-3).abs() < 1e-15);
//! ```

pub mod error;
mod parse;
pub mod table;
pub mod unit;

pub use error::UnitsError;
pub use unit::{CompositeUnit, ConversionContext, Exponent, IntoUnit, Unit};
