// src/math/scalar.rs
//! Element types storable in a [`SimArray`](crate::SimArray).
//!
//! Design goals:
//! - One sealed public trait (`Scalar`) for every real element type (ints and floats).
//! - Parallel-safe (`Send + Sync`) so elementwise loops can run under rayon.
//! - Type-preserving math: `sqrt_real`, `powf_real`, `floor_div` and `floor_mod` return `Self`.
//!     * floats: native math
//!     * integers: computed through `f64` and truncated back (negative sqrt -> 0)
//! - An `f64` bridge (`to_f64_lossy` / `from_f64`) used when a unit conversion
//!   rescales an operand: the rescaled values are combined in `f64` and cast back.
//!
//! `IntScalar` adds the bitwise surface used by the in-place shift/and/or/xor/invert operators.

use core::fmt::{Debug, Display};
use core::iter::{Product, Sum};
use core::ops::{BitAnd, BitOr, BitXor, Not, Shl, Shr};
use num_traits::{Bounded, Num, NumCast, One, ToPrimitive, Zero};

// ==============================================================================
// ------------------- Sealing: keep impl surface controlled --------------------
// ==============================================================================

mod sealed {
    pub trait Sealed {}
    macro_rules! impl_sealed_for {
        ($($t:ty),* $(,)?) => { $(impl Sealed for $t {})* };
    }
    impl_sealed_for!(
        // unsigned
        u8, u16, u32, u64, usize,
        // signed
        i8, i16, i32, i64, isize,
        // floats
        f32, f64
    );
}
use sealed::Sealed;

// ==============================================================================
// --------------------------------- Trait Def ----------------------------------
// ==============================================================================

/// A real scalar element: integers and floats.
pub trait Scalar:
    Num
    + NumCast
    + ToPrimitive
    + Zero
    + One
    + Bounded
    + PartialOrd
    + Copy
    + Default
    + Send
    + Sync
    + 'static
    + Debug
    + Display
    + Sum<Self>
    + Product<Self>
    + Sealed
{
    /// True for integer element types.
    const INTEGER: bool;

    /// Type-preserving square root (integers: floor, negatives -> 0).
    fn sqrt_real(self) -> Self;

    /// Type-preserving real power (integers: truncated).
    fn powf_real(self, e: f64) -> Self;

    /// Absolute value (unsigned: identity).
    fn abs_real(self) -> Self;

    /// Floor division `⌊self / rhs⌋`.
    fn floor_div(self, rhs: Self) -> Self;

    /// Floor modulo: the result takes the sign of `rhs`, so that
    /// `self == self.floor_div(rhs) * rhs + self.floor_mod(rhs)`.
    fn floor_mod(self, rhs: Self) -> Self;

    /// Widen to `f64`; values beyond `f64` range become NaN.
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Narrow from `f64`; `None` if the value is not representable in `Self`.
    #[inline]
    fn from_f64(v: f64) -> Option<Self> {
        <Self as NumCast>::from(v)
    }
}

/// Integer elements with a bitwise surface.
pub trait IntScalar:
    Scalar
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
}

// ==============================================================================
// -------------------------------- IMPL: Float ---------------------------------
// ==============================================================================

macro_rules! impl_scalar_float {
    ($($t:ty),* $(,)?) => {$(
        impl Scalar for $t {
            const INTEGER: bool = false;

            #[inline] fn sqrt_real(self) -> Self { self.sqrt() }
            #[inline] fn powf_real(self, e: f64) -> Self { (self as f64).powf(e) as $t }
            #[inline] fn abs_real(self) -> Self { self.abs() }
            #[inline] fn floor_div(self, rhs: Self) -> Self { (self / rhs).floor() }

            #[inline]
            fn floor_mod(self, rhs: Self) -> Self {
                let r = self % rhs;
                if r != 0.0 && (r < 0.0) != (rhs < 0.0) { r + rhs } else { r }
            }
        }
    )*}
}
impl_scalar_float!(f32, f64);

// ==============================================================================
// ------------------------------- IMPL: Integer --------------------------------
// ==============================================================================

macro_rules! impl_scalar_unsigned {
    ($($t:ty),* $(,)?) => {$(
        impl Scalar for $t {
            const INTEGER: bool = true;

            #[inline] fn sqrt_real(self) -> Self { (self as f64).sqrt().floor() as $t }
            #[inline] fn powf_real(self, e: f64) -> Self { (self as f64).powf(e) as $t }
            #[inline] fn abs_real(self) -> Self { self }
            #[inline] fn floor_div(self, rhs: Self) -> Self { self / rhs }
            #[inline] fn floor_mod(self, rhs: Self) -> Self { self % rhs }
        }

        impl IntScalar for $t {}
    )*}
}
impl_scalar_unsigned!(u8, u16, u32, u64, usize);

macro_rules! impl_scalar_signed {
    ($($t:ty),* $(,)?) => {$(
        impl Scalar for $t {
            const INTEGER: bool = true;

            #[inline]
            fn sqrt_real(self) -> Self {
                if self <= 0 { 0 as $t }
                else { (self as f64).sqrt().floor() as $t }
            }

            #[inline] fn powf_real(self, e: f64) -> Self { (self as f64).powf(e) as $t }

            #[inline] fn abs_real(self) -> Self { self.saturating_abs() }

            #[inline]
            fn floor_div(self, rhs: Self) -> Self {
                let q = self / rhs;
                if (self % rhs != 0) && ((self < 0) != (rhs < 0)) { q - 1 } else { q }
            }

            #[inline]
            fn floor_mod(self, rhs: Self) -> Self {
                let r = self % rhs;
                if r != 0 && ((r < 0) != (rhs < 0)) { r + rhs } else { r }
            }
        }

        impl IntScalar for $t {}
    )*}
}
impl_scalar_signed!(i8, i16, i32, i64, isize);
