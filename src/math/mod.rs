// src/math/mod.rs
//! Numeric foundations: element types, strided layouts and flat storage.

pub(crate) mod buffer;
pub mod layout;
pub mod scalar;

pub use layout::{broadcast_shapes, compute_strides, Layout, SliceRange};
pub use scalar::{IntScalar, Scalar};
