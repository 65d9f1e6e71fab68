// src/array/factory.rs
//! Storage-level construction used by file readers.
//!
//! `shared = true` places the elements in an anonymous `MAP_SHARED` memory map,
//! so worker processes forked after allocation read and write the same buffer.

use serde::{Deserialize, Serialize};

use super::SimArray;
use crate::error::Result;
use crate::math::buffer::Buffer;
use crate::math::Scalar;

/// Allocation options for [`array_factory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryOptions {
    /// Request zero-initialized storage.
    pub zeros: bool,
    /// Back the array with shared memory.
    pub shared: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        FactoryOptions {
            zeros: true,
            shared: false,
        }
    }
}

impl FactoryOptions {
    #[inline]
    pub fn build<T: Scalar>(&self, shape: &[usize]) -> Result<SimArray<T>> {
        array_factory(shape, self.zeros, self.shared)
    }
}

/// New untagged, unowned array of `shape`.
///
/// Safe Rust never hands out uninitialized elements, so `zeros = false` still
/// yields zeros; it only signals that the caller will overwrite every element.
pub fn array_factory<T: Scalar>(shape: &[usize], zeros: bool, shared: bool) -> Result<SimArray<T>> {
    let n = shape.iter().product();
    let buffer = if shared {
        Buffer::shared_zeroed(n)?
    } else if zeros {
        Buffer::from(vec![T::zero(); n])
    } else {
        Buffer::from(vec![T::default(); n])
    };
    Ok(SimArray::from_buffer(buffer, shape.to_vec()))
}
