// src/math/buffer.rs
//! Flat element storage behind every [`SimArray`](crate::SimArray).
//!
//! - `Heap`: an ordinary `Vec<T>`.
//! - `Shared`: an anonymous shared memory map. Pages are mapped `MAP_SHARED`,
//!   so a process forked after allocation sees (and writes) the same elements.
//!
//! Both variants deref to `[T]`, so the array engine never distinguishes them.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use memmap2::MmapMut;

use super::scalar::Scalar;
use crate::error::Result;

pub(crate) enum Buffer<T: Scalar> {
    Heap(Vec<T>),
    Shared {
        map: MmapMut,
        len: usize,
        _marker: PhantomData<T>,
    },
}

impl<T: Scalar> Buffer<T> {
    /// Zero-filled shared storage for `len` elements.
    ///
    /// The map is page aligned and the kernel hands out zeroed pages; an all-zero
    /// bit pattern is a valid zero for every `Scalar` type.
    pub(crate) fn shared_zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Buffer::Heap(Vec::new()));
        }
        let bytes = len * std::mem::size_of::<T>();
        let map = MmapMut::map_anon(bytes)?;
        Ok(Buffer::Shared {
            map,
            len,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn is_shared(&self) -> bool {
        matches!(self, Buffer::Shared { .. })
    }
}

impl<T: Scalar> Deref for Buffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        match self {
            Buffer::Heap(v) => v,
            // SAFETY: the map holds `len * size_of::<T>()` initialised bytes, is page
            // aligned (>= align_of::<T>()) and lives as long as `self`.
            Buffer::Shared { map, len, .. } => unsafe {
                std::slice::from_raw_parts(map.as_ptr() as *const T, *len)
            },
        }
    }
}

impl<T: Scalar> DerefMut for Buffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        match self {
            Buffer::Heap(v) => v,
            // SAFETY: as in `deref`; `&mut self` guarantees exclusive access.
            Buffer::Shared { map, len, .. } => unsafe {
                std::slice::from_raw_parts_mut(map.as_mut_ptr() as *mut T, *len)
            },
        }
    }
}

impl<T: Scalar> From<Vec<T>> for Buffer<T> {
    #[inline]
    fn from(v: Vec<T>) -> Self {
        Buffer::Heap(v)
    }
}
