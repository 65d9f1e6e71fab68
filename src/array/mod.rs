// src/array/mod.rs
/*!
The unit-tracked array, [`SimArray`].

A `SimArray<T>` wraps a flat element buffer behind a strided [`Layout`], plus a
shared metadata cell holding:
- an optional unit tag (absent means "no unit known", which is not the same as dimensionless);
- an optional name identifying the array inside its owning context;
- a weak [`ContextHandle`] to that context.

Native views (`view`, `reshape`, `transpose`, `permute_axes`, `slice`, `row`) share
both the buffer **and** the metadata cell with the array they were taken from.
Reading or writing the units, name or context through a view therefore always
reads or writes the base, and every view created by ordinary numeric operations
inherits them without any extra propagation step.

Copies (`copy`, `Clone`, arithmetic results) get their own buffer and their own
metadata. They keep units, context and family but never the name, because a copy
is not registered in the context.

# Mutation
Every mutating operation first calls [`SimArray::notify_dirty`]: if the array
has a name and a live owning context, the context's `mark_dirty(name)` hook runs
exactly once per call. The fixed operation list is
[`DIRTY_OPERATIONS`](crate::ufunc::DIRTY_OPERATIONS).
*/

mod arith;
mod compare;
mod container;
mod elementwise;
mod factory;
mod indexed;
mod inplace;
mod reduce;
mod serialize;
mod units;

pub use compare::{BoolArray, CmpOp};
pub use container::NumericContainer;
pub use factory::{array_factory, FactoryOptions};
pub use indexed::{IndexSpec, IndexedView};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_traits::NumCast;
use rayon::prelude::*;
use simunits::{ConversionContext, IntoUnit, Unit};
use tracing::trace;

use crate::context::{ContextHandle, Family, SimContext};
use crate::error::{ArrayError, Result};
use crate::math::buffer::Buffer;
use crate::math::{Layout, Scalar, SliceRange};
use crate::ufunc::DIRTY_OPERATIONS;

//===================================================================
// -------------------------- Basic Struct --------------------------
//===================================================================

/// Metadata shared by an array and all of its native views.
#[derive(Default)]
pub(crate) struct ArrayMeta {
    pub(crate) units: Option<Unit>,
    pub(crate) name: Option<String>,
    pub(crate) context: ContextHandle,
}

/// A numeric array carrying an optional physical unit and a weak link to an
/// owning simulation context.
///
/// Arrays are single-threaded handles (`!Send`); elementwise loops still run on
/// the rayon pool over borrowed slices.
pub struct SimArray<T: Scalar> {
    storage: Rc<RefCell<Buffer<T>>>,
    layout: Layout,
    /// Layout of the array that created the storage.
    root: Layout,
    meta: Rc<RefCell<ArrayMeta>>,
    family: Option<Family>,
    is_view: bool,
}

#[inline]
fn normalize(units: Option<Unit>) -> Option<Unit> {
    units.filter(|u| !u.is_no_unit())
}

impl<T: Scalar> SimArray<T> {
    // ------------------------------ Construction ------------------------------

    /// Wrap `data` (row-major) as an array of shape `shape`.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        if data.len() != shape.iter().product::<usize>() {
            return Err(ArrayError::InvalidShape {
                shape,
                reason: "data length does not match shape",
            });
        }
        Ok(Self::from_buffer(Buffer::from(data), shape))
    }

    /// One-dimensional array over `data`.
    pub fn from_vec(data: Vec<T>) -> Self {
        let n = data.len();
        Self::from_buffer(Buffer::from(data), vec![n])
    }

    /// Zero-dimensional array holding `value`.
    pub fn scalar(value: T) -> Self {
        Self::from_buffer(Buffer::from(vec![value]), Vec::new())
    }

    /// Zero-filled array of shape `shape`.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self::from_buffer(Buffer::from(vec![T::zero(); n]), shape)
    }

    pub(crate) fn from_buffer(buffer: Buffer<T>, shape: Vec<usize>) -> Self {
        let layout = Layout::contiguous(shape);
        SimArray {
            storage: Rc::new(RefCell::new(buffer)),
            root: layout.clone(),
            layout,
            meta: Rc::new(RefCell::new(ArrayMeta::default())),
            family: None,
            is_view: false,
        }
    }

    /// Builder: tag with `units`.
    pub fn with_units(self, units: impl IntoUnit) -> Result<Self> {
        self.set_units(units)?;
        Ok(self)
    }

    /// Builder: bind to `ctx` (its top-level ancestor is stored, weakly).
    pub fn with_context(self, ctx: Rc<dyn SimContext>) -> Self {
        self.set_context(Some(ctx));
        self
    }

    /// Builder: mark as belonging to particle `family`.
    pub fn with_family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }

    /// Builder: register under `name` (used for dirty notifications and writes).
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.set_name(Some(name.into()));
        self
    }

    /// New contiguous array that keeps this array's context and family.
    pub(crate) fn derive_as<U: Scalar>(
        &self,
        shape: Vec<usize>,
        data: Vec<U>,
        units: Option<Unit>,
    ) -> SimArray<U> {
        let mut out = SimArray::from_buffer(Buffer::from(data), shape);
        {
            let mut meta = out.meta.borrow_mut();
            meta.units = normalize(units);
            meta.context = self.meta.borrow().context.clone();
        }
        out.family = self.family.clone();
        out
    }

    #[inline]
    pub(crate) fn derive(&self, shape: Vec<usize>, data: Vec<T>, units: Option<Unit>) -> SimArray<T> {
        self.derive_as(shape, data, units)
    }

    // ------------------------------ Shape -------------------------------------

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Number of elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.numel()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// True if this array aliases storage created by another array.
    #[inline]
    pub fn is_view(&self) -> bool {
        self.is_view
    }

    /// True if the storage is a shared memory map.
    pub fn is_shared(&self) -> bool {
        self.storage.borrow().is_shared()
    }

    /// True if both arrays read and write the same buffer.
    #[inline]
    pub fn shares_storage_with(&self, other: &SimArray<T>) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    // ------------------------------ Metadata ----------------------------------

    pub(crate) fn units_opt(&self) -> Option<Unit> {
        self.meta.borrow().units.clone()
    }

    pub(crate) fn set_units_opt(&self, units: Option<Unit>) {
        self.meta.borrow_mut().units = normalize(units);
    }

    /// The unit tag, or `Unit::NoUnit` when none is known.
    pub fn units(&self) -> Unit {
        self.units_opt().unwrap_or(Unit::NoUnit)
    }

    #[inline]
    pub fn has_units(&self) -> bool {
        self.meta.borrow().units.is_some()
    }

    /// Retag without touching the values. `Unit::NoUnit` clears the tag.
    /// On a view this retags the base (and every other view of it).
    pub fn set_units(&self, units: impl IntoUnit) -> Result<()> {
        let units = units.into_unit()?;
        self.set_units_opt(Some(units));
        Ok(())
    }

    pub fn clear_units(&self) {
        self.set_units_opt(None);
    }

    pub fn name(&self) -> Option<String> {
        self.meta.borrow().name.clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        self.meta.borrow_mut().name = name;
    }

    #[inline]
    pub fn family(&self) -> Option<&Family> {
        self.family.as_ref()
    }

    pub fn set_family(&mut self, family: Option<Family>) {
        self.family = family;
    }

    /// Bind (or unbind, with `None`) the owning context.
    pub fn set_context(&self, ctx: Option<Rc<dyn SimContext>>) {
        self.meta.borrow_mut().context = match ctx {
            Some(ctx) => ContextHandle::bind(&ctx),
            None => ContextHandle::none(),
        };
    }

    pub(crate) fn context_handle(&self) -> ContextHandle {
        self.meta.borrow().context.clone()
    }

    /// The effective owner: the live context, narrowed to this array's family.
    pub fn context(&self) -> Option<Rc<dyn SimContext>> {
        self.context_handle().effective(self.family.as_ref())
    }

    /// Contextual scalars from the owning context; empty when unowned.
    pub fn conversion_context(&self) -> ConversionContext {
        self.context()
            .map(|ctx| ctx.conversion_context())
            .unwrap_or_default()
    }

    // ------------------------------ Elements ----------------------------------

    /// Bounds-checked read.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        let off = self.layout.offset_of(index)?;
        Ok(self.storage.borrow()[off])
    }

    /// Bounds-checked write.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        let off = self.layout.offset_of(index)?;
        self.notify_dirty("setitem");
        self.storage.borrow_mut()[off] = value;
        Ok(())
    }

    /// The single element of a one-element array.
    pub fn item(&self) -> Result<T> {
        if self.size() != 1 {
            return Err(ArrayError::InvalidShape {
                shape: self.shape().to_vec(),
                reason: "item() requires exactly one element",
            });
        }
        Ok(self.storage.borrow()[self.layout.offset_of_linear(0)])
    }

    /// Elements in logical row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        let buf = self.storage.borrow();
        let data: &[T] = &buf;
        if self.layout.is_contiguous() {
            let start = self.layout.offset();
            return data[start..start + self.size()].to_vec();
        }
        self.layout.offsets().into_par_iter().map(|o| data[o]).collect()
    }

    /// Elements as seen under a broadcast `shape`.
    pub(crate) fn values_as(&self, shape: &[usize]) -> Result<Vec<T>> {
        let layout = self.layout.broadcast_to(shape)?;
        let buf = self.storage.borrow();
        let data: &[T] = &buf;
        Ok((0..layout.numel())
            .into_par_iter()
            .map(|k| data[layout.offset_of_linear(k)])
            .collect())
    }

    /// Overwrite every element in logical order. Does not notify.
    pub(crate) fn write_values(&self, values: &[T]) {
        debug_assert_eq!(values.len(), self.size());
        let mut buf = self.storage.borrow_mut();
        if self.layout.is_contiguous() {
            let start = self.layout.offset();
            buf[start..start + values.len()]
                .par_iter_mut()
                .zip(values.par_iter())
                .for_each(|(d, &v)| *d = v);
        } else {
            for (k, &v) in values.iter().enumerate() {
                let off = self.layout.offset_of_linear(k);
                buf[off] = v;
            }
        }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.notify_dirty("setslice");
        let n = self.size();
        self.write_values(&vec![value; n]);
    }

    // ------------------------------ Views -------------------------------------

    fn alias(&self, layout: Layout) -> Self {
        SimArray {
            storage: Rc::clone(&self.storage),
            layout,
            root: self.root.clone(),
            meta: Rc::clone(&self.meta),
            family: self.family.clone(),
            is_view: true,
        }
    }

    /// A view of the whole array.
    pub fn view(&self) -> Self {
        self.alias(self.layout.clone())
    }

    pub fn reshape(&self, shape: Vec<usize>) -> Result<Self> {
        Ok(self.alias(self.layout.reshape(shape)?))
    }

    /// One-dimensional view (contiguous arrays only).
    pub fn flatten_view(&self) -> Result<Self> {
        self.reshape(vec![self.size()])
    }

    /// Reverse the axes.
    pub fn transpose(&self) -> Self {
        self.alias(self.layout.transpose())
    }

    pub fn permute_axes(&self, axes: &[usize]) -> Result<Self> {
        Ok(self.alias(self.layout.permute(axes)?))
    }

    /// Per-axis `start:stop:step` view.
    pub fn slice(&self, ranges: &[SliceRange]) -> Result<Self> {
        Ok(self.alias(self.layout.slice(ranges)?))
    }

    /// View of row `i` along the leading axis.
    pub fn row(&self, i: usize) -> Result<Self> {
        Ok(self.alias(self.layout.select(0, i)?))
    }

    /// The basemost array, seen through a fresh handle. A plain array is its
    /// own ancestor.
    pub fn ancestor(&self) -> Self {
        SimArray {
            is_view: self.is_view,
            ..self.alias(self.root.clone())
        }
    }

    // ------------------------------ Copies ------------------------------------

    /// Deep copy keeping units, context and family (not the name).
    pub fn copy(&self) -> Self {
        self.derive(self.shape().to_vec(), self.to_vec(), self.units_opt())
    }

    /// Element-type conversion; fails if any value is not representable in `U`.
    pub fn astype<U: Scalar>(&self) -> Result<SimArray<U>> {
        let data = self
            .to_vec()
            .into_par_iter()
            .map(|x| {
                <U as NumCast>::from(x).ok_or(ArrayError::Cast {
                    value: x.to_f64_lossy(),
                })
            })
            .collect::<Result<Vec<U>>>()?;
        Ok(self.derive_as(self.shape().to_vec(), data, self.units_opt()))
    }

    // ------------------------------ Notifier ----------------------------------

    /// Tell the owning context that this array is about to change.
    ///
    /// No-op unless the array has a name and a live context.
    pub(crate) fn notify_dirty(&self, op: &'static str) {
        debug_assert!(DIRTY_OPERATIONS.contains(&op), "{op} is not a mutating operation");
        let (name, handle) = {
            let meta = self.meta.borrow();
            (meta.name.clone(), meta.context.clone())
        };
        let Some(name) = name else { return };
        if let Some(ctx) = handle.effective(self.family.as_ref()) {
            trace!(array = %name, op, "marking array dirty");
            ctx.mark_dirty(&name);
        }
    }
}

impl<T: Scalar> Clone for SimArray<T> {
    #[inline]
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl<T: Scalar> From<Vec<T>> for SimArray<T> {
    #[inline]
    fn from(data: Vec<T>) -> Self {
        SimArray::from_vec(data)
    }
}

//===================================================================
// ------------------------------ Text ------------------------------
//===================================================================

fn write_nested<T: fmt::Display>(f: &mut fmt::Formatter<'_>, shape: &[usize], values: &[T]) -> fmt::Result {
    match shape.split_first() {
        None => match values.first() {
            Some(v) => write!(f, "{v}"),
            None => Ok(()),
        },
        Some((&n, rest)) => {
            let chunk: usize = rest.iter().product();
            write!(f, "[")?;
            for i in 0..n {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_nested(f, rest, &values[i * chunk..(i + 1) * chunk])?;
            }
            write!(f, "]")
        }
    }
}

/// `SimArray([1, 2], 'kpc')`; the unit part is omitted when untagged.
impl<T: Scalar> fmt::Display for SimArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimArray(")?;
        write_nested(f, self.shape(), &self.to_vec())?;
        if let Some(u) = self.units_opt() {
            write!(f, ", '{u}'")?;
        }
        write!(f, ")")
    }
}

impl<T: Scalar> fmt::Debug for SimArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.meta.borrow();
        f.debug_struct("SimArray")
            .field("shape", &self.shape())
            .field("data", &self.to_vec())
            .field("units", &meta.units)
            .field("name", &meta.name)
            .field("family", &self.family)
            .field("context", &meta.context)
            .field("is_view", &self.is_view)
            .finish()
    }
}
