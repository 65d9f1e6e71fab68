// src/context.rs
/*!
The owning **simulation context** as seen from an array.

An array never owns its context. It holds a [`ContextHandle`] (a weak reference to
the context's top-level ancestor) and resolves its *effective owner* in two steps:

1. upgrade the weak reference (a dropped context resolves to "no owner");
2. if the array belongs to a particle [`Family`], narrow the context to that family.

Every context-dependent operation degrades gracefully when step 1 fails:
conversion contexts become empty and dirty notifications become no-ops.
*/

use std::fmt;
use std::rc::{Rc, Weak};

use simunits::{ConversionContext, Unit, UnitsError};
use tracing::debug;

use crate::error::Result;

// ============================================================================
// --------------------------------- Family -----------------------------------
// ============================================================================

/// A particle class within a context (e.g. `gas`, `dm`, `star`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Family(String);

impl Family {
    pub fn new(name: impl Into<String>) -> Self {
        Family(name.into())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ------------------------------- SimContext ---------------------------------
// ============================================================================

/// Interface an owning container exposes to its arrays.
///
/// Arrays only ever call into the context; they never mutate its structure.
pub trait SimContext {
    /// Contextual scalars used to resolve unit ratios (scale factor `a`, Hubble `h`, ...).
    fn conversion_context(&self) -> ConversionContext;

    /// A named array changed in place.
    fn mark_dirty(&self, name: &str);

    /// Best-effort guess of `unit` expressed in the context's native unit scheme.
    fn infer_original_units(&self, unit: &Unit) -> std::result::Result<Unit, UnitsError>;

    /// Default units for the array called `name`, from known dimensionality.
    fn default_units_for(&self, name: &str) -> std::result::Result<Unit, UnitsError>;

    /// The sub-context holding only particles of `family`.
    fn narrow(self: Rc<Self>, family: &Family) -> Rc<dyn SimContext>;

    /// The top-level context this one was carved from, if it is a sub-context.
    fn ancestor(&self) -> Option<Rc<dyn SimContext>> {
        None
    }

    /// Whether `name` was derived (computed) rather than loaded.
    fn is_derived_array(&self, _name: &str, _family: Option<&Family>) -> bool {
        false
    }

    /// Drop the derivation link of `name` so it is no longer recomputed.
    fn unlink_array(&self, _name: &str) {}

    /// Persist `name` through the context's backing file.
    fn write_array(&self, name: &str, family: Option<&Family>) -> Result<()>;
}

// ============================================================================
// ------------------------------ ContextHandle -------------------------------
// ============================================================================

/// Optional, non-owning reference to a [`SimContext`].
#[derive(Clone, Default)]
pub struct ContextHandle(Option<Weak<dyn SimContext>>);

impl ContextHandle {
    /// No owning context.
    #[inline]
    pub fn none() -> Self {
        ContextHandle(None)
    }

    /// Bind to the top-level ancestor of `ctx`, so that a short-lived
    /// sub-context is never the weak target.
    pub fn bind(ctx: &Rc<dyn SimContext>) -> Self {
        let top = ctx.ancestor().unwrap_or_else(|| Rc::clone(ctx));
        ContextHandle(Some(Rc::downgrade(&top)))
    }

    /// Whether a context was ever bound (it may since have been dropped).
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }

    /// Upgrade to a strong reference; `None` if unbound or already dropped.
    pub fn resolve(&self) -> Option<Rc<dyn SimContext>> {
        let weak = self.0.as_ref()?;
        let strong = weak.upgrade();
        if strong.is_none() {
            debug!("owning context has been dropped; continuing without it");
        }
        strong
    }

    /// The effective owner: the resolved context narrowed to `family` if one is set.
    pub fn effective(&self, family: Option<&Family>) -> Option<Rc<dyn SimContext>> {
        let ctx = self.resolve()?;
        Some(match family {
            Some(f) => ctx.narrow(f),
            None => ctx,
        })
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.0 {
            None => "unbound",
            Some(w) if w.strong_count() == 0 => "dropped",
            Some(_) => "live",
        };
        write!(f, "ContextHandle({state})")
    }
}
