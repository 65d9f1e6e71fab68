// src/ufunc/registry.rs
//! Process-wide `operation name -> unit rule` map.
//!
//! Seeded with the built-in rules on first access. Lookups take a read lock;
//! registration takes the write lock. Register custom rules during start-up,
//! before arrays are used from several threads.

use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use parking_lot::RwLock;
use simunits::{Unit, UnitsError};
use tracing::{debug, trace};

use super::{rules, Operand};

/// Computes the unit of an operation's result from its operands.
pub type UnitRule = Arc<dyn Fn(&[Operand]) -> Result<Unit, UnitsError> + Send + Sync>;

type Registry = RwLock<AHashMap<String, UnitRule>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| RwLock::new(rules::builtin()))
}

/// Install (or replace) the rule for `op`.
pub fn register_rule<F>(op: impl Into<String>, rule: F)
where
    F: Fn(&[Operand]) -> Result<Unit, UnitsError> + Send + Sync + 'static,
{
    let op = op.into();
    trace!(op = %op, "registering unit rule");
    registry().write().insert(op, Arc::new(rule));
}

/// The rule registered for `op`, if any.
pub fn rule_for(op: &str) -> Option<UnitRule> {
    registry().read().get(op).cloned()
}

/// Names of all operations with a registered rule, sorted.
pub fn registered_ops() -> Vec<String> {
    let mut names: Vec<String> = registry().read().keys().cloned().collect();
    names.sort();
    names
}

/// Result unit of `op` applied to `operands`.
///
/// `None` means the result must be a plain, untagged array: either no rule is
/// registered or the rule could not track the units.
pub fn resolve_units(op: &str, operands: &[Operand]) -> Option<Unit> {
    let Some(rule) = rule_for(op) else {
        debug!(op, "no unit rule registered; result is untagged");
        return None;
    };
    match rule(operands) {
        Ok(unit) => Some(unit),
        Err(err) => {
            debug!(op, error = %err, "unit rule failed; result is untagged");
            None
        }
    }
}
