//! Plugin resolver trait for lazy, dynamic resolution of super-global names.
//!
//! Plugins implement `PluginResolver` to provide names (like `Math`, `require`
//! or an auto-required package) that are visible in the super-global scope.
//! Values are resolved lazily, only when script code actually references them.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// A plugin resolver that can dynamically provide named values.
///
/// Resolvers are queried in registration order when a name lookup reaches the
/// super-global scope. The first resolver that yields a value wins.
pub trait PluginResolver {
    /// Does this resolver already hold a binding with the given name?
    ///
    /// This should be a cheap check. It must NOT trigger lazy work such as
    /// loading modules; `try_get` may still produce names this reports absent.
    fn has_binding(&self, name: &str) -> bool;

    /// Look the name up. `Ok(None)` is the absence marker: the resolver has
    /// nothing for this name, which is distinct from a binding whose value is
    /// `undefined` or `null`.
    fn try_get(&self, name: &str, ctx: &mut EvalContext) -> Result<Option<JsValue>, JErrorType>;

    /// Store a write to an undeclared global. Returns false when this
    /// resolver does not accept writes.
    fn set(&self, _name: &str, _value: JsValue) -> bool {
        false
    }

    /// Human-readable name for this resolver (for debugging/logging).
    fn name(&self) -> &str;
}
