//! Super-global environment, the bottom of the scope chain.
//!
//! This environment sits below the outermost lexical scope and lazily
//! resolves built-in and plugin-provided names on access.
//!
//! ```text
//! JavaScript: Math.abs(-5)
//!      ↓
//! 1. Check local scope → not found
//! 2. Check outer scopes → not found
//! 3. Check super-global → ask each resolver in order
//! 4. CorePluginResolver yields the realm's Math object
//! ```
//!
//! A miss is handled by the caller's [`LookupPolicy`]: bare identifier
//! reads are strict, `typeof` and global-object property reads are tolerant.

use std::rc::Rc;

use tracing::trace;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::{EvalContext, SharedSuperGlobal};

/// What to do when no resolver provides a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPolicy {
    /// Raise `ReferenceError: <name> is not defined`.
    Strict,
    /// Yield `undefined`.
    Tolerant,
}

/// Ordered chain of plugin resolvers.
///
/// Resolvers own any caching they need; the sandbox namespace, for example,
/// memoizes auto-required modules itself.
pub struct SuperGlobalEnvironment {
    /// Registered plugin resolvers, queried in order.
    resolvers: Vec<Rc<dyn PluginResolver>>,
}

impl SuperGlobalEnvironment {
    pub fn new() -> Self {
        SuperGlobalEnvironment { resolvers: Vec::new() }
    }

    /// Register a plugin resolver. Resolvers are queried in registration order.
    pub fn add_resolver(&mut self, resolver: Rc<dyn PluginResolver>) {
        self.resolvers.push(resolver);
    }

    /// Snapshot of the resolver chain. Resolution runs against a snapshot so
    /// resolvers may re-enter the context (e.g. to evaluate a module) while
    /// the environment itself is not borrowed.
    pub fn resolvers(&self) -> Vec<Rc<dyn PluginResolver>> {
        self.resolvers.clone()
    }

    /// Check if any resolver already holds the given name.
    pub fn has_name(&self, name: &str) -> bool {
        self.resolvers.iter().any(|r| r.has_binding(name))
    }

    /// Offer a global write to each resolver in order.
    pub fn assign(&self, name: &str, value: JsValue) -> bool {
        self.resolvers.iter().any(|r| r.set(name, value.clone()))
    }

    /// Resolve a name through the chain, applying `policy` on a miss.
    pub fn resolve(
        env: &SharedSuperGlobal,
        name: &str,
        ctx: &mut EvalContext,
        policy: LookupPolicy,
    ) -> Result<JsValue, JErrorType> {
        let resolvers = env.borrow().resolvers();
        for resolver in resolvers {
            if let Some(value) = resolver.try_get(name, ctx)? {
                return Ok(value);
            }
        }
        trace!(name, ?policy, "super-global miss");
        match policy {
            LookupPolicy::Strict => Err(JErrorType::ReferenceError(format!(
                "{} is not defined",
                name
            ))),
            LookupPolicy::Tolerant => Ok(JsValue::Undefined),
        }
    }
}

impl Default for SuperGlobalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
