//! Plugin architecture and super-global scope.
//!
//! The super-global scope sits outside the normal lexical environment chain
//! and provides names that are available globally but resolved on demand:
//!
//! ```text
//! Variable Lookup Order:
//! 1. Local scope (function/block)
//! 2. Outer scopes (lexical chain)
//! 3. Super-global scope ← built-ins and plugins live here
//! ```
//!
//! - **[`PluginResolver`]**: trait for providing names dynamically
//! - **[`SuperGlobalEnvironment`]**: ordered resolver chain with strict and
//!   tolerant miss policies
//! - **[`CorePluginResolver`]**: exposes the realm built from a
//!   [`BuiltInRegistry`]
//! - **[`EvalContext`](types::EvalContext)**: execution context tying the
//!   realm, the lexical chain and the super-global scope together
//!
//! ## Example: Custom Plugin
//!
//! ```
//! use std::rc::Rc;
//! use atjs::runner::plugin::resolver::PluginResolver;
//! use atjs::runner::plugin::types::EvalContext;
//! use atjs::runner::ds::value::JsValue;
//! use atjs::runner::ds::error::JErrorType;
//!
//! struct AnswerPlugin;
//!
//! impl PluginResolver for AnswerPlugin {
//!     fn has_binding(&self, name: &str) -> bool {
//!         name == "answer"
//!     }
//!
//!     fn try_get(&self, name: &str, _ctx: &mut EvalContext) -> Result<Option<JsValue>, JErrorType> {
//!         Ok(if name == "answer" { Some(JsValue::integer(42)) } else { None })
//!     }
//!
//!     fn name(&self) -> &str { "answer_plugin" }
//! }
//!
//! let mut ctx = EvalContext::new();
//! ctx.add_resolver(Rc::new(AnswerPlugin));
//! assert_eq!(ctx.get_binding("answer").unwrap(), JsValue::integer(42));
//! ```

pub mod types;
pub mod registry;
pub mod resolver;
pub mod core_resolver;
pub mod super_global;

pub use types::{BuiltInFn, BuiltInObject, EvalContext, NativeFn};
pub use registry::BuiltInRegistry;
pub use resolver::PluginResolver;
pub use core_resolver::CorePluginResolver;
pub use super_global::{LookupPolicy, SuperGlobalEnvironment};
