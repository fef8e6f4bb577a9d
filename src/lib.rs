//! # atjs
//!
//! Run JavaScript expressions against data piped in on the command line.
//!
//! ```text
//! $ echo '{"users": [{"name": "ada"}]}' | atjs run '.users[0].name.toUpperCase()'
//! ADA
//! ```
//!
//! The crate carries its own small JavaScript engine:
//!
//! - **[`parser`]** - PEG grammar and AST for the supported subset
//! - **[`runner`]** - tree-walking evaluator, value model and built-ins
//!   - **[`runner::plugin`]** - resolver chain behind global name lookup
//! - **[`engine`]** - shorthand desugaring, the sandbox namespace with module
//!   auto-resolution, path targeting and the pipeline commands
//! - **[`config`]** - settings an evaluation runs with
//!
//! ## Evaluating in a sandbox
//!
//! ```
//! use atjs::config::EngineConfig;
//! use atjs::engine::Sandbox;
//! use atjs::runner::ds::value::JsValue;
//!
//! let mut sandbox = Sandbox::new(&EngineConfig::new(std::env::temp_dir()));
//! let shout = sandbox.run_expression(".toUpperCase()").unwrap();
//! let result = sandbox.call(&shout, vec![JsValue::string("hi")]).unwrap();
//! assert_eq!(result, JsValue::string("HI"));
//! ```
//!
//! ## Name resolution
//!
//! An identifier is looked up in the lexical scopes first, then in the
//! super-global environment, an ordered chain of
//! [`PluginResolver`](runner::plugin::resolver::PluginResolver)s. A plain
//! [`EvalContext`](runner::plugin::types::EvalContext) exposes the realm's
//! built-ins that way; a [`Sandbox`](engine::Sandbox) replaces them with its
//! layered namespace, which falls back to loading installed modules.

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod engine;
pub mod parser;
pub mod runner;
