//! Evaluating command-line expressions against piped-in data.
//!
//! ```text
//! "'.name'" ──desugar──▶ "$it => $it.name" ──Sandbox::run_expression──▶ function
//!                                                │
//!        unknown identifier ──▶ auto_require ──▶ ModuleLoader
//! ```
//!
//! - **[`desugar`]**: shorthand syntax (`.foo`, `.[0]`, `$it`)
//! - **[`auto_require`]**: identifier → module name cascade
//! - **[`module_loader`]**: Node-style module resolution and CommonJS loading
//! - **[`sandbox`]**: the layered namespace expressions run in
//! - **[`helpers`]**: `exec`, `quote` and text styling
//! - **[`targeting`]**: applying a function at selected paths
//! - **[`commands`]**: the pipeline commands and output formatting

pub mod auto_require;
pub mod commands;
pub mod desugar;
pub mod error;
pub mod helpers;
pub mod module_loader;
pub mod node_builtins;
pub mod sandbox;
pub mod targeting;

pub use error::EngineError;
pub use sandbox::Sandbox;
