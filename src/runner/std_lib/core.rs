//! Core built-ins registration.
//!
//! This module provides the function to register all core built-in objects
//! with the BuiltInRegistry.

use crate::runner::plugin::registry::BuiltInRegistry;

use super::array;
use super::boolean;
use super::console;
use super::error;
use super::function;
use super::global;
use super::json;
use super::math;
use super::number;
use super::object;
use super::regexp;
use super::string;

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    // Constructors first, in prototype-parent order; Error before its
    // subclasses.
    object::register(registry);
    function::register(registry);
    array::register(registry);
    string::register(registry);
    number::register(registry);
    boolean::register(registry);
    regexp::register(registry);
    error::register(registry);
    math::register(registry);
    json::register(registry);
    console::register(registry);
    global::register(registry);
}
