//! Core plugin resolver: exposes the realm's global built-ins.

use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// Makes every realm global (Math, console, Array, parseInt, NaN, ...)
/// available through the super-global scope. Read-only.
pub struct CorePluginResolver {
    realm: Rc<Realm>,
}

impl CorePluginResolver {
    pub fn new(realm: Rc<Realm>) -> Self {
        CorePluginResolver { realm }
    }
}

impl PluginResolver for CorePluginResolver {
    fn has_binding(&self, name: &str) -> bool {
        self.realm.global(name).is_some()
    }

    fn try_get(&self, name: &str, _ctx: &mut EvalContext) -> Result<Option<JsValue>, JErrorType> {
        Ok(self.realm.global(name))
    }

    fn name(&self) -> &str {
        "core"
    }
}
