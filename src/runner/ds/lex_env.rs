use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

pub type EnvironmentType = Rc<RefCell<LexEnvironment>>;

struct Binding {
    value: JsValue,
    mutable: bool,
}

/// One scope in the lexical chain. The outermost environment has no
/// `outer`; misses there fall through to the super-global environment.
pub struct LexEnvironment {
    bindings: HashMap<String, Binding>,
    outer: Option<EnvironmentType>,
    function_scope: bool,
}

impl LexEnvironment {
    pub fn new(outer: Option<EnvironmentType>) -> EnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            bindings: HashMap::new(),
            outer,
            function_scope: false,
        }))
    }

    /// A scope that receives `var` declarations.
    pub fn new_function_scope(outer: Option<EnvironmentType>) -> EnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            bindings: HashMap::new(),
            outer,
            function_scope: true,
        }))
    }

    pub fn is_function_scope(&self) -> bool {
        self.function_scope
    }

    pub fn outer(&self) -> Option<EnvironmentType> {
        self.outer.clone()
    }

    pub fn has_own_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn declare(&mut self, name: &str, value: JsValue, mutable: bool) {
        self.bindings.insert(name.to_string(), Binding { value, mutable });
    }

    fn get_own(&self, name: &str) -> Option<JsValue> {
        self.bindings.get(name).map(|b| b.value.clone())
    }
}

/// Walks the chain from `env` outwards.
pub fn lookup_binding(env: &EnvironmentType, name: &str) -> Option<JsValue> {
    let mut current = Some(env.clone());
    while let Some(scope) = current {
        let scope_ref = scope.borrow();
        if let Some(value) = scope_ref.get_own(name) {
            return Some(value);
        }
        current = scope_ref.outer();
    }
    None
}

/// Assigns to the nearest existing binding. `Ok(false)` means no scope in
/// the chain declares `name`.
pub fn assign_binding(env: &EnvironmentType, name: &str, value: JsValue) -> Result<bool, JErrorType> {
    let mut current = Some(env.clone());
    while let Some(scope) = current {
        let mut scope_ref = scope.borrow_mut();
        if let Some(binding) = scope_ref.bindings.get_mut(name) {
            if !binding.mutable {
                return Err(JErrorType::TypeError("Assignment to constant variable.".to_string()));
            }
            binding.value = value;
            return Ok(true);
        }
        current = scope_ref.outer();
    }
    Ok(false)
}

/// Nearest enclosing function scope (or the outermost scope).
pub fn nearest_function_scope(env: &EnvironmentType) -> EnvironmentType {
    let mut current = env.clone();
    loop {
        let next = {
            let scope_ref = current.borrow();
            if scope_ref.is_function_scope() {
                None
            } else {
                scope_ref.outer()
            }
        };
        match next {
            Some(outer) => current = outer,
            None => return current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_and_falls_back() {
        let outer = LexEnvironment::new_function_scope(None);
        outer.borrow_mut().declare("a", JsValue::integer(1), true);
        let inner = LexEnvironment::new(Some(outer.clone()));
        inner.borrow_mut().declare("b", JsValue::integer(2), true);
        assert_eq!(lookup_binding(&inner, "a"), Some(JsValue::integer(1)));
        assert_eq!(lookup_binding(&outer, "b"), None);
    }

    #[test]
    fn const_bindings_reject_assignment() {
        let env = LexEnvironment::new(None);
        env.borrow_mut().declare("c", JsValue::integer(1), false);
        assert!(assign_binding(&env, "c", JsValue::integer(2)).is_err());
        assert_eq!(assign_binding(&env, "missing", JsValue::Null).unwrap(), false);
    }
}
