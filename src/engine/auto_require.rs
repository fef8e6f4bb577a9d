//! Resolving unknown identifiers to installed modules.
//!
//! An identifier is tried under up to three module names, first hit wins:
//!
//! 1. verbatim: `lodash`
//! 2. hyphen-case: `changeCase` → `change-case`
//! 3. scoped: `__babel_types` → `@babel/types`
//!
//! Only the first `_` after the scope marker becomes a `/`; identifiers with
//! more underscores map to whatever hyphen-casing makes of the rest.

use regex::Regex;
use tracing::{info, trace};

use crate::engine::module_loader::ModuleLoader;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

lazy_static! {
    static ref LOWER_UPPER: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
    static ref UPPER_UPPER_LOWER: Regex = Regex::new(r"([A-Z])([A-Z][a-z])").unwrap();
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
}

const SCOPE_PLACEHOLDER: &str = "atjsplaceholderscope";
const SLASH_PLACEHOLDER: &str = "atjsplaceholderslash";

/// Outcome of auto-resolution. `Absent` is distinct from a module whose
/// exports happen to be `null` or `undefined`.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    Found { source: String, value: JsValue },
    Absent,
}

impl Resolution {
    pub fn into_value(self) -> Option<JsValue> {
        match self {
            Resolution::Found { value, .. } => Some(value),
            Resolution::Absent => None,
        }
    }
}

/// `fooBar`, `FooBar`, `foo_bar` and `XMLParser` become `foo-bar`,
/// `foo-bar`, `foo-bar` and `xml-parser`.
pub fn param_case(input: &str) -> String {
    let split = LOWER_UPPER.replace_all(input, "${1}\0${2}");
    let split = UPPER_UPPER_LOWER.replace_all(&split, "${1}\0${2}");
    let split = NON_ALPHANUMERIC.replace_all(&split, "\0");
    split
        .split('\0')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Scoped package name for identifiers like `__scope_name`.
pub fn scoped_package_name(identifier: &str) -> String {
    let marked = match identifier.strip_prefix("__") {
        Some(rest) => format!("{}{}", SCOPE_PLACEHOLDER, rest),
        None => identifier.to_string(),
    };
    let marked = marked.replacen('_', SLASH_PLACEHOLDER, 1);
    param_case(&marked)
        .replacen(SCOPE_PLACEHOLDER, "@", 1)
        .replacen(SLASH_PLACEHOLDER, "/", 1)
}

/// Module names to try for `identifier`, in order, without repeats.
pub fn candidate_sources(identifier: &str) -> Vec<String> {
    let mut sources: Vec<String> = Vec::with_capacity(3);
    for source in [
        identifier.to_string(),
        param_case(identifier),
        scoped_package_name(identifier),
    ] {
        if !source.is_empty() && !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

/// Tries every candidate against `loader`. Load failures of any kind move
/// on to the next candidate; running out of candidates is `Absent`.
pub fn auto_require(loader: &dyn ModuleLoader, ctx: &mut EvalContext, identifier: &str) -> Resolution {
    for source in candidate_sources(identifier) {
        match loader.load(&source, ctx) {
            Ok(value) => {
                info!("auto-required {:?} as {}", source, identifier);
                return Resolution::Found { source, value };
            }
            Err(error) => trace!(identifier, source = %source, %error, "auto-require candidate failed"),
        }
    }
    Resolution::Absent
}
