//! Loading modules by name, Node style.
//!
//! [`NodeModuleLoader`] understands the subset of Node's resolution rules a
//! command-line one-liner needs: the `path`, `fs` and `os` built-ins,
//! relative and absolute file specifiers, and packages found in
//! `node_modules` directories of the base directory and its ancestors.
//! JavaScript files are evaluated as CommonJS modules in the caller's realm.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::engine::node_builtins;
use crate::runner::api::eval_script;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::operations::object::{get_property, to_js_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;
use crate::runner::std_lib::json::json_to_value;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Cannot find module '{specifier}' from '{}'", .from.display())]
    NotFound { specifier: String, from: PathBuf },
    #[error("failed to read module {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("error while loading {}: {source}", .path.display())]
    Evaluation {
        path: PathBuf,
        #[source]
        source: JErrorType,
    },
}

impl ModuleError {
    /// What script code sees when `require` fails.
    pub fn into_script_error(self, realm: &Realm) -> JErrorType {
        match self {
            ModuleError::Evaluation { source, .. } => source,
            ModuleError::NotFound { .. } => {
                let error = realm.new_error("Error", &self.to_string());
                if let JsValue::Object(o) = &error {
                    o.borrow_mut().set_own("code", JsValue::string("MODULE_NOT_FOUND"));
                }
                JErrorType::Thrown(error)
            }
            other => JErrorType::Thrown(realm.new_error("Error", &other.to_string())),
        }
    }
}

/// The "load module by name" capability the sandbox and the auto-resolver
/// are built on. Failure to find a module must be an `Err`.
pub trait ModuleLoader {
    fn load(&self, specifier: &str, ctx: &mut EvalContext) -> Result<JsValue, ModuleError>;
}

struct LoaderState {
    base_dir: PathBuf,
    /// `module` objects by resolved path.
    cache: RefCell<HashMap<PathBuf, JsValue>>,
    builtins: RefCell<HashMap<String, JsValue>>,
}

/// Cheap handle; clones share one module cache.
#[derive(Clone)]
pub struct NodeModuleLoader {
    state: Rc<LoaderState>,
}

impl NodeModuleLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        NodeModuleLoader {
            state: Rc::new(LoaderState {
                base_dir: base_dir.into(),
                cache: RefCell::new(HashMap::new()),
                builtins: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.state.base_dir
    }

    /// `require(specifier)` as seen from a module living in `from_dir`.
    pub fn load_from(&self, specifier: &str, from_dir: &Path, ctx: &mut EvalContext) -> Result<JsValue, ModuleError> {
        let builtin_name = specifier.strip_prefix("node:").unwrap_or(specifier);
        if node_builtins::is_builtin(builtin_name) {
            return Ok(self.builtin(builtin_name, ctx));
        }

        let path = self.resolve(specifier, from_dir).ok_or_else(|| ModuleError::NotFound {
            specifier: specifier.to_string(),
            from: from_dir.to_path_buf(),
        })?;
        let cached = self.state.cache.borrow().get(&path).cloned();
        if let Some(module) = cached {
            return exports_of(ctx, &module, &path);
        }

        debug!(specifier, path = %path.display(), "loading module");
        if path.extension().map_or(false, |ext| ext == "json") {
            let text = fs::read_to_string(&path).map_err(|source| ModuleError::Io {
                path: path.clone(),
                source,
            })?;
            let json: serde_json::Value = serde_json::from_str(&text).map_err(|source| ModuleError::Json {
                path: path.clone(),
                source,
            })?;
            let value = json_to_value(&ctx.realm, &json);
            let module = ctx.realm.new_object_from(vec![("exports", value.clone())]);
            self.state.cache.borrow_mut().insert(path, module);
            return Ok(value);
        }
        self.evaluate_commonjs(&path, ctx)
    }

    /// Maps a specifier to a file, without loading it.
    pub fn resolve(&self, specifier: &str, from_dir: &Path) -> Option<PathBuf> {
        let is_path = specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
            || Path::new(specifier).is_absolute();
        if is_path {
            return resolve_candidate(&from_dir.join(specifier));
        }
        from_dir
            .ancestors()
            .find_map(|dir| resolve_candidate(&dir.join("node_modules").join(specifier)))
    }

    /// A `require` function resolving relative specifiers from `dir`.
    pub fn require_function(&self, realm: &Realm, dir: PathBuf) -> JsValue {
        let loader = self.clone();
        let require = realm.new_plugin_function("require", move |ctx, _this, args| {
            let specifier = match args.first() {
                Some(JsValue::String(s)) => s.clone(),
                Some(other) => {
                    return Err(JErrorType::TypeError(format!(
                        "The \"id\" argument must be of type string. Received {}",
                        to_js_string(ctx, other)?
                    )))
                }
                None => {
                    return Err(JErrorType::TypeError(
                        "The \"id\" argument must be of type string. Received undefined".to_string(),
                    ))
                }
            };
            loader
                .load_from(&specifier, &dir, ctx)
                .map_err(|e| e.into_script_error(&ctx.realm))
        });
        if let JsValue::Object(o) = &require {
            let loader = self.clone();
            let base = self.base_dir().to_path_buf();
            let resolve = realm.new_plugin_function("resolve", move |ctx, _this, args| {
                let specifier = to_js_string(ctx, &args.first().cloned().unwrap_or(JsValue::Undefined))?;
                match loader.resolve(&specifier, &base) {
                    Some(path) => Ok(JsValue::String(path.display().to_string())),
                    None => Err(ModuleError::NotFound {
                        specifier,
                        from: base.clone(),
                    }
                    .into_script_error(&ctx.realm)),
                }
            });
            o.borrow_mut().set_own("resolve", resolve);
        }
        require
    }

    fn builtin(&self, name: &str, ctx: &mut EvalContext) -> JsValue {
        if let Some(module) = self.state.builtins.borrow().get(name) {
            return module.clone();
        }
        let module = node_builtins::create(name, &ctx.realm, self.base_dir());
        self.state.builtins.borrow_mut().insert(name.to_string(), module.clone());
        module
    }

    fn evaluate_commonjs(&self, path: &Path, ctx: &mut EvalContext) -> Result<JsValue, ModuleError> {
        let source = fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = strip_shebang(&source);
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.base_dir().to_path_buf());

        let realm = ctx.realm.clone();
        let exports = JsValue::Object(realm.new_object());
        let module = realm.new_object_from(vec![
            ("id", JsValue::String(path.display().to_string())),
            ("filename", JsValue::String(path.display().to_string())),
            ("exports", exports.clone()),
        ]);
        // Registered before evaluation so require cycles see partial exports.
        self.state.cache.borrow_mut().insert(path.to_path_buf(), module.clone());

        let scope = LexEnvironment::new_function_scope(None);
        {
            let mut scope = scope.borrow_mut();
            scope.declare("module", module.clone(), true);
            scope.declare("exports", exports.clone(), true);
            scope.declare("require", self.require_function(&realm, dir.clone()), true);
            scope.declare("__filename", JsValue::String(path.display().to_string()), true);
            scope.declare("__dirname", JsValue::String(dir.display().to_string()), true);
        }
        let saved_env = std::mem::replace(&mut ctx.lex_env, scope);
        let saved_this = std::mem::replace(&mut ctx.this_value, exports);
        let result = eval_script(source, ctx);
        ctx.lex_env = saved_env;
        ctx.this_value = saved_this;

        if let Err(source) = result {
            self.state.cache.borrow_mut().remove(path);
            return Err(ModuleError::Evaluation {
                path: path.to_path_buf(),
                source,
            });
        }
        exports_of(ctx, &module, path)
    }
}

impl ModuleLoader for NodeModuleLoader {
    fn load(&self, specifier: &str, ctx: &mut EvalContext) -> Result<JsValue, ModuleError> {
        let base = self.base_dir().to_path_buf();
        self.load_from(specifier, &base, ctx)
    }
}

fn exports_of(ctx: &mut EvalContext, module: &JsValue, path: &Path) -> Result<JsValue, ModuleError> {
    get_property(ctx, module, "exports").map_err(|source| ModuleError::Evaluation {
        path: path.to_path_buf(),
        source,
    })
}

fn strip_shebang(source: &str) -> &str {
    if source.starts_with("#!") {
        source.find('\n').map(|i| &source[i..]).unwrap_or("")
    } else {
        source
    }
}

fn with_extension_appended(path: &Path, extension: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(extension);
    PathBuf::from(s)
}

fn resolve_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    [".js", ".json"]
        .iter()
        .map(|ext| with_extension_appended(path, ext))
        .find(|p| p.is_file())
}

fn resolve_directory(dir: &Path) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }
    let main = fs::read_to_string(dir.join("package.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|json| json.get("main").and_then(|m| m.as_str()).map(str::to_string));
    if let Some(main) = main {
        let target = dir.join(main);
        if let Some(found) = resolve_file(&target).or_else(|| index_of(&target)) {
            return Some(found);
        }
    }
    index_of(dir)
}

fn index_of(dir: &Path) -> Option<PathBuf> {
    ["index.js", "index.json"]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

fn resolve_candidate(path: &Path) -> Option<PathBuf> {
    resolve_file(path).or_else(|| resolve_directory(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shebang_lines_are_dropped() {
        assert_eq!(strip_shebang("#!/usr/bin/env node\nmodule.exports = 1"), "\nmodule.exports = 1");
        assert_eq!(strip_shebang("#!only"), "");
        assert_eq!(strip_shebang("exports.a = 1"), "exports.a = 1");
    }

    #[test]
    fn extensions_are_appended_not_replaced() {
        assert_eq!(
            with_extension_appended(Path::new("/x/lodash.merge"), ".js"),
            PathBuf::from("/x/lodash.merge.js")
        );
    }

    #[test]
    fn missing_modules_are_errors() {
        let dir = std::env::temp_dir().join("atjs-no-such-dir");
        let loader = NodeModuleLoader::new(&dir);
        let mut ctx = EvalContext::new();
        match loader.load("definitely-not-installed", &mut ctx) {
            Err(ModuleError::NotFound { specifier, .. }) => assert_eq!(specifier, "definitely-not-installed"),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }
}
