//! The `path`, `fs`, `os` and `child_process` modules, reduced to their
//! synchronous core.
//!
//! Paths are POSIX paths. Relative paths given to `fs` functions and
//! `path.resolve` are taken relative to the loader's base directory, which
//! is also the working directory of child processes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::rc::Rc;
use std::thread;
use std::time::UNIX_EPOCH;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{get_property, to_js_string};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_display_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

pub const BUILTIN_MODULES: [&str; 4] = ["path", "fs", "os", "child_process"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_MODULES.contains(&name)
}

/// Builds a fresh instance of the named built-in module.
pub fn create(name: &str, realm: &Realm, base_dir: &Path) -> JsValue {
    let base = Rc::new(base_dir.to_path_buf());
    match name {
        "path" => path_module(realm, base),
        "fs" => fs_module(realm, base),
        "os" => os_module(realm),
        "child_process" => child_process_module(realm, base),
        _ => JsValue::Undefined,
    }
}

/// `process.platform` / `os.platform()` naming.
pub fn node_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

fn method<F>(realm: &Realm, target: &JsValue, name: &str, func: F)
where
    F: Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
{
    let function = realm.new_plugin_function(name, func);
    if let JsValue::Object(o) = target {
        o.borrow_mut().set_own(name, function);
    }
}

fn string_arg(args: &[JsValue], index: usize, name: &str) -> Result<String, JErrorType> {
    match args.get(index) {
        Some(JsValue::String(s)) => Ok(s.clone()),
        other => Err(JErrorType::TypeError(format!(
            "The \"{}\" argument must be of type string. Received {}",
            name,
            other.map(to_display_string).unwrap_or_else(|| "undefined".to_string())
        ))),
    }
}

// ---------------------------------------------------------------------------
// path

pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');
    let mut parts: Vec<&str> = vec![];
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().map_or(false, |p| *p != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    let mut out = parts.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if out.is_empty() {
        out.push('.');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}

pub fn join(parts: &[String]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

pub fn resolve(base: &Path, parts: &[String]) -> String {
    let mut resolved = base.display().to_string();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        if part.starts_with('/') {
            resolved = part.clone();
        } else {
            resolved = format!("{}/{}", resolved, part);
        }
    }
    let normalized = normalize(&resolved);
    if normalized.len() > 1 {
        normalized.trim_end_matches('/').to_string()
    } else {
        normalized
    }
}

fn trim_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

pub fn dirname(path: &str) -> String {
    let path = trim_trailing_slashes(path);
    match path.rfind('/') {
        None => ".".to_string(),
        Some(0) => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

pub fn basename(path: &str, ext: Option<&str>) -> String {
    let path = trim_trailing_slashes(path);
    let base = if path == "/" {
        ""
    } else {
        path.rfind('/').map(|i| &path[i + 1..]).unwrap_or(path)
    };
    match ext {
        Some(ext) if base != ext && base.ends_with(ext) => base[..base.len() - ext.len()].to_string(),
        _ => base.to_string(),
    }
}

pub fn extname(path: &str) -> String {
    let base = basename(path, None);
    match base.rfind('.') {
        Some(i) if i > 0 => base[i..].to_string(),
        _ => String::new(),
    }
}

pub fn relative(base: &Path, from: &str, to: &str) -> String {
    let from = resolve(base, &[from.to_string()]);
    let to = resolve(base, &[to.to_string()]);
    let from_parts: Vec<&str> = from.split('/').filter(|p| !p.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').filter(|p| !p.is_empty()).collect();
    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut out: Vec<&str> = vec![".."; from_parts.len() - common];
    out.extend(&to_parts[common..]);
    out.join("/")
}

fn path_module(realm: &Realm, base: Rc<PathBuf>) -> JsValue {
    let module = JsValue::Object(realm.new_object());
    if let JsValue::Object(o) = &module {
        let mut o = o.borrow_mut();
        o.set_own("sep", JsValue::string("/"));
        o.set_own("delimiter", JsValue::string(":"));
    }

    method(realm, &module, "join", |_ctx, _this, args| {
        let parts = (0..args.len())
            .map(|i| string_arg(&args, i, "path"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JsValue::String(join(&parts)))
    });
    let resolve_base = base.clone();
    method(realm, &module, "resolve", move |_ctx, _this, args| {
        let parts = (0..args.len())
            .map(|i| string_arg(&args, i, "path"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JsValue::String(resolve(&resolve_base, &parts)))
    });
    method(realm, &module, "normalize", |_ctx, _this, args| {
        Ok(JsValue::String(normalize(&string_arg(&args, 0, "path")?)))
    });
    method(realm, &module, "dirname", |_ctx, _this, args| {
        Ok(JsValue::String(dirname(&string_arg(&args, 0, "path")?)))
    });
    method(realm, &module, "basename", |_ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        let ext = match args.get(1) {
            Some(JsValue::String(ext)) => Some(ext.as_str()),
            _ => None,
        };
        Ok(JsValue::String(basename(&path, ext)))
    });
    method(realm, &module, "extname", |_ctx, _this, args| {
        Ok(JsValue::String(extname(&string_arg(&args, 0, "path")?)))
    });
    method(realm, &module, "isAbsolute", |_ctx, _this, args| {
        Ok(JsValue::Boolean(string_arg(&args, 0, "path")?.starts_with('/')))
    });
    method(realm, &module, "relative", move |_ctx, _this, args| {
        let from = string_arg(&args, 0, "from")?;
        let to = string_arg(&args, 1, "to")?;
        Ok(JsValue::String(relative(&base, &from, &to)))
    });
    module
}

// ---------------------------------------------------------------------------
// fs

fn error_code(error: &io::Error) -> &'static str {
    match error.kind() {
        io::ErrorKind::NotFound => "ENOENT",
        io::ErrorKind::PermissionDenied => "EACCES",
        io::ErrorKind::AlreadyExists => "EEXIST",
        _ => "EIO",
    }
}

fn fs_error(realm: &Realm, error: io::Error, syscall: &str, path: &str) -> JErrorType {
    let code = error_code(&error);
    let value = realm.new_error("Error", &format!("{}: {}, {} '{}'", code, error, syscall, path));
    if let JsValue::Object(o) = &value {
        let mut o = o.borrow_mut();
        o.set_own("code", JsValue::string(code));
        o.set_own("syscall", JsValue::string(syscall));
        o.set_own("path", JsValue::string(path));
    }
    JErrorType::Thrown(value)
}

fn fs_module(realm: &Realm, base: Rc<PathBuf>) -> JsValue {
    let module = JsValue::Object(realm.new_object());

    let dir = base.clone();
    method(realm, &module, "readFileSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        let bytes = fs::read(dir.join(&path)).map_err(|e| fs_error(&ctx.realm, e, "open", &path))?;
        Ok(JsValue::String(String::from_utf8_lossy(&bytes).into_owned()))
    });
    let dir = base.clone();
    method(realm, &module, "writeFileSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "file")?;
        let data = to_js_string(ctx, &args.get(1).cloned().unwrap_or(JsValue::Undefined))?;
        fs::write(dir.join(&path), data).map_err(|e| fs_error(&ctx.realm, e, "open", &path))?;
        Ok(JsValue::Undefined)
    });
    let dir = base.clone();
    method(realm, &module, "appendFileSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        let data = to_js_string(ctx, &args.get(1).cloned().unwrap_or(JsValue::Undefined))?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&path))
            .and_then(|mut file| file.write_all(data.as_bytes()))
            .map_err(|e| fs_error(&ctx.realm, e, "open", &path))?;
        Ok(JsValue::Undefined)
    });
    let dir = base.clone();
    method(realm, &module, "existsSync", move |_ctx, _this, args| {
        Ok(JsValue::Boolean(match args.first() {
            Some(JsValue::String(path)) => dir.join(path).exists(),
            _ => false,
        }))
    });
    let dir = base.clone();
    method(realm, &module, "readdirSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        let entries = fs::read_dir(dir.join(&path)).map_err(|e| fs_error(&ctx.realm, e, "scandir", &path))?;
        let mut names = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        Ok(ctx.realm.new_array(names.into_iter().map(JsValue::String).collect()))
    });
    let dir = base.clone();
    method(realm, &module, "mkdirSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        let options = args.get(1).cloned().unwrap_or(JsValue::Undefined);
        let recursive = options.is_object() && to_boolean(&get_property(ctx, &options, "recursive")?);
        let target = dir.join(&path);
        let result = if recursive {
            fs::create_dir_all(&target)
        } else {
            fs::create_dir(&target)
        };
        result.map_err(|e| fs_error(&ctx.realm, e, "mkdir", &path))?;
        Ok(JsValue::Undefined)
    });
    let dir = base.clone();
    method(realm, &module, "unlinkSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        fs::remove_file(dir.join(&path)).map_err(|e| fs_error(&ctx.realm, e, "unlink", &path))?;
        Ok(JsValue::Undefined)
    });
    method(realm, &module, "statSync", move |ctx, _this, args| {
        let path = string_arg(&args, 0, "path")?;
        let metadata = fs::metadata(base.join(&path)).map_err(|e| fs_error(&ctx.realm, e, "stat", &path))?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as f64)
            .unwrap_or(f64::NAN);
        let stats = ctx.realm.new_object_from(vec![
            ("size", JsValue::number(metadata.len() as f64)),
            ("mtimeMs", JsValue::number(modified)),
        ]);
        let is_file = metadata.is_file();
        let is_dir = metadata.is_dir();
        method(&ctx.realm, &stats, "isFile", move |_ctx, _this, _args| Ok(JsValue::Boolean(is_file)));
        method(&ctx.realm, &stats, "isDirectory", move |_ctx, _this, _args| Ok(JsValue::Boolean(is_dir)));
        Ok(stats)
    });
    module
}

// ---------------------------------------------------------------------------
// os

fn os_module(realm: &Realm) -> JsValue {
    let module = realm.new_object_from(vec![("EOL", JsValue::string("\n"))]);
    method(realm, &module, "platform", |_ctx, _this, _args| Ok(JsValue::string(node_platform())));
    method(realm, &module, "type", |_ctx, _this, _args| {
        Ok(JsValue::string(match std::env::consts::OS {
            "macos" => "Darwin",
            "windows" => "Windows_NT",
            "linux" => "Linux",
            other => other,
        }))
    });
    method(realm, &module, "arch", |_ctx, _this, _args| {
        Ok(JsValue::string(match std::env::consts::ARCH {
            "x86_64" => "x64",
            "aarch64" => "arm64",
            "x86" => "ia32",
            other => other,
        }))
    });
    method(realm, &module, "homedir", |_ctx, _this, _args| {
        Ok(std::env::var("HOME").map(JsValue::String).unwrap_or(JsValue::Undefined))
    });
    method(realm, &module, "tmpdir", |_ctx, _this, _args| {
        Ok(JsValue::String(std::env::temp_dir().display().to_string()))
    });
    module
}

// ---------------------------------------------------------------------------
// child_process

/// `input` and `cwd` from an options object.
fn child_options(ctx: &mut EvalContext, options: Option<&JsValue>, base: &Path) -> Result<(Option<String>, PathBuf), JErrorType> {
    let options = match options {
        Some(options) if options.is_object() => options.clone(),
        _ => return Ok((None, base.to_path_buf())),
    };
    let input = match get_property(ctx, &options, "input")? {
        JsValue::Undefined | JsValue::Null => None,
        value => Some(to_js_string(ctx, &value)?),
    };
    let cwd = match get_property(ctx, &options, "cwd")? {
        JsValue::Undefined | JsValue::Null => base.to_path_buf(),
        value => base.join(to_js_string(ctx, &value)?),
    };
    Ok((input, cwd))
}

/// Runs `command` to completion, feeding it `input` on stdin.
fn run_child(command: &mut Command, input: Option<String>) -> io::Result<Output> {
    let mut child = command
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let writer = match (input, child.stdin.take()) {
        (Some(input), Some(mut stdin)) => Some(thread::spawn(move || stdin.write_all(input.as_bytes()))),
        _ => None,
    };
    let output = child.wait_with_output()?;
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
    }
    Ok(output)
}

fn status_of(output: &Output) -> JsValue {
    output
        .status
        .code()
        .map(|c| JsValue::integer(c as i64))
        .unwrap_or(JsValue::Null)
}

fn child_process_module(realm: &Realm, base: Rc<PathBuf>) -> JsValue {
    let module = JsValue::Object(realm.new_object());

    let dir = base.clone();
    method(realm, &module, "execSync", move |ctx, _this, args| {
        let command = string_arg(&args, 0, "command")?;
        let (input, cwd) = child_options(ctx, args.get(1), &dir)?;
        let output = run_child(Command::new("sh").arg("-c").arg(&command).current_dir(&cwd), input)
            .map_err(|e| fs_error(&ctx.realm, e, "spawnSync /bin/sh", &cwd.display().to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(JsValue::String(stdout));
        }
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let error = ctx
            .realm
            .new_error("Error", &format!("Command failed: {}\n{}", command, stderr));
        if let JsValue::Object(o) = &error {
            let mut o = o.borrow_mut();
            o.set_own("status", status_of(&output));
            o.set_own("stdout", JsValue::String(stdout));
            o.set_own("stderr", JsValue::String(stderr));
        }
        Err(JErrorType::Thrown(error))
    });

    method(realm, &module, "spawnSync", move |ctx, _this, args| {
        let file = string_arg(&args, 0, "file")?;
        let (argv, options) = match args.get(1) {
            Some(JsValue::Object(o)) if matches!(o.borrow().data, ObjectData::Array(_)) => {
                let items = match &o.borrow().data {
                    ObjectData::Array(items) => items.clone(),
                    _ => vec![],
                };
                (items, args.get(2))
            }
            other => (vec![], other),
        };
        let argv = argv
            .iter()
            .map(|arg| to_js_string(ctx, arg))
            .collect::<Result<Vec<_>, _>>()?;
        let (input, cwd) = child_options(ctx, options, &base)?;

        match run_child(Command::new(&file).args(&argv).current_dir(&cwd), input) {
            Ok(output) => Ok(ctx.realm.new_object_from(vec![
                ("status", status_of(&output)),
                ("stdout", JsValue::String(String::from_utf8_lossy(&output.stdout).into_owned())),
                ("stderr", JsValue::String(String::from_utf8_lossy(&output.stderr).into_owned())),
            ])),
            Err(e) => {
                let error = match fs_error(&ctx.realm, e, &format!("spawnSync {}", file), &file) {
                    JErrorType::Thrown(error) => error,
                    other => return Err(other),
                };
                Ok(ctx.realm.new_object_from(vec![
                    ("status", JsValue::Null),
                    ("error", error),
                ]))
            }
        }
    });
    module
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize("/a/b/../c/./d"), "/a/c/d");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize("a/b/"), "a/b/");
        assert_eq!(normalize(""), ".");
    }

    #[test]
    fn path_pieces() {
        assert_eq!(dirname("/a/b/c.txt"), "/a/b");
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("file"), ".");
        assert_eq!(basename("/a/b/c.txt", None), "c.txt");
        assert_eq!(basename("/a/b/c.txt", Some(".txt")), "c");
        assert_eq!(extname("archive.tar.gz"), ".gz");
        assert_eq!(extname(".bashrc"), "");
    }

    #[test]
    fn resolve_and_relative_use_the_base() {
        let base = Path::new("/work/project");
        assert_eq!(resolve(base, &["src".to_string(), "../lib".to_string()]), "/work/project/lib");
        assert_eq!(resolve(base, &["/etc".to_string(), "hosts".to_string()]), "/etc/hosts");
        assert_eq!(relative(base, "/a/b/c", "/a/d"), "../../d");
        assert_eq!(join(&["a".to_string(), "".to_string(), "b/../c".to_string()]), "a/c");
    }

    fn child_process(dir: &Path) -> (EvalContext, JsValue) {
        let ctx = EvalContext::new();
        let module = create("child_process", &ctx.realm, dir);
        (ctx, module)
    }

    fn call(ctx: &mut EvalContext, module: &JsValue, name: &str, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        let function = get_property(ctx, module, name)?;
        crate::runner::eval::function::call_function(ctx, &function, module.clone(), args)
    }

    #[test]
    fn exec_sync_returns_stdout_from_the_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let (mut ctx, module) = child_process(dir.path());
        let out = call(&mut ctx, &module, "execSync", vec![JsValue::string("cat marker.txt; echo")]).unwrap();
        assert_eq!(out, JsValue::string("here\n"));

        let options = ctx.realm.new_object_from(vec![("input", JsValue::string("b\na\n"))]);
        let out = call(&mut ctx, &module, "execSync", vec![JsValue::string("sort"), options]).unwrap();
        assert_eq!(out, JsValue::string("a\nb\n"));
    }

    #[test]
    fn exec_sync_failures_throw_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, module) = child_process(dir.path());
        let err = call(&mut ctx, &module, "execSync", vec![JsValue::string("echo oops >&2; exit 3")]).unwrap_err();
        let error = match err {
            JErrorType::Thrown(error) => error,
            other => panic!("expected a thrown error, got {}", other),
        };
        assert_eq!(get_property(&mut ctx, &error, "status").unwrap(), JsValue::integer(3));
        assert_eq!(get_property(&mut ctx, &error, "stderr").unwrap(), JsValue::string("oops\n"));
        assert_eq!(
            get_property(&mut ctx, &error, "message").unwrap(),
            JsValue::string("Command failed: echo oops >&2; exit 3\noops\n")
        );
    }

    #[test]
    fn spawn_sync_reports_instead_of_throwing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, module) = child_process(dir.path());
        let argv = ctx.realm.new_array(vec![JsValue::string("-c"), JsValue::string("printf %s \"$0\"; exit 2"), JsValue::string("x y")]);
        let result = call(&mut ctx, &module, "spawnSync", vec![JsValue::string("sh"), argv]).unwrap();
        assert_eq!(get_property(&mut ctx, &result, "status").unwrap(), JsValue::integer(2));
        assert_eq!(get_property(&mut ctx, &result, "stdout").unwrap(), JsValue::string("x y"));

        let missing = call(&mut ctx, &module, "spawnSync", vec![JsValue::string("no-such-program-here")]).unwrap();
        assert_eq!(get_property(&mut ctx, &missing, "status").unwrap(), JsValue::Null);
        let error = get_property(&mut ctx, &missing, "error").unwrap();
        assert_eq!(get_property(&mut ctx, &error, "code").unwrap(), JsValue::string("ENOENT"));
    }
}
