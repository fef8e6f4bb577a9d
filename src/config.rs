//! Engine configuration.

use std::env;
use std::io;
use std::path::PathBuf;

/// Settings one evaluation runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Root of module resolution and `process.cwd()`.
    pub working_dir: PathBuf,
    /// Whether the styling helpers emit ANSI escapes.
    pub color: bool,
    /// Becomes `process.argv`.
    pub argv: Vec<String>,
}

impl EngineConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            working_dir: working_dir.into(),
            color: true,
            argv: vec![],
        }
    }

    /// Current directory, process arguments and the `NO_COLOR` /
    /// `FORCE_COLOR` conventions.
    pub fn from_env() -> io::Result<Self> {
        Ok(EngineConfig {
            working_dir: env::current_dir()?,
            color: color_from_env(env::var("NO_COLOR").ok(), env::var("FORCE_COLOR").ok()),
            argv: env::args().collect(),
        })
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }
}

fn color_from_env(no_color: Option<String>, force_color: Option<String>) -> bool {
    match force_color.as_deref() {
        Some("0") | Some("false") => return false,
        Some(_) => return true,
        None => {}
    }
    !no_color.map_or(false, |v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_defaults_on() {
        assert!(color_from_env(None, None));
        assert!(color_from_env(Some(String::new()), None));
    }

    #[test]
    fn no_color_and_force_color() {
        assert!(!color_from_env(Some("1".into()), None));
        assert!(color_from_env(Some("1".into()), Some("1".into())));
        assert!(!color_from_env(None, Some("0".into())));
    }
}
