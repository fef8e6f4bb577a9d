//! atjs: pipe data through JavaScript expressions.
//!
//! ```bash
//! echo '[1, 2, 3]' | atjs map 'n => n * 2'
//! echo '{"a": {"b": 1}}' | atjs run '$it + 1' --target .a.b
//! git log --format=%s | atjs split | atjs map .toUpperCase() | atjs join
//! ```

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use atjs::config::EngineConfig;
use atjs::engine::{commands, EngineError, Sandbox};

#[derive(Parser)]
#[command(name = "atjs", version, about = "Pipe data through JavaScript expressions")]
struct Cli {
    /// Directory modules are resolved from (defaults to the current one).
    #[arg(long, global = true, env = "ATJS_CWD")]
    cwd: Option<PathBuf>,

    /// Force styled output from the color helpers.
    #[arg(long, global = true, overrides_with = "no_color")]
    color: bool,

    /// Make the color helpers return plain text.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an expression; functions are called with the input.
    #[command(name = "run", visible_alias = "@")]
    Run {
        expression: String,
        /// Apply the function at these locations of the input instead.
        #[arg(long, short)]
        target: Option<String>,
    },
    /// Call a function for each item of a JSON array and print the results.
    Map { expression: String },
    /// Call a function for each item of a JSON array.
    ForEach { expression: String },
    /// Join the items of a JSON array into text.
    Join { delimiter: Option<String> },
    /// Split text into a JSON array.
    Split { delimiter: Option<String> },
    /// Evaluate an expression and print it, without reading stdin.
    Log { expression: String },
}

fn read_stdin() -> Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut input = String::new();
    stdin
        .lock()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(Some(input))
}

fn require_input(input: Option<String>, command: &str) -> Result<String> {
    input.ok_or_else(|| anyhow!("`atjs {}` reads its input from stdin", command))
}

/// Script values are not `Send`, so engine errors are flattened to text.
fn engine_error(error: EngineError) -> anyhow::Error {
    anyhow!("{}", error)
}

fn run(cli: Cli) -> Result<Option<String>> {
    let mut config = EngineConfig::from_env().context("failed to read the current directory")?;
    if let Some(cwd) = cli.cwd {
        config.working_dir = cwd;
    }
    if cli.color {
        config.color = true;
    }
    if cli.no_color {
        config.color = false;
    }
    let mut sandbox = Sandbox::new(&config);

    let output = match cli.command {
        Command::Run { expression, target } => {
            let input = read_stdin()?;
            commands::run(&mut sandbox, &expression, input.as_deref(), target.as_deref())
                .map(Some)
        }
        Command::Map { expression } => {
            let input = require_input(read_stdin()?, "map")?;
            commands::map(&mut sandbox, &expression, &input).map(Some)
        }
        Command::ForEach { expression } => {
            let input = require_input(read_stdin()?, "for-each")?;
            commands::for_each(&mut sandbox, &expression, &input).map(|_| None)
        }
        Command::Join { delimiter } => {
            let input = require_input(read_stdin()?, "join")?;
            commands::join(&mut sandbox, &input, delimiter.as_deref()).map(Some)
        }
        Command::Split { delimiter } => {
            let input = require_input(read_stdin()?, "split")?;
            commands::split(&mut sandbox, &input, delimiter.as_deref()).map(Some)
        }
        Command::Log { expression } => commands::log(&mut sandbox, &expression).map(Some),
    };
    output.map_err(engine_error)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).without_time().with_target(false))
        .with(EnvFilter::try_from_env("ATJS_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(Some(output)) => {
            let mut stdout = io::stdout().lock();
            // Ignores EPIPE from a downstream reader that exited early.
            let _ = writeln!(stdout, "{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{:#}", error);
            ExitCode::FAILURE
        }
    }
}
