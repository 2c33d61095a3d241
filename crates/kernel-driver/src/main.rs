//! `kernel` - the command-line front end over the ground environment (spec §6).
//!
//! Three modes, chosen by which arguments are present:
//!
//! - `kernel script.k`: batch mode. Reads every datum out of the file, evaluates
//!   each in turn, writes its value to stdout. Stops at the first error and
//!   exits non-zero.
//! - `kernel --eval '(+ 1 2)'`: same batch semantics, sourced from the argument
//!   instead of a file.
//! - `kernel` (neither given): reads all of stdin, then evaluates datum by
//!   datum, printing each value; an evaluation error is reported to stderr and
//!   the loop moves on to the next datum rather than exiting, since an
//!   interactive session shouldn't die because one line was wrong.

use std::fs;
use std::io::{IsTerminal, Read as _};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use kernel_gc::{GcConfig, State, Unwind, Value};
use tracing_subscriber::EnvFilter;

mod config;
use config::Config;

/// A Kernel-language interpreter: REPL and script runner over the ground environment.
#[derive(Parser, Debug)]
#[command(name = "kernel-rs", version, about, long_about = None)]
struct Cli {
    /// Script file to run. Omitted to start an interactive session over stdin.
    script: Option<PathBuf>,

    /// Evaluate this text directly instead of reading a file or stdin.
    #[arg(short, long)]
    eval: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug and up).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable ANSI color in diagnostic output.
    #[arg(long)]
    no_color: bool,

    /// Cap the heap at this many live+free object slots.
    #[arg(long)]
    heap_limit: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    // A flag left at its type's default means "not passed on the command
    // line"; only then does the `KERNEL_CONFIG` value (if any) apply.
    // Anything the user actually typed on the command line wins.
    let verbose = if cli.verbose != 0 { cli.verbose } else { config.verbose.unwrap_or(0) };
    let no_color = cli.no_color || config.no_color.unwrap_or(false);
    let heap_limit = cli.heap_limit.or(config.heap_limit);

    init_logging(verbose, no_color);

    match run(cli, heap_limit) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

fn run(cli: Cli, heap_limit: Option<usize>) -> anyhow::Result<ExitCode> {
    let mut gc_config = GcConfig::default();
    if let Some(limit) = heap_limit {
        gc_config.max_objects = limit;
    }
    let mut state = State::new(gc_config, kernel_eval::eval_entry);
    let env = kernel_ground::make_ground_environment(&mut state)
        .map_err(|Unwind(v)| anyhow::anyhow!(kernel_eval::KError::from_value(&state, v).to_string()))
        .context("failed to build the ground environment")?;

    if let Some(text) = cli.eval {
        return Ok(run_forms(&mut state, env, &text, "<eval>", false));
    }
    if let Some(path) = cli.script {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path.display().to_string();
        return Ok(run_forms(&mut state, env, &text, &filename, false));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    if std::io::stdin().is_terminal() {
        eprintln!("kernel> reading from stdin, ^D to finish");
    }
    Ok(run_forms(&mut state, env, &text, "<stdin>", true))
}

/// Reads every datum out of `source` up front via [`kernel_syntax::Reader::read_all`]
/// (the reader holds an exclusive borrow of `state` for its own lifetime, so
/// interleaving single `read`s with evaluation against the same state isn't an
/// option here — collecting the whole form list first, then evaluating each
/// one against a free `state`, is the shape `kernel_ground::lib`'s own
/// smoke test already uses this API for).
///
/// A malformed datum anywhere in `source` fails the whole read and is fatal
/// regardless of `resume_on_error`, since there's no well-defined place to
/// resume reading from after a syntax error. Evaluation errors, by contrast,
/// only abort the remaining forms when `resume_on_error` is false.
fn run_forms(state: &mut State, env: Value, source: &str, filename: &str, resume_on_error: bool) -> ExitCode {
    let forms = {
        let mut reader = kernel_syntax::Reader::new(state, source, filename.to_string());
        match reader.read_all() {
            Ok(forms) => forms,
            Err(e) => {
                eprintln!("read error: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    for form in forms {
        match kernel_eval::run(state, form, env) {
            Ok(v) => println!("{}", kernel_syntax::write(state, v)),
            Err(Unwind(err_value)) => {
                let err = kernel_eval::KError::from_value(state, err_value);
                eprintln!("error: {err}");
                if !resume_on_error {
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}
