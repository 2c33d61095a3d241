//! The ground environment: every native combiner a freshly-started
//! interpreter needs bound before it can run a single user form (spec
//! §4.9's "ground environment" — the root of the parent chain every other
//! environment eventually bottoms out at).
//!
//! Each sibling module owns one slice of the catalog and exposes its own
//! `install(state, env)`; [`make_ground_environment`] just runs all of
//! them over one freshly allocated environment, in dependency order
//! (`control` before `environments`/`errors`, since `$let`/`$guard` call
//! back into `control::eval_sequence`/`cond_form`).

pub mod booleans;
pub mod continuations;
pub mod control;
pub mod environments;
pub mod equivalence;
pub mod errors;
pub mod io;
pub mod numbers;
pub mod pairs;
pub mod strings;
pub mod symbols;
pub mod util;
pub mod vectors;

use kernel_gc::{KResult, State, Value};

/// Installs every ground binding into `env`, an already-allocated
/// environment with no parents (the one true root every other
/// environment in a running interpreter descends from).
pub fn install(state: &mut State, env: Value) -> KResult<()> {
    pairs::install(state, env)?;
    equivalence::install(state, env)?;
    symbols::install(state, env)?;
    booleans::install(state, env)?;
    numbers::install(state, env)?;
    strings::install(state, env)?;
    vectors::install(state, env)?;
    control::install(state, env)?;
    environments::install(state, env)?;
    continuations::install(state, env)?;
    errors::install(state, env)?;
    io::install(state, env)?;
    Ok(())
}

/// Allocates a fresh root environment and installs the full ground
/// catalog into it in one step — the entry point `kernel-driver` calls
/// once at startup.
pub fn make_ground_environment(state: &mut State) -> KResult<Value> {
    let env = kernel_env::make_environment(state, Vec::new())?;
    install(state, env)?;
    Ok(env)
}
