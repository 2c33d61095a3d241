//! Optional `KERNEL_CONFIG` TOML file, merged under CLI flags (spec §2).
//!
//! Every field is optional and `#[serde(default)]`s to "unset" — a config
//! file only needs to mention the settings it wants to override, and any
//! flag the user actually passed on the command line always wins over
//! whatever the file says (see [`Config::apply_to`]'s call sites in
//! `main.rs`, which only consult a config value when the matching `Cli`
//! field was left at its default).

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// The environment variable naming the config file path; absent means "no
/// config file", not an error.
pub const KERNEL_CONFIG_ENV: &str = "KERNEL_CONFIG";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Mirrors `Cli::verbose`; same 0/1/2+ meaning.
    #[serde(default)]
    pub verbose: Option<u8>,

    /// Mirrors `Cli::no_color`.
    #[serde(default)]
    pub no_color: Option<bool>,

    /// Mirrors `Cli::heap_limit`.
    #[serde(default)]
    pub heap_limit: Option<usize>,
}

impl Config {
    /// Reads `$KERNEL_CONFIG` if set, parsing its contents as TOML.
    /// Returns the default (all-`None`) config when the variable is
    /// unset; an unset or empty variable is not an error, but a variable
    /// pointing at a missing or malformed file is.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(KERNEL_CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {} (from {KERNEL_CONFIG_ENV})", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse {} as TOML", path.display()))
    }
}
