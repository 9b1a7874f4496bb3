//! Environment configuration.
//!
//! Settings come from process environment variables, optionally seeded from
//! a `.env` file with [`load_env_file`]. Variables already present in the
//! environment win over the file.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File read by [`load_env_file`] when no path is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const REDIS_HOST: &str = "REDIS_HOST";
pub const REDIS_PORT: &str = "REDIS_PORT";
pub const REDIS_DB: &str = "REDIS_DB";
pub const REDIS_USERNAME: &str = "REDIS_USERNAME";
pub const REDIS_PASSWORD: &str = "REDIS_PASSWORD";
pub const REDIS_POOL_SIZE: &str = "REDIS_POOL_SIZE";
pub const REDIS_CONNECT_TIMEOUT_SECS: &str = "REDIS_CONNECT_TIMEOUT_SECS";

/// Source of configuration variables.
///
/// Implemented for any `Fn(&str) -> Option<String>`, so tests can pass a
/// closure over a map instead of touching the process environment.
pub trait EnvLookup {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> EnvLookup for F {
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Read a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Load variables from a `.env` file into the process environment.
///
/// # Errors
/// Returns `Error::ConfigError` if the file is missing or malformed.
pub fn load_env_file(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));

    dotenvy::from_path(path).map_err(|e| {
        error!("Error loading {}: {}", path.display(), e);
        Error::ConfigError(format!("Error loading {}: {}", path.display(), e))
    })?;

    info!("✓ Loaded environment from {}", path.display());
    Ok(path.to_path_buf())
}

/// Non-empty value of `name`, if set.
pub fn string_var<L: EnvLookup + ?Sized>(lookup: &L, name: &str) -> Option<String> {
    lookup
        .lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `name`, falling back to `default` when unset or empty.
///
/// # Errors
/// Returns `Error::ConfigError` naming the variable if the value does not parse.
pub fn parse_var<T, L>(lookup: &L, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    L: EnvLookup + ?Sized,
{
    match string_var(lookup, name) {
        Some(raw) => raw.parse().map_err(|e| {
            Error::ConfigError(format!("Invalid value for {}: {:?} ({})", name, raw, e))
        }),
        None => Ok(default),
    }
}
