//! Runtime configuration for the chain engine.
//!
//! [`EngineConfig`] is normally built with [`EngineConfig::from_env`], which
//! reads:
//!
//! - `STEPCHAIN_MAX_CHAIN_DEPTH`: a positive integer, or `none`/`unbounded`
//!   to disable the limit (default 50);
//! - `STEPCHAIN_DRY_RUN`: boolean, run every step in skip mode (default off);
//! - `STEPCHAIN_EXCEPTION_PROBE`: boolean, run the exception probe after
//!   passing steps (default on).
//!
//! Unparseable values are logged and replaced with the default. Tests can
//! force dry-run mode for the current process with [`set_dry_run`].

use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

/// Default limit on chain nesting and deferred resolution.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 50;

const MAX_CHAIN_DEPTH_VAR: &str = "STEPCHAIN_MAX_CHAIN_DEPTH";
const DRY_RUN_VAR: &str = "STEPCHAIN_DRY_RUN";
const EXCEPTION_PROBE_VAR: &str = "STEPCHAIN_EXCEPTION_PROBE";

const OVERRIDE_UNSET: u8 = 0;
const OVERRIDE_FALSE: u8 = 1;
const OVERRIDE_TRUE: u8 = 2;

static DRY_RUN_OVERRIDE: AtomicU8 = AtomicU8::new(OVERRIDE_UNSET);

/// Error raised for a configuration value that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value '{value}' for {variable}: expected {expected}")]
pub struct ConfigError {
    variable: &'static str,
    value: String,
    expected: &'static str,
}

/// Settings that shape how chains are resolved.
///
/// # Examples
///
/// ```
/// use stepchain::EngineConfig;
///
/// let config = EngineConfig::default().with_max_chain_depth(Some(5));
/// assert_eq!(config.max_chain_depth(), Some(5));
/// assert!(config.exception_probe());
/// assert!(!config.dry_run());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_chain_depth: Option<usize>,
    dry_run: bool,
    exception_probe: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: Some(DEFAULT_MAX_CHAIN_DEPTH),
            dry_run: false,
            exception_probe: true,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration reading variables through `lookup`.
    ///
    /// A dry-run override set with [`set_dry_run`] takes precedence over the
    /// looked-up value.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_chain_depth = read(&lookup, MAX_CHAIN_DEPTH_VAR, parse_depth)
            .unwrap_or(defaults.max_chain_depth);
        let dry_run = dry_run_override()
            .or_else(|| read(&lookup, DRY_RUN_VAR, parse_bool))
            .unwrap_or(defaults.dry_run);
        let exception_probe =
            read(&lookup, EXCEPTION_PROBE_VAR, parse_bool).unwrap_or(defaults.exception_probe);
        Self {
            max_chain_depth,
            dry_run,
            exception_probe,
        }
    }

    /// Replace the chain depth limit; `None` removes it.
    #[must_use]
    pub const fn with_max_chain_depth(mut self, limit: Option<usize>) -> Self {
        self.max_chain_depth = limit;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enable or disable the exception probe.
    #[must_use]
    pub const fn with_exception_probe(mut self, enabled: bool) -> Self {
        self.exception_probe = enabled;
        self
    }

    /// Limit on chain nesting and deferred resolution; `None` is unbounded.
    #[must_use]
    pub const fn max_chain_depth(&self) -> Option<usize> {
        self.max_chain_depth
    }

    /// Whether every step runs in skip mode.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Whether the exception probe runs after passing steps.
    #[must_use]
    pub const fn exception_probe(&self) -> bool {
        self.exception_probe
    }
}

fn read<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
    parse: fn(&'static str, &str) -> Result<T, ConfigError>,
) -> Option<T> {
    let raw = lookup(variable)?;
    parse(variable, &raw)
        .inspect_err(|e| log::warn!("{e}; using the default"))
        .ok()
}

fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "Yes" | "on" | "ON" | "On" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off" => {
            Some(false)
        }
        _ => None,
    }
}

fn parse_bool(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    parse_env_bool(value).ok_or_else(|| ConfigError {
        variable,
        value: value.to_string(),
        expected: "a boolean such as 'true' or '0'",
    })
}

fn parse_depth(variable: &'static str, value: &str) -> Result<Option<usize>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    trimmed
        .parse::<usize>()
        .ok()
        .filter(|limit| *limit > 0)
        .map(Some)
        .ok_or_else(|| ConfigError {
            variable,
            value: value.to_string(),
            expected: "a positive integer or 'none'",
        })
}

fn dry_run_override() -> Option<bool> {
    match DRY_RUN_OVERRIDE.load(Ordering::Relaxed) {
        OVERRIDE_FALSE => Some(false),
        OVERRIDE_TRUE => Some(true),
        _ => None,
    }
}

/// Override dry-run mode for the current process.
///
/// Tests may call [`clear_dry_run_override`] to restore environment driven
/// behaviour after toggling the override.
pub fn set_dry_run(enabled: bool) {
    let value = if enabled {
        OVERRIDE_TRUE
    } else {
        OVERRIDE_FALSE
    };
    DRY_RUN_OVERRIDE.store(value, Ordering::Relaxed);
}

/// Remove any in-process override for dry-run mode.
pub fn clear_dry_run_override() {
    DRY_RUN_OVERRIDE.store(OVERRIDE_UNSET, Ordering::Relaxed);
}
