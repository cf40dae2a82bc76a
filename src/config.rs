//! Runtime configuration: TOML file defaults layered under CLI values.
//!
//! Both sources produce a [`PartialConfig`]. [`Settings::resolve`] takes each
//! value from the command line first, then the file, then the built-in
//! default, and validates the result.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default directory completed downloads land in.
pub const DEFAULT_OUTPUT_DIR: &str = "Downloads";

/// Default status board refresh interval in milliseconds.
pub const DEFAULT_DISPLAY_INTERVAL_MS: u64 = 200;

const DISPLAY_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 20..=10_000;
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A numeric value is outside its allowed range.
    #[error("invalid value for `{field}`: {value}. Expected range: {min}..={max}")]
    OutOfRange {
        /// Offending key.
        field: &'static str,
        /// Given value.
        value: u64,
        /// Lowest accepted value.
        min: u64,
        /// Highest accepted value.
        max: u64,
    },

    /// The bind address is not `host:port`.
    #[error("invalid bind address '{value}': expected IP:PORT")]
    InvalidBind {
        /// Given value.
        value: String,
    },
}

/// Log verbosity labels accepted in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Info and above.
    #[default]
    Default,
    /// Debug and above.
    Verbose,
    /// Everything, including trace.
    Debug,
    /// Errors only.
    Quiet,
}

impl Verbosity {
    /// `tracing_subscriber::EnvFilter` directive for this level.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Debug => "trace",
            Self::Quiet => "error",
        }
    }
}

/// One configuration layer; unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    /// Listen address (`IP:PORT`).
    pub bind: Option<String>,
    /// Directory downloads are written to.
    pub output_dir: Option<PathBuf>,
    /// Status board refresh interval in milliseconds.
    pub display_interval_ms: Option<u64>,
    /// Whether to draw the status board.
    pub display: Option<bool>,
    /// Download connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Download read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Log verbosity.
    pub verbosity: Option<Verbosity>,
}

impl PartialConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for bad syntax, wrong types, or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// Fully resolved settings for one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Listen address.
    pub bind: SocketAddr,
    /// Directory downloads are written to.
    pub output_dir: PathBuf,
    /// Status board refresh interval.
    pub display_interval: Duration,
    /// Whether to draw the status board.
    pub display: bool,
    /// Download connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Download read timeout in seconds.
    pub read_timeout_secs: u64,
    /// Log verbosity.
    pub verbosity: Verbosity,
}

impl Settings {
    /// Merges `cli` over `file` over defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBind`] or [`ConfigError::OutOfRange`]
    /// for values that fail validation, whichever layer they came from.
    pub fn resolve(cli: &PartialConfig, file: Option<&PartialConfig>) -> Result<Self, ConfigError> {
        let empty = PartialConfig::default();
        let file = file.unwrap_or(&empty);

        let bind_raw = cli
            .bind
            .clone()
            .or_else(|| file.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind { value: bind_raw })?;

        let display_interval_ms = check_range(
            "display_interval_ms",
            cli.display_interval_ms
                .or(file.display_interval_ms)
                .unwrap_or(DEFAULT_DISPLAY_INTERVAL_MS),
            &DISPLAY_INTERVAL_RANGE_MS,
        )?;
        let connect_timeout_secs = check_range(
            "connect_timeout_secs",
            cli.connect_timeout_secs
                .or(file.connect_timeout_secs)
                .unwrap_or(CONNECT_TIMEOUT_SECS),
            &TIMEOUT_RANGE_SECS,
        )?;
        let read_timeout_secs = check_range(
            "read_timeout_secs",
            cli.read_timeout_secs
                .or(file.read_timeout_secs)
                .unwrap_or(READ_TIMEOUT_SECS),
            &TIMEOUT_RANGE_SECS,
        )?;

        Ok(Self {
            bind,
            output_dir: cli
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            display_interval: Duration::from_millis(display_interval_ms),
            display: cli.display.or(file.display).unwrap_or(true),
            connect_timeout_secs,
            read_timeout_secs,
            verbosity: cli.verbosity.or(file.verbosity).unwrap_or_default(),
        })
    }
}

fn check_range(
    field: &'static str,
    value: u64,
    range: &std::ops::RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists.
    pub config: Option<PartialConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fetchboard/config.toml`
/// 2. `$HOME/.config/fetchboard/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fetchboard")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fetchboard")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
/// exists but cannot be used. A missing file is not an error.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

/// Reads and parses the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn load_file_config(path: &Path) -> Result<PartialConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    PartialConfig::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
