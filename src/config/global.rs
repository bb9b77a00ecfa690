//! User-wide defaults for j2cli.
//!
//! The defaults file is optional TOML. It is looked up in this order:
//!
//! 1. the `--config PATH` flag
//! 2. the `J2CLI_CONFIG_PATH` environment variable
//! 3. `~/.j2cli/config.toml`
//!
//! A missing file at the default location is the same as an empty file. A file
//! named through the flag or the variable must exist.
//!
//! ```toml
//! undefined = "normal"
//! no_compact = false
//! fallback_format = "ini"
//! ignore_missing = true
//! filters = ["~/.j2cli/filters.toml"]
//! tests = []
//! customize = "customize.toml"
//! ```
//!
//! Relative hook paths are resolved against the directory holding the file,
//! and a leading `~` is expanded.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::context::{EnvSnapshot, FormatTag};
use crate::core::{J2Error, Result};
use crate::templating::UndefinedPolicy;

/// Environment variable naming the defaults file.
pub const CONFIG_PATH_ENV: &str = "J2CLI_CONFIG_PATH";

/// Defaults applied beneath the command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    pub undefined: Option<UndefinedPolicy>,
    pub no_compact: Option<bool>,
    pub fallback_format: Option<String>,
    pub ignore_missing: Option<bool>,
    pub filters: Vec<PathBuf>,
    pub tests: Vec<PathBuf>,
    pub customize: Option<PathBuf>,
}

impl GlobalConfig {
    /// Default location of the defaults file.
    ///
    /// # Errors
    ///
    /// Returns [`J2Error::ConfigError`] when the home directory is unknown.
    pub fn default_path(env: &EnvSnapshot) -> Result<PathBuf> {
        let home = env.home_dir().ok_or_else(|| J2Error::ConfigError {
            message: "Unable to determine home directory".to_string(),
        })?;
        Ok(home.join(".j2cli").join("config.toml"))
    }

    /// Load the defaults for this run.
    ///
    /// `explicit` comes from `--config`. Only the environment snapshot is
    /// consulted for `J2CLI_CONFIG_PATH`.
    pub fn load(explicit: Option<&Path>, env: &EnvSnapshot) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path, env);
        }
        if let Some(path) = env.get(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Self::load_from(Path::new(path), env);
        }

        match Self::default_path(env) {
            Ok(path) if path.exists() => Self::load_from(&path, env),
            Ok(path) => {
                tracing::trace!("No defaults file at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                tracing::debug!("Skipping defaults file: {e}");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a defaults file that must exist.
    ///
    /// `~` in hook paths expands to the home directory of `env`.
    pub fn load_from(path: &Path, env: &EnvSnapshot) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| J2Error::ConfigError {
            message: format!("Failed to read config from {}: {e}", path.display()),
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| J2Error::ConfigError {
            message: format!("Failed to parse config from {}: {e}", path.display()),
        })?;

        config.fallback_format_tag().map_err(|reason| J2Error::ConfigError {
            message: format!("{}: fallback_format: {reason}", path.display()),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let home = env.home_dir();
        let resolve = |p: &PathBuf| resolve_relative(base, p, home.as_deref());
        config.filters = config.filters.iter().map(resolve).collect();
        config.tests = config.tests.iter().map(resolve).collect();
        config.customize = config.customize.as_ref().map(resolve);

        tracing::debug!("Loaded defaults from {}", path.display());
        Ok(config)
    }

    /// The `fallback_format` key as a tag.
    pub fn fallback_format_tag(&self) -> std::result::Result<Option<FormatTag>, String> {
        self.fallback_format.as_deref().map(str::parse::<FormatTag>).transpose()
    }
}

fn resolve_relative(base: &Path, path: &Path, home: Option<&Path>) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde_with_context(&*raw, || home.map(|h| h.display().to_string()));
    let expanded = PathBuf::from(expanded.into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
