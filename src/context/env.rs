//! Environment variables as data.
//!
//! Two things live here: the env-file decoder (`KEY=VALUE` per line, the
//! output format of `env` and `export -p`), and [`EnvSnapshot`], the process
//! environment captured once at startup and threaded through the pipeline.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::Context;

/// Decode an env file into a flat string-to-string mapping.
///
/// - blank lines and lines starting with `#` are skipped
/// - lines without `=` are ignored
/// - the first `=` separates key and value, both are trimmed
/// - a leading `export ` is stripped from the key
///
/// ```rust
/// use j2cli::context::parse_env;
///
/// let ctx = parse_env("NGINX_HOSTNAME=localhost\n# comment\n\nURL=a=b\n");
/// assert_eq!(ctx["NGINX_HOSTNAME"], "localhost");
/// assert_eq!(ctx["URL"], "a=b");
/// ```
pub fn parse_env(raw: &str) -> Context {
    let mut context = Context::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let key = key.strip_prefix("export ").map(str::trim_start).unwrap_or(key);
        if key.is_empty() {
            continue;
        }

        context.insert(key.to_string(), Value::String(value.trim().to_string()));
    }

    context
}

/// Immutable copy of the process environment.
///
/// Taken once by the binary and passed explicitly to everything that needs
/// environment values (`--import-env`, the `env` filter, `sh_expandvars`), so
/// a run never reads the live environment mid-pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect::<BTreeMap<_, _>>();
        tracing::debug!("Captured {} environment variables", vars.len());
        Self {
            vars,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Home directory: `HOME` (or `USERPROFILE`) from the snapshot, else the
    /// platform lookup.
    pub fn home_dir(&self) -> Option<PathBuf> {
        ["HOME", "USERPROFILE"]
            .iter()
            .find_map(|name| self.get(name).filter(|v| !v.is_empty()))
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The snapshot as a flat context mapping.
    pub fn to_context(&self) -> Context {
        self.vars.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
