//! Format tags and the decoder that turns raw data into a [`Context`].

use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use super::{Context, DataInput, DataSource, EnvSnapshot, ini, parse_env};
use crate::core::{J2Error, Result};

/// Data format of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Json,
    Yaml,
    Ini,
    Env,
    /// Infer from the file extension
    Auto,
}

impl FormatTag {
    /// Every tag accepted on the command line, aliases excluded.
    pub const NAMES: [&'static str; 5] = ["json", "yaml", "ini", "env", "auto"];

    /// Infer a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "ini" => Some(Self::Ini),
            "env" => Some(Self::Env),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Ini => "ini",
            Self::Env => "env",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "ini" => Ok(Self::Ini),
            "env" => Ok(Self::Env),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown format '{other}' (expected one of: {})",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Resolves format tags and decodes data sources into mappings.
#[derive(Debug, Clone, Default)]
pub struct FormatDecoder {
    fallback: Option<FormatTag>,
    ignore_missing: bool,
}

impl FormatDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format used when `auto` inference finds nothing.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Option<FormatTag>) -> Self {
        self.fallback = fallback.filter(|tag| *tag != FormatTag::Auto);
        self
    }

    /// Treat missing data files as empty mappings.
    #[must_use]
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// Resolve the concrete format of a source without reading it.
    ///
    /// The environment snapshot is always `env`. An `auto` file source is
    /// inferred from its extension, then from the fallback format.
    pub fn resolve_format(&self, source: &DataSource) -> Result<FormatTag> {
        if source.input == DataInput::Environment {
            return Ok(FormatTag::Env);
        }
        if source.format != FormatTag::Auto {
            return Ok(source.format);
        }

        let inferred = match &source.input {
            DataInput::File(path) => FormatTag::from_path(path),
            _ => None,
        };

        inferred.or(self.fallback).ok_or_else(|| J2Error::UnknownFormatError {
            source_name: source.input.to_string(),
            reason: match &source.input {
                DataInput::File(path) => match path.extension() {
                    Some(ext) => format!("unrecognized extension '.{}'", ext.to_string_lossy()),
                    None => "the file has no extension".to_string(),
                },
                _ => "standard input has no extension to infer from".to_string(),
            },
        })
    }

    /// Read and decode one source with an already resolved format.
    pub fn load(
        &self,
        source: &DataSource,
        format: FormatTag,
        env: &EnvSnapshot,
        stdin: &mut dyn Read,
    ) -> Result<Context> {
        let source_name = source.input.to_string();
        let raw = match &source.input {
            DataInput::Environment => {
                tracing::debug!("Using {} variables from the environment snapshot", env.len());
                return Ok(env.to_context());
            }
            DataInput::Stdin => {
                let mut raw = String::new();
                stdin.read_to_string(&mut raw).map_err(|e| J2Error::FileSystemError {
                    operation: "read".to_string(),
                    path: source_name.clone(),
                    reason: e.to_string(),
                })?;
                raw
            }
            DataInput::File(path) => match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && self.ignore_missing => {
                    tracing::warn!("Data file {} not found, using empty data", path.display());
                    return Ok(Context::new());
                }
                Err(e) => {
                    return Err(J2Error::FileSystemError {
                        operation: "read data file".to_string(),
                        path: source_name,
                        reason: e.to_string(),
                    });
                }
            },
        };

        tracing::debug!("Decoding {} ({} bytes) as {}", source_name, raw.len(), format);
        self.decode(&raw, format, &source_name)
    }

    /// Decode raw text under a concrete format.
    ///
    /// The whole source either decodes into a mapping or fails; nothing is
    /// partially applied.
    pub fn decode(&self, raw: &str, format: FormatTag, source_name: &str) -> Result<Context> {
        let decode_error = |reason: String| J2Error::DecodeError {
            source_name: source_name.to_string(),
            format: format.to_string(),
            reason,
        };

        match format {
            FormatTag::Json => {
                let value: Value = serde_json::from_str(raw).map_err(|e| decode_error(e.to_string()))?;
                into_mapping(value).map_err(decode_error)
            }
            FormatTag::Yaml => {
                let mut value: serde_yaml::Value =
                    serde_yaml::from_str(raw).map_err(|e| decode_error(e.to_string()))?;
                value.apply_merge().map_err(|e| decode_error(e.to_string()))?;
                match yaml_to_json(value) {
                    Value::Null => Ok(Context::new()),
                    other => into_mapping(other).map_err(decode_error),
                }
            }
            FormatTag::Ini => ini::parse_ini(raw).map_err(decode_error),
            FormatTag::Env => Ok(parse_env(raw)),
            FormatTag::Auto => Err(J2Error::UnknownFormatError {
                source_name: source_name.to_string(),
                reason: "format must be resolved before decoding".to_string(),
            }),
        }
    }
}

fn into_mapping(value: Value) -> std::result::Result<Context, String> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("top-level value must be a mapping, found {}", type_name(&other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                // NaN and infinities have no JSON representation
                n.as_f64().and_then(serde_json::Number::from_f64).map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (yaml_key(k), yaml_to_json(v))).collect())
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_json::to_string(&yaml_to_json(other)).unwrap_or_default(),
    }
}
