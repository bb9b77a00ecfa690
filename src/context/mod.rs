//! Rendering context assembly.
//!
//! A render run turns an ordered list of [`DataSource`]s into one [`Context`]:
//!
//! ```text
//! DataSource × N ──► FormatDecoder ──► Contribution × N ──► ContextMerger ──► Context
//!                                         ▲
//!             EnvSnapshot (--import-env) ─┘ (always last)
//! ```
//!
//! - [`format`] resolves format tags and decodes raw text into mappings
//! - [`env`] parses env files and holds the process environment snapshot
//! - [`ini`] parses Windows-style INI files
//! - [`merge`] squashes contributions into the final context

pub mod env;
pub mod format;
pub mod ini;
pub mod merge;

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

pub use env::{EnvSnapshot, parse_env};
pub use format::{FormatDecoder, FormatTag};
pub use merge::{Contribution, ContextMerger, squash};

/// Variables available to a template: string keys to JSON-like values.
///
/// Backed by an insertion-ordered map so iteration is deterministic.
pub type Context = serde_json::Map<String, Value>;

/// Where a data source's raw content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataInput {
    /// A file on disk
    File(PathBuf),
    /// Standard input
    Stdin,
    /// The process environment snapshot
    Environment,
}

impl fmt::Display for DataInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataInput::File(path) => write!(f, "{}", path.display()),
            DataInput::Stdin => write!(f, "<stdin>"),
            DataInput::Environment => write!(f, "<environment>"),
        }
    }
}

/// One input to be decoded and merged, in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub input: DataInput,
    pub format: FormatTag,
    /// Dotted key path the decoded mapping is attached under, instead of
    /// being squashed at the top level
    pub mount: Option<String>,
}

impl DataSource {
    pub fn new(input: DataInput, format: FormatTag) -> Self {
        Self {
            input,
            format,
            mount: None,
        }
    }

    #[must_use]
    pub fn mounted_at(mut self, mount: impl Into<String>) -> Self {
        self.mount = Some(mount.into());
        self
    }

    /// Parse a `PATH[:FORMAT[:MOUNT]]` data source argument.
    ///
    /// The argument is split from the right into at most three parts.
    /// A path of `-` or an empty path selects standard input; a format of
    /// `""` or `?` selects `default_format`.
    ///
    /// ```rust
    /// use j2cli::context::{DataInput, DataSource, FormatTag};
    ///
    /// let source = DataSource::parse_spec("data.ini::nginx", FormatTag::Auto).unwrap();
    /// assert_eq!(source.input, DataInput::File("data.ini".into()));
    /// assert_eq!(source.format, FormatTag::Auto);
    /// assert_eq!(source.mount.as_deref(), Some("nginx"));
    /// ```
    pub fn parse_spec(spec: &str, default_format: FormatTag) -> crate::core::Result<Self> {
        // NB: a Windows drive prefix is part of the path, never a separator
        let (drive, rest) = split_drive_prefix(spec);

        let mut parts: Vec<&str> = rest.rsplitn(3, ':').collect();
        parts.reverse();

        let path = format!("{}{}", drive, parts.first().copied().unwrap_or_default());
        let format = match parts.get(1).copied() {
            None | Some("") | Some("?") => default_format,
            Some(tag) => tag.parse::<FormatTag>().map_err(|reason| {
                crate::core::J2Error::UnknownFormatError {
                    source_name: path.clone(),
                    reason,
                }
            })?,
        };
        let mount = parts.get(2).filter(|m| !m.is_empty()).map(|m| (*m).to_string());

        let input = if path.is_empty() || path == "-" {
            DataInput::Stdin
        } else {
            DataInput::File(PathBuf::from(path))
        };

        Ok(Self {
            input,
            format,
            mount,
        })
    }
}

fn split_drive_prefix(spec: &str) -> (&str, &str) {
    if cfg!(windows) {
        let bytes = spec.as_bytes();
        if bytes.len() > 2
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'\\' || bytes[2] == b'/')
        {
            return spec.split_at(2);
        }
    }
    ("", spec)
}
