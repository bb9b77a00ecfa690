//! Template rendering for j2cli.
//!
//! Templates use the Jinja2 language through minijinja. A render run goes
//! through [`RenderPipeline`], which assembles the context, lets hooks alter
//! it and hands it to a [`TemplateRenderer`].
//!
//! # Undefined references
//!
//! [`UndefinedPolicy`] decides what happens when a template references a key
//! the context does not have:
//!
//! | Policy   | Behavior                                              |
//! |----------|-------------------------------------------------------|
//! | `strict` | rendering fails with a [`RenderError`] (default)      |
//! | `normal` | the reference renders as an empty string              |
//! | `debug`  | renders empty, one `WARN` log line per reference      |
//!
//! # Engine defaults
//!
//! - trailing newline of the template is kept
//! - `trim_blocks` and `lstrip_blocks` are on unless `--no-compact` is given
//! - `break` and `continue` are available in loops
//! - no HTML auto-escaping, whatever the template extension
//! - `{% include %}` and friends load files relative to the working directory
//!
//! # Example
//!
//! ```rust,no_run
//! use j2cli::context::{DataInput, DataSource, EnvSnapshot, FormatTag};
//! use j2cli::templating::{OutputSink, RenderPipeline, UndefinedPolicy};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = RenderPipeline::new(EnvSnapshot::capture()).with_undefined(UndefinedPolicy::Strict);
//! let sources = [DataSource::new(DataInput::File("nginx.json".into()), FormatTag::Auto)];
//! pipeline.run(
//!     Path::new("nginx.conf.j2"),
//!     &sources,
//!     None,
//!     &mut std::io::stdin(),
//!     &OutputSink::Stdout,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filters;
pub mod pipeline;
pub mod renderer;

use minijinja::UndefinedBehavior;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub use error::{RenderError, RenderErrorKind, UnresolvedReference};
pub use pipeline::{OutputSink, RenderPipeline, describe_sources};
pub use renderer::TemplateRenderer;

/// What to do with references to missing context keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedPolicy {
    /// Fail the render
    #[default]
    Strict,
    /// Render as empty
    Normal,
    /// Render as empty and log a warning per reference
    Debug,
}

impl UndefinedPolicy {
    pub fn undefined_behavior(self) -> UndefinedBehavior {
        match self {
            Self::Strict => UndefinedBehavior::Strict,
            Self::Normal => UndefinedBehavior::Lenient,
            Self::Debug => UndefinedBehavior::Chainable,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Normal => "normal",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for UndefinedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UndefinedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "normal" => Ok(Self::Normal),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown undefined policy '{other}' (expected strict, normal or debug)")),
        }
    }
}
