//! Error handling for j2cli
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`J2Error`]) inside the library, one variant per
//!    failure class of a render run
//! 2. **User-friendly messages** ([`ErrorContext`]) at the CLI boundary, with
//!    details and an actionable suggestion
//!
//! Every error is terminal for the run. Rendering is deterministic given its
//! inputs, so nothing is retried; the caller fixes the inputs and re-invokes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use j2cli::core::{J2Error, user_friendly_error};
//!
//! let error = J2Error::UnknownFormatError {
//!     source_name: "settings.conf".to_string(),
//!     reason: "unrecognized extension '.conf'".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::templating::{RenderError, RenderErrorKind};

/// The main error type for j2cli operations.
///
/// # Error Categories
///
/// - [`DecodeError`] - a data source does not parse under its format
/// - [`UnknownFormatError`] - no format given and none could be inferred
/// - [`MergeError`] - a source cannot be attached to the context (bad mount path)
/// - [`HookError`] - a customization hook failed to load or run
/// - [`RenderError`] - the template engine reported a failure
/// - [`ConfigError`] - the defaults file or the command line is inconsistent
///
/// [`DecodeError`]: J2Error::DecodeError
/// [`UnknownFormatError`]: J2Error::UnknownFormatError
/// [`MergeError`]: J2Error::MergeError
/// [`HookError`]: J2Error::HookError
/// [`RenderError`]: J2Error::RenderError
/// [`ConfigError`]: J2Error::ConfigError
#[derive(Error, Debug)]
pub enum J2Error {
    /// A data source's content does not parse under its declared or inferred format.
    ///
    /// No partial context is ever used; the whole run aborts.
    #[error("Failed to decode {source_name} as {format}: {reason}")]
    DecodeError {
        /// Source identity (file path, `<stdin>` or `<environment>`)
        source_name: String,
        /// Format tag that was applied
        format: String,
        /// Underlying parser message
        reason: String,
    },

    /// The format could not be inferred and was not given explicitly.
    #[error("Cannot determine the data format of {source_name}: {reason}")]
    UnknownFormatError {
        source_name: String,
        reason: String,
    },

    /// A source could not be attached to the context.
    #[error("Cannot merge data source {source_name}: {reason}")]
    MergeError {
        source_name: String,
        reason: String,
    },

    /// A customization hook failed while loading or executing.
    #[error("Customization hook '{hook}' failed: {reason}")]
    HookError {
        /// Hook identity (hook file path or hook point name)
        hook: String,
        reason: String,
    },

    /// The template engine reported a failure.
    #[error(transparent)]
    RenderError(#[from] RenderError),

    /// Defaults file or command-line options are invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// A file could not be read or written.
    #[error("File system error: {operation} '{path}': {reason}")]
    FileSystemError {
        operation: String,
        path: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl Clone for J2Error {
    fn clone(&self) -> Self {
        match self {
            Self::DecodeError {
                source_name,
                format,
                reason,
            } => Self::DecodeError {
                source_name: source_name.clone(),
                format: format.clone(),
                reason: reason.clone(),
            },
            Self::UnknownFormatError {
                source_name,
                reason,
            } => Self::UnknownFormatError {
                source_name: source_name.clone(),
                reason: reason.clone(),
            },
            Self::MergeError {
                source_name,
                reason,
            } => Self::MergeError {
                source_name: source_name.clone(),
                reason: reason.clone(),
            },
            Self::HookError {
                hook,
                reason,
            } => Self::HookError {
                hook: hook.clone(),
                reason: reason.clone(),
            },
            Self::RenderError(e) => Self::RenderError(e.clone()),
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::FileSystemError {
                operation,
                path,
                reason,
            } => Self::FileSystemError {
                operation: operation.clone(),
                path: path.clone(),
                reason: reason.clone(),
            },
            // io::Error is not Clone; keep the kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying user-facing details and a suggestion.
///
/// ```rust,no_run
/// use j2cli::core::{ErrorContext, J2Error};
///
/// let context = ErrorContext::new(J2Error::Other { message: "boom".to_string() })
///     .with_suggestion("Run again with -vv to see the decoded context")
///     .with_details("The template could not be rendered");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: J2Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: J2Error) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error (shown in green).
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error (shown in yellow).
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// [`J2Error`] variants get tailored suggestions; an [`ErrorContext`] already
/// attached to the error chain is passed through; anything else is reported
/// with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(context) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            error: context.error.clone(),
            suggestion: context.suggestion.clone(),
            details: context.details.clone(),
        };
    }

    if let Some(j2_error) = error.downcast_ref::<J2Error>() {
        return create_error_context(j2_error.clone());
    }

    if let Some(render_error) = error.downcast_ref::<RenderError>() {
        return create_error_context(J2Error::RenderError(render_error.clone()));
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(J2Error::IoError(std::io::Error::new(
                io_error.kind(),
                io_error.to_string(),
            )))
            .with_suggestion("Check file ownership and permissions of the template, data and output paths");
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(J2Error::Other {
        message,
    })
}

/// Map each [`J2Error`] variant to details and a suggestion.
fn create_error_context(error: J2Error) -> ErrorContext {
    match &error {
        J2Error::DecodeError {
            format,
            ..
        } => {
            let suggestion = match format.as_str() {
                "json" => "Check the JSON syntax: quotes around keys, commas between members, no trailing commas",
                "yaml" => "Check the YAML indentation and that the document is a mapping at the top level",
                "ini" => "Every key must sit inside a [section] or before the first header, one 'key = value' per line",
                "env" => "Use one KEY=VALUE assignment per line",
                _ => "Check that the file content matches its format, or pass the format explicitly with --format",
            };
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("The data source was rejected as a whole; no partial context is rendered")
        }
        J2Error::UnknownFormatError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion(
                "Name the format explicitly, e.g. 'data.conf:ini', or pass --format / --fallback-format",
            )
            .with_details(
                "Formats are inferred from the extensions .json, .yaml, .yml, .ini and .env",
            ),
        J2Error::MergeError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Mount paths are dotted keys without empty segments, e.g. 'app.database'"),
        J2Error::HookError {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Check the hook file: every filter, test and function must be a valid template expression",
        ),
        J2Error::RenderError(render) => {
            let details = render.format_with_context();
            let suggestion = match render.kind {
                RenderErrorKind::UndefinedVariable => {
                    "Provide the missing value in a data source, or relax the policy with --undefined=normal"
                }
                RenderErrorKind::Syntax => {
                    "Check template syntax: variables use {{ var }}, comments use {# #}, control flow uses {% %}"
                }
                RenderErrorKind::Runtime => {
                    "Check the arguments passed to filters, tests and functions in the template"
                }
            };
            ErrorContext::new(error).with_details(details).with_suggestion(suggestion)
        }
        J2Error::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Check the command-line flags and the j2cli config file (J2CLI_CONFIG_PATH)",
        ),
        J2Error::FileSystemError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the path exists and is readable (or writable for -o)"),
        J2Error::IoError(_)
        | J2Error::Other {
            ..
        } => ErrorContext::new(error),
    }
}
