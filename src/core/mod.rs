//! Core types for j2cli
//!
//! - [`J2Error`] - the error taxonomy of a render run
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any error into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, J2Error, user_friendly_error};

/// Result alias used across the library.
pub type Result<T, E = J2Error> = std::result::Result<T, E>;
