//! Configuration for j2cli.
//!
//! j2cli has one optional configuration file holding user-wide defaults for
//! command-line flags. See [`global`] for its location and keys.
//!
//! Flags given on the command line always win over the file.

pub mod global;

pub use global::{CONFIG_PATH_ENV, GlobalConfig};
