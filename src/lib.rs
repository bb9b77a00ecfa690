//! j2cli - Jinja2 templates on the command line
//!
//! j2cli renders a Jinja2 template against a context assembled from data
//! files, standard input and the process environment. It is typically used to
//! produce configuration files in containers and deployment scripts.
//!
//! # Architecture Overview
//!
//! A render run is a straight pipeline:
//!
//! ```text
//! DATA args ─► FormatDecoder ─► ContextMerger ─► hooks ─► minijinja ─► stdout / -o
//!                  (per source)    (ordered squash)
//! ```
//!
//! - Each data source is decoded to a mapping by its format (`json`, `yaml`,
//!   `ini`, `env`), explicit or inferred from the file extension
//! - Mappings are deep-merged in command-line order; later sources win, and a
//!   source may be mounted under a dotted key instead of the top level
//! - `--import-env` adds the environment snapshot as the last contribution
//! - Customization hooks may alter the context and extend the engine
//! - The output is written only after the whole template rendered
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line parsing and the run entry point
//! - [`config`] - Optional user-wide defaults file (`~/.j2cli/config.toml`)
//! - [`context`] - Data sources, format decoding and context merging
//! - [`core`] - Error types and user-facing error reporting
//! - [`hooks`] - Customization hook registry and TOML hook files
//! - [`templating`] - The render pipeline, engine setup and built-in filters
//!
//! # Command-Line Usage
//!
//! ```bash
//! # JSON data file
//! j2 nginx.conf.j2 nginx.json
//!
//! # YAML on standard input
//! cat nginx.yaml | j2 --format=yaml nginx.conf.j2 -
//!
//! # Environment variables as the only data
//! NGINX_HOSTNAME=localhost j2 nginx.conf.j2 > nginx.conf
//!
//! # Several sources, one of them mounted
//! j2 -o app.conf app.conf.j2 defaults.yaml site.ini::site --import-env=env
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod hooks;
pub mod templating;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
