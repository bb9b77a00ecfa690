//! Test utilities for j2cli
//!
//! Helpers shared by unit tests and, through the `test-utils` feature, by the
//! integration tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use j2cli::test_utils::{env_snapshot, init_test_logging, write_file};
//! use tempfile::TempDir;
//!
//! init_test_logging(None);
//! let temp = TempDir::new().unwrap();
//! let data = write_file(temp.path(), "data.json", r#"{"name": "world"}"#);
//! let env = env_snapshot(&[("HOME", "/home/test")]);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::context::EnvSnapshot;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, tests run
/// without a subscriber.
///
/// ```bash
/// RUST_LOG=j2cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer() // Important: uses test-compatible writer
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create {}: {e}", parent.display()));
    }
    std::fs::write(&path, content)
        .unwrap_or_else(|e| panic!("Failed to write {}: {e}", path.display()));
    path
}

/// Environment snapshot holding exactly `vars`.
pub fn env_snapshot(vars: &[(&str, &str)]) -> EnvSnapshot {
    vars.iter().copied().collect()
}
