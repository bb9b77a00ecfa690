//! Common test utilities for j2cli integration tests

// Not every test module uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory the `j2` binary runs in.
///
/// The binary gets an empty environment apart from `HOME` (pointing into the
/// scratch directory, so no real defaults file is picked up) and `NO_COLOR`.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    home_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project_dir = temp_dir.path().join("project");
        let home_dir = temp_dir.path().join("home");
        fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        fs::create_dir_all(&home_dir).expect("Failed to create home dir");

        Self {
            _temp_dir: temp_dir,
            project_dir,
            home_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.project_dir
    }

    pub fn home_path(&self) -> &Path {
        &self.home_dir
    }

    /// Write a file relative to the project directory.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        j2cli::test_utils::write_file(&self.project_dir, name, content)
    }

    /// Write a file relative to the fake home directory.
    pub fn write_home(&self, name: &str, content: &str) -> PathBuf {
        j2cli::test_utils::write_file(&self.home_dir, name, content)
    }

    /// `j2` with a clean environment, run in the project directory.
    pub fn j2(&self) -> Command {
        let mut cmd = Command::cargo_bin("j2").expect("j2 binary");
        cmd.current_dir(&self.project_dir)
            .env_clear()
            .env("HOME", &self.home_dir)
            .env("NO_COLOR", "1");
        cmd
    }

    /// Run `j2` with `args` and return stdout, asserting success.
    pub fn render(&self, args: &[&str]) -> String {
        let output = self.j2().args(args).assert().success();
        String::from_utf8_lossy(&output.get_output().stdout).into_owned()
    }
}

/// File assertion helpers
pub struct FileAssert;

impl FileAssert {
    /// Assert a file does not exist
    pub fn not_exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected file to not exist: {}", path.display());
    }

    /// Assert a file has exact content
    pub fn equals(path: impl AsRef<Path>, expected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert_eq!(content, expected, "File {} content mismatch", path.display());
    }
}

pub const NGINX_TEMPLATE: &str = "\
server {
  listen 80;
  server_name {{ nginx.hostname }};

  root {{ nginx.webroot }};
  index index.htm;

  access_log {{ nginx.logs }}/http.access.log combined;
  error_log  {{ nginx.logs }}/http.error.log;
}
";

pub const NGINX_RENDERED: &str = "\
server {
  listen 80;
  server_name localhost;

  root /var/www/project;
  index index.htm;

  access_log /var/log/nginx/http.access.log combined;
  error_log  /var/log/nginx/http.error.log;
}
";
