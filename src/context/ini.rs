//! Windows-style INI decoder.
//!
//! Sections become nested mappings one level deep. Keys that appear before
//! the first header belong to the default section, which is also what an
//! explicit `[DEFAULT]` header selects:
//!
//! ```ini
//! log_dir = /var/log
//!
//! [nginx]
//! hostname = localhost
//! ```
//!
//! decodes to
//!
//! ```json
//! { "DEFAULT": { "log_dir": "/var/log" },
//!   "nginx":   { "log_dir": "/var/log", "hostname": "localhost" } }
//! ```
//!
//! Default keys are inherited by every named section; a section's own keys win.

use serde_json::Value;
use std::collections::HashSet;

use super::Context;

/// Name of the section holding keys outside any `[section]`.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Clone, Copy)]
enum Target {
    Default,
    Section(usize),
}

/// Decode INI text. Errors carry the 1-based line number.
pub fn parse_ini(raw: &str) -> Result<Context, String> {
    let mut defaults = Context::new();
    let mut sections: Vec<(String, Context)> = Vec::new();
    let mut seen = HashSet::new();

    let mut target = Target::Default;
    // Key of the value being built and the indent of its line
    let mut last_key: Option<(String, usize)> = None;

    for (idx, line) in raw.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            last_key = None;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        if let Some((key, key_indent)) = &last_key {
            if indent > *key_indent {
                let section = match target {
                    Target::Default => &mut defaults,
                    Target::Section(i) => &mut sections[i].1,
                };
                if let Some(Value::String(existing)) = section.get_mut(key) {
                    if !existing.is_empty() {
                        existing.push('\n');
                    }
                    existing.push_str(trimmed);
                }
                continue;
            }
        }

        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            let name = header.trim();
            if name.is_empty() {
                return Err(format!("line {lineno}: empty section name"));
            }
            last_key = None;
            if name == DEFAULT_SECTION {
                target = Target::Default;
                continue;
            }
            if !seen.insert(name.to_string()) {
                return Err(format!("line {lineno}: section '{name}' already exists"));
            }
            sections.push((name.to_string(), Context::new()));
            target = Target::Section(sections.len() - 1);
            continue;
        }

        let Some(split_at) = trimmed.find(['=', ':']) else {
            return Err(format!("line {lineno}: expected 'key = value', found '{trimmed}'"));
        };
        let key = trimmed[..split_at].trim();
        let value = trimmed[split_at + 1..].trim();
        if key.is_empty() {
            return Err(format!("line {lineno}: missing key before '{}'", &trimmed[split_at..]));
        }

        let section = match target {
            Target::Default => &mut defaults,
            Target::Section(i) => &mut sections[i].1,
        };
        section.insert(key.to_string(), Value::String(value.to_string()));
        last_key = Some((key.to_string(), indent));
    }

    let mut context = Context::new();
    if !defaults.is_empty() {
        context.insert(DEFAULT_SECTION.to_string(), Value::Object(defaults.clone()));
    }
    for (name, own) in sections {
        let mut merged = defaults.clone();
        for (key, value) in own {
            merged.insert(key, value);
        }
        context.insert(name, Value::Object(merged));
    }

    Ok(context)
}
