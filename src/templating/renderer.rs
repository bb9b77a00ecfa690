//! Template rendering with minijinja.
//!
//! [`TemplateRenderer`] owns one configured engine: built-in filters, hook
//! filters and tests, engine options and the undefined policy. Engine
//! failures come back as [`RenderError`]s carrying the template identity, the
//! failing line and, for unresolved references, close matches from the
//! context.

use minijinja::{AutoEscape, Environment, ErrorKind, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use strsim::levenshtein;

use super::error::{RenderError, RenderErrorKind, UnresolvedReference, extract_context_lines};
use super::{UndefinedPolicy, filters};
use crate::context::{Context, EnvSnapshot};
use crate::core::{J2Error, Result};
use crate::hooks::{EngineOptions, HookRegistry};

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Template lines shown before and after a failing line.
const ERROR_CONTEXT_LINES: usize = 2;

/// Names the engine provides without any context.
const ENGINE_GLOBALS: &[&str] = &["range", "dict", "debug", "namespace", "loop", "self"];

/// A configured template engine.
pub struct TemplateRenderer {
    env: Environment<'static>,
    policy: UndefinedPolicy,
    globals: BTreeSet<String>,
}

impl TemplateRenderer {
    /// Build an engine.
    ///
    /// Registration order: built-in filters, hook filters and tests, then
    /// each hook's `configure_engine`. Later registrations win on name
    /// clashes.
    pub fn new(
        policy: UndefinedPolicy,
        options: &EngineOptions,
        hooks: &HookRegistry,
        snapshot: Arc<EnvSnapshot>,
    ) -> Result<Self> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(options.keep_trailing_newline.unwrap_or(true));
        env.set_trim_blocks(options.trim_blocks.unwrap_or(true));
        env.set_lstrip_blocks(options.lstrip_blocks.unwrap_or(true));
        env.set_undefined_behavior(policy.undefined_behavior());
        // include/import/extend resolve against the working directory
        env.set_loader(minijinja::path_loader("."));

        if options.has_custom_syntax() {
            env.set_syntax(build_syntax(options)?);
        }

        filters::register_builtins(&mut env, snapshot);

        hooks.register_filters_and_tests(&mut env);

        hooks.configure_engine(&mut env)?;

        let globals = ENGINE_GLOBALS
            .iter()
            .chain(filters::BUILTIN_GLOBALS)
            .map(|name| (*name).to_string())
            .chain(hooks.global_names())
            .collect();

        Ok(Self {
            env,
            policy,
            globals,
        })
    }

    pub fn policy(&self) -> UndefinedPolicy {
        self.policy
    }

    /// Render `source` (identified as `name`) against `context`.
    pub fn render(
        &mut self,
        name: &str,
        source: &str,
        context: &Context,
    ) -> std::result::Result<String, RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(|e| convert_error(&e, name, source, Vec::new()))?;
        let template =
            self.env.get_template(name).map_err(|e| convert_error(&e, name, source, Vec::new()))?;

        let mut references: Vec<String> = template.undeclared_variables(true).into_iter().collect();
        references.sort();
        let unresolved: Vec<UnresolvedReference> = references
            .iter()
            .filter(|reference| !self.is_global(reference) && !resolves(context, reference))
            .map(|reference| UnresolvedReference {
                name: reference.clone(),
                suggestions: find_similar_variables(reference, &available_variables(context)),
            })
            .collect();

        if self.policy == UndefinedPolicy::Debug {
            for reference in &unresolved {
                tracing::warn!("Undefined variable '{}' in template '{}'", reference.name, name);
            }
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!("Rendering '{}' with context:", name);
            log_context_as_kv(context);
        }

        template
            .render(Value::from_serialize(context))
            .map_err(|e| convert_error(&e, name, source, unresolved))
    }

    fn is_global(&self, reference: &str) -> bool {
        let root = reference.split('.').next().unwrap_or(reference);
        self.globals.contains(root)
    }
}

fn build_syntax(options: &EngineOptions) -> Result<minijinja::syntax::SyntaxConfig> {
    fn pick(value: &Option<String>, default: &'static str) -> String {
        value.clone().unwrap_or_else(|| default.to_string())
    }

    minijinja::syntax::SyntaxConfig::builder()
        .block_delimiters(pick(&options.block_start, "{%"), pick(&options.block_end, "%}"))
        .variable_delimiters(pick(&options.variable_start, "{{"), pick(&options.variable_end, "}}"))
        .comment_delimiters(pick(&options.comment_start, "{#"), pick(&options.comment_end, "#}"))
        .build()
        .map_err(|e| J2Error::ConfigError {
            message: format!("invalid template delimiters: {e}"),
        })
}

/// Convert an engine error into a [`RenderError`].
fn convert_error(
    error: &minijinja::Error,
    name: &str,
    source: &str,
    unresolved: Vec<UnresolvedReference>,
) -> RenderError {
    let kind = match error.kind() {
        ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderErrorKind::Syntax,
        ErrorKind::UndefinedError => RenderErrorKind::UndefinedVariable,
        _ => RenderErrorKind::Runtime,
    };

    let mut message = match error.detail() {
        Some(detail) => format!("{}: {}", error.kind(), detail),
        None => error.kind().to_string(),
    };
    if kind == RenderErrorKind::UndefinedVariable && !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(|r| r.name.as_str()).collect();
        message.push_str(&format!(" ({})", names.join(", ")));
    }

    let mut cause = std::error::Error::source(error);
    while let Some(err) = cause {
        message.push_str(&format!(": {err}"));
        cause = err.source();
    }

    let line = error.line();
    let context_lines = line
        .map(|line| extract_context_lines(source, line, ERROR_CONTEXT_LINES))
        .unwrap_or_default();

    RenderError {
        template: name.to_string(),
        kind,
        message,
        line,
        context_lines,
        unresolved: if kind == RenderErrorKind::UndefinedVariable {
            unresolved
        } else {
            Vec::new()
        },
    }
}

/// Whether a dotted reference resolves in the context.
///
/// Walking stops at the first non-mapping value: attribute access on
/// sequences and scalars is left for the engine to judge.
fn resolves(context: &Context, reference: &str) -> bool {
    let mut segments = reference.split('.');
    let Some(mut current) = segments.next().and_then(|root| context.get(root)) else {
        return false;
    };
    for segment in segments {
        match current {
            serde_json::Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return false,
            },
            _ => return true,
        }
    }
    true
}

/// Every dotted key path in the context.
fn available_variables(context: &Context) -> Vec<String> {
    fn walk(prefix: &str, map: &Context, out: &mut Vec<String>) {
        for (key, value) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            if let serde_json::Value::Object(nested) = value {
                walk(&path, nested, out);
            }
            out.push(path);
        }
    }

    let mut out = Vec::new();
    walk("", context, &mut out);
    out
}

/// Find similar variable names using Levenshtein distance
fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> =
        available.iter().map(|var| (var.clone(), levenshtein(target, var))).collect();

    scored.sort_by_key(|(_, dist)| *dist);

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(var, _)| var)
        .collect()
}

/// Format the context as indented key/value lines.
fn format_context_as_string(context: &Context) -> String {
    fn format_value(key: &str, value: &serde_json::Value, indent: usize) -> Vec<String> {
        let prefix = "  ".repeat(indent);
        let mut lines = Vec::new();

        match value {
            serde_json::Value::Object(map) => {
                lines.push(format!("{}{}:", prefix, key));
                for (k, v) in map {
                    lines.extend(format_value(k, v, indent + 1));
                }
            }
            serde_json::Value::Array(arr) => {
                lines.push(format!("{}{}: [{} items]", prefix, key, arr.len()));
                // Only show first few items to avoid spam
                for (i, item) in arr.iter().take(3).enumerate() {
                    lines.extend(format_value(&format!("[{}]", i), item, indent + 1));
                }
                if arr.len() > 3 {
                    lines.push(format!("{}  ... {} more items", prefix, arr.len() - 3));
                }
            }
            serde_json::Value::String(s) => {
                if s.chars().count() > 100 {
                    let head: String = s.chars().take(97).collect();
                    lines.push(format!(
                        "{}{}: \"{}...\" ({} chars)",
                        prefix,
                        key,
                        head,
                        s.chars().count()
                    ));
                } else {
                    lines.push(format!("{}{}: \"{}\"", prefix, key, s));
                }
            }
            other => lines.push(format!("{}{}: {}", prefix, key, other)),
        }
        lines
    }

    let mut output = String::new();
    for (key, value) in context {
        output.push_str(&format_value(key, value, 1).join("\n"));
        output.push('\n');
    }
    output
}

fn log_context_as_kv(context: &Context) {
    for line in format_context_as_string(context).lines() {
        tracing::debug!("{}", line);
    }
}
