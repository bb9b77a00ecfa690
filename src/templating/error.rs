//! Structured template rendering errors.
//!
//! Engine failures are converted into a [`RenderError`] that keeps the template
//! identity, the engine message and, when the engine reports one, the failing
//! line together with a few surrounding template lines.

use std::fmt;

/// Category of a rendering failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    /// The template could not be parsed.
    Syntax,
    /// A reference did not resolve under the strict policy.
    UndefinedVariable,
    /// A filter, test or function failed, or an operation was invalid.
    Runtime,
}

/// A template reference that did not resolve, with close matches from the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub name: String,
    pub suggestions: Vec<String>,
}

/// Rendering failure reported by the template engine.
#[derive(Debug, Clone)]
pub struct RenderError {
    /// Template identity (the path as given on the command line)
    pub template: String,
    pub kind: RenderErrorKind,
    /// Engine message
    pub message: String,
    /// 1-based line number if the engine reported one
    pub line: Option<usize>,
    /// Template lines around `line`, 1-based
    pub context_lines: Vec<(usize, String)>,
    /// References missing from the context (strict failures only)
    pub unresolved: Vec<UnresolvedReference>,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RenderErrorKind::Syntax => {
                write!(f, "Template syntax error in '{}': {}", self.template, self.message)
            }
            RenderErrorKind::UndefinedVariable => {
                write!(f, "Undefined variable in template '{}': {}", self.template, self.message)
            }
            RenderErrorKind::Runtime => {
                write!(f, "Failed to render template '{}': {}", self.template, self.message)
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl RenderError {
    /// Generate a multi-line report with location, template excerpt and suggestions.
    pub fn format_with_context(&self) -> String {
        let mut msg = String::new();

        msg.push_str(&format!("Template: {}\n", self.template));
        if let Some(line) = self.line {
            msg.push_str(&format!("Line: {}\n", line));
        }

        if !self.context_lines.is_empty() {
            msg.push('\n');
            for (number, text) in &self.context_lines {
                let marker = if Some(*number) == self.line {
                    ">"
                } else {
                    " "
                };
                msg.push_str(&format!("{} {:>4} | {}\n", marker, number, text));
            }
        }

        if !self.unresolved.is_empty() {
            msg.push_str("\nUnresolved references:\n");
            for reference in &self.unresolved {
                msg.push_str(&format!("  - {}", reference.name));
                if !reference.suggestions.is_empty() {
                    msg.push_str(&format!(" (did you mean: {}?)", reference.suggestions.join(", ")));
                }
                msg.push('\n');
            }
        }

        msg
    }
}

/// Extract up to `context_size` lines before and after `error_line` (1-based).
pub(crate) fn extract_context_lines(
    content: &str,
    error_line: usize,
    context_size: usize,
) -> Vec<(usize, String)> {
    let lines: Vec<&str> = content.lines().collect();
    let total_lines = lines.len();

    if error_line == 0 || error_line > total_lines {
        return Vec::new();
    }

    let start = error_line.saturating_sub(context_size + 1);
    let end = (error_line + context_size).min(total_lines);

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(idx, line)| (start + idx + 1, line.to_string()))
        .collect()
}
