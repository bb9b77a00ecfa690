//! Built-in filters for shell-script and container workflows.
//!
//! Registered on every engine before any user hook, so hook files can
//! override them by name.
//!
//! | Filter          | Example                                         |
//! |-----------------|-------------------------------------------------|
//! | `sh_quote`      | `{{ path \| sh_quote }}`                          |
//! | `sh_opt`        | `{{ user \| sh_opt('-u') }}` → `-u bob`           |
//! | `sh_optq`       | `{{ msg \| sh_optq('-m') }}` → `-m 'hi there'`    |
//! | `sh_which`      | `{{ 'nginx' \| sh_which }}`                       |
//! | `sh_expand`     | `{{ '~/$APP' \| sh_expand }}`                     |
//! | `sh_expanduser` | `{{ '~/logs' \| sh_expanduser }}`                 |
//! | `sh_expandvars` | `{{ '$HOME/logs' \| sh_expandvars }}`             |
//! | `sh_realpath`   | `{{ './data' \| sh_realpath }}`                   |
//! | `ifelse`        | `{{ debug \| ifelse('DEBUG', 'INFO') }}`          |
//! | `onoff`         | `{{ gzip \| onoff }}`                             |
//! | `yesno`         | `{{ enabled \| yesno }}`                          |
//! | `docker_link`   | `{{ DB_PORT \| docker_link('{addr}') }}`          |
//! | `env`           | `{{ 'HOME' \| env }}`, `{{ env('PORT', 80) }}`    |
//! | `align_suffix`  | `{{ text \| align_suffix('#') }}`                 |
//! | `ctxlookup`     | `{{ 'nginx.hostname' \| ctxlookup }}`             |
//!
//! Environment values (`env`, `sh_expand`, `sh_expandvars`) and the home
//! directory used for `~` come from the [`EnvSnapshot`] handed to [`register_builtins`], never from the live
//! process environment.

use minijinja::value::Value;
use minijinja::{Environment, Error, ErrorKind, State};
use regex::Regex;
use std::sync::{Arc, Mutex};

use crate::context::EnvSnapshot;

/// Global functions added by [`register_builtins`].
pub const BUILTIN_GLOBALS: &[&str] = &["env"];

const DOCKER_LINK_PATTERN: &str = r"^(?P<proto>.+)://(?P<addr>.+):(?P<port>.+)$";

/// Register every built-in filter and the `env` global.
pub fn register_builtins(env: &mut Environment<'static>, snapshot: Arc<EnvSnapshot>) {
    env.add_filter("sh_quote", sh_quote);
    env.add_filter("sh_opt", sh_opt);
    env.add_filter("sh_optq", sh_optq);
    env.add_filter("sh_which", sh_which);
    env.add_filter("sh_realpath", sh_realpath);
    env.add_filter("ifelse", ifelse);
    env.add_filter("onoff", onoff);
    env.add_filter("yesno", yesno);
    env.add_filter("docker_link", docker_link);
    env.add_filter("ctxlookup", ctxlookup);

    let vars = Arc::clone(&snapshot);
    env.add_filter("sh_expanduser", move |value: Value| expand_user(&text_of(&value), &vars));
    let vars = Arc::clone(&snapshot);
    env.add_filter("sh_expandvars", move |value: Value| expand_vars(&text_of(&value), &vars));
    let vars = Arc::clone(&snapshot);
    env.add_filter("sh_expand", move |value: Value| {
        expand_vars(&expand_user(&text_of(&value), &vars), &vars)
    });

    let vars = Arc::clone(&snapshot);
    env.add_filter("env", move |name: String, default: Option<Value>| {
        env_lookup(&vars, &name, default)
    });
    let vars = snapshot;
    env.add_function("env", move |name: String, default: Option<Value>| {
        env_lookup(&vars, &name, default)
    });

    let previous_column = Arc::new(Mutex::new(None));
    env.add_filter(
        "align_suffix",
        move |text: String, delim: String, column: Option<Value>, spaces: Option<usize>| {
            align_suffix(&text, &delim, column, spaces.unwrap_or(1), &previous_column)
        },
    );
}

/// String form of a filter input; undefined and none become empty.
fn text_of(value: &Value) -> String {
    if value.is_undefined() || value.is_none() {
        return String::new();
    }
    value.as_str().map_or_else(|| value.to_string(), str::to_string)
}

/// Quote a string for POSIX shells.
///
/// Strings made only of safe characters pass through unchanged; anything
/// else is wrapped in single quotes with embedded quotes escaped.
pub fn shell_quote(text: &str) -> String {
    if text.is_empty() {
        return "''".to_string();
    }
    let safe = text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        return text.to_string();
    }
    format!("'{}'", text.replace('\'', "'\"'\"'"))
}

fn sh_quote(value: Value) -> String {
    shell_quote(&text_of(&value))
}

fn sh_opt(value: Value, name: String, delim: Option<String>, quote: Option<bool>) -> String {
    if !value.is_true() {
        return String::new();
    }
    let text = text_of(&value);
    let text = if quote.unwrap_or(false) {
        shell_quote(&text)
    } else {
        text
    };
    format!("{}{}{}", name, delim.as_deref().unwrap_or(" "), text)
}

fn sh_optq(value: Value, name: String, delim: Option<String>) -> String {
    sh_opt(value, name, delim, Some(true))
}

fn sh_which(name: String) -> Value {
    match which::which(&name) {
        Ok(path) => Value::from(path.display().to_string()),
        Err(_) => Value::from(()),
    }
}

fn expand_user(text: &str, snapshot: &EnvSnapshot) -> String {
    shellexpand::tilde_with_context(text, || snapshot.home_dir().map(|p| p.display().to_string()))
        .into_owned()
}

/// Expand `$VAR` and `${VAR}`; unknown variables are left as written.
fn expand_vars(text: &str, snapshot: &EnvSnapshot) -> String {
    shellexpand::env_with_context_no_errors(text, |name| snapshot.get(name)).into_owned()
}

fn sh_realpath(value: Value) -> String {
    let text = text_of(&value);
    std::fs::canonicalize(&text)
        .or_else(|_| std::path::absolute(&text))
        .map(|path| path.display().to_string())
        .unwrap_or(text)
}

fn ifelse(value: Value, when_true: Value, when_false: Value) -> Value {
    if value.is_true() {
        when_true
    } else {
        when_false
    }
}

fn onoff(value: Value) -> &'static str {
    if value.is_true() {
        "on"
    } else {
        "off"
    }
}

fn yesno(value: Value) -> &'static str {
    if value.is_true() {
        "yes"
    } else {
        "no"
    }
}

/// Reformat a Docker link value such as `tcp://172.17.0.5:5432`.
///
/// The format may reference `{proto}`, `{addr}` and `{port}`; it defaults to
/// `{addr}:{port}`. Undefined input passes through untouched.
fn docker_link(value: Value, format: Option<String>) -> Result<Value, Error> {
    if value.is_undefined() {
        return Ok(value);
    }

    let text = text_of(&value);
    let pattern = Regex::new(DOCKER_LINK_PATTERN)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
    let caps = pattern.captures(&text).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("the provided value does not seem to be a Docker link: {text}"),
        )
    })?;

    let format = format.as_deref().unwrap_or("{addr}:{port}");
    let rendered = format
        .replace("{proto}", &caps["proto"])
        .replace("{addr}", &caps["addr"])
        .replace("{port}", &caps["port"]);
    Ok(Value::from(rendered))
}

fn env_lookup(snapshot: &EnvSnapshot, name: &str, default: Option<Value>) -> Result<Value, Error> {
    match (snapshot.get(name), default) {
        (Some(value), _) => Ok(Value::from(value)),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("environment variable '{name}' is not set"),
        )),
    }
}

/// Align whatever follows `delim` on each line into one column.
///
/// `column` is a number, `"auto"` (the default: the rightmost delimiter
/// position) or `"previous"` (the column used by the last call).
fn align_suffix(
    text: &str,
    delim: &str,
    column: Option<Value>,
    spaces_after_delim: usize,
    previous: &Mutex<Option<usize>>,
) -> Result<String, Error> {
    let mut previous = previous
        .lock()
        .map_err(|_| Error::new(ErrorKind::InvalidOperation, "align_suffix state is poisoned"))?;

    let auto = || {
        text.lines()
            .filter_map(|line| line.find(delim).map(|idx| line[..idx].chars().count()))
            .max()
            .unwrap_or(0)
    };
    let column = match column {
        None => auto(),
        Some(c) if c.is_none() || c.is_undefined() => auto(),
        Some(c) => match c.as_str() {
            Some("auto") => auto(),
            Some("previous") => previous.ok_or_else(|| {
                Error::new(ErrorKind::InvalidOperation, "no previous align_suffix column to reuse")
            })?,
            Some(other) => {
                return Err(Error::new(
                    ErrorKind::InvalidOperation,
                    format!("unknown column '{other}', expected a number, 'auto' or 'previous'"),
                ));
            }
            None => usize::try_from(c.clone()).map_err(|_| {
                Error::new(ErrorKind::InvalidOperation, "column must be a number, 'auto' or 'previous'")
            })?,
        },
    };

    let mut aligned = String::with_capacity(text.len());
    for line in text.lines() {
        match line.split_once(delim) {
            None => aligned.push_str(line.trim_end()),
            Some((head, tail)) if head.trim().is_empty() => {
                aligned.push_str(head);
                aligned.push_str(delim);
                aligned.push_str(tail);
            }
            Some((head, tail)) => {
                let head = head.trim_end();
                aligned.push_str(&format!("{head:<column$}"));
                aligned.push_str(delim);
                aligned.push_str(&" ".repeat(spaces_after_delim));
                aligned.push_str(tail.trim());
            }
        }
        aligned.push('\n');
    }

    *previous = Some(column);
    Ok(aligned)
}

/// Look up a dotted key path in the template context.
fn ctxlookup(state: &State, key: String) -> Value {
    let mut segments = key.split('.');
    let Some(mut value) = segments.next().and_then(|first| state.lookup(first)) else {
        return Value::UNDEFINED;
    };
    for segment in segments {
        value = match value.get_attr(segment) {
            Ok(next) if !next.is_undefined() => next,
            _ => return Value::UNDEFINED,
        };
    }
    value
}
