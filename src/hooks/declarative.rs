//! Hook files written in TOML.
//!
//! Three shapes are understood. Filter and test files (`--filters`, `--tests`)
//! are flat tables of template expressions; the expression sees the piped
//! value as `value` and the call arguments as `args`. Expressions are checked
//! when the file is loaded and evaluated by the engine doing the rendering, so
//! built-in filters, other hook filters and globals such as `env` are in reach:
//!
//! ```toml
//! # filters.toml
//! double = "value * 2"
//! prefixed = "args[0] ~ value"
//! flag = "value | sh_opt('--name', '=', true)"
//! ```
//!
//! A customize file (`--customize`) can touch every hook point:
//!
//! ```toml
//! [engine]
//! variable_start = "<<"
//! variable_end = ">>"
//! trim_blocks = false
//!
//! [globals]
//! company = "ACME"
//!
//! [functions]
//! greet = "'hello ' ~ args[0]"
//!
//! [context.defaults]
//! port = 80
//!
//! [context.overrides]
//! generated = true
//!
//! [filters]
//! shout = "value | upper"
//!
//! [tests]
//! positive = "value > 0"
//! ```

use minijinja::value::Rest;
use minijinja::{Environment, State, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::{Customization, EngineOptions, FilterFn, TestFn};
use crate::context::{Context, squash};
use crate::core::{J2Error, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CustomizeFile {
    engine: EngineOptions,
    globals: Context,
    functions: BTreeMap<String, String>,
    context: ContextSection,
    filters: BTreeMap<String, String>,
    tests: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ContextSection {
    defaults: Context,
    overrides: Context,
}

/// Customization loaded from a TOML hook file.
#[derive(Debug, Clone, Default)]
pub struct DeclarativeHooks {
    name: String,
    engine: EngineOptions,
    globals: Context,
    functions: BTreeMap<String, String>,
    defaults: Context,
    overrides: Context,
    filters: BTreeMap<String, String>,
    tests: BTreeMap<String, String>,
}

impl DeclarativeHooks {
    /// Load a `--filters` file.
    pub fn load_filters(path: &Path) -> Result<Self> {
        Self::from_filters_str(&path.display().to_string(), &read_hook_file(path)?)
    }

    /// Load a `--tests` file.
    pub fn load_tests(path: &Path) -> Result<Self> {
        Self::from_tests_str(&path.display().to_string(), &read_hook_file(path)?)
    }

    /// Load a `--customize` file.
    pub fn load_customize(path: &Path) -> Result<Self> {
        Self::from_customize_str(&path.display().to_string(), &read_hook_file(path)?)
    }

    pub fn from_filters_str(name: &str, content: &str) -> Result<Self> {
        let filters: BTreeMap<String, String> =
            toml::from_str(content).map_err(|e| hook_error(name, e.to_string()))?;
        let hooks = Self {
            name: name.to_string(),
            filters,
            ..Default::default()
        };
        hooks.validate()?;
        Ok(hooks)
    }

    pub fn from_tests_str(name: &str, content: &str) -> Result<Self> {
        let tests: BTreeMap<String, String> =
            toml::from_str(content).map_err(|e| hook_error(name, e.to_string()))?;
        let hooks = Self {
            name: name.to_string(),
            tests,
            ..Default::default()
        };
        hooks.validate()?;
        Ok(hooks)
    }

    pub fn from_customize_str(name: &str, content: &str) -> Result<Self> {
        let file: CustomizeFile =
            toml::from_str(content).map_err(|e| hook_error(name, e.to_string()))?;
        let hooks = Self {
            name: name.to_string(),
            engine: file.engine,
            globals: file.globals,
            functions: file.functions,
            defaults: file.context.defaults,
            overrides: file.context.overrides,
            filters: file.filters,
            tests: file.tests,
        };
        hooks.validate()?;
        tracing::debug!(
            "Loaded customize file {}: {} globals, {} functions, {} filters, {} tests",
            name,
            hooks.globals.len(),
            hooks.functions.len(),
            hooks.filters.len(),
            hooks.tests.len()
        );
        Ok(hooks)
    }

    /// Every expression must compile before anything is rendered.
    fn validate(&self) -> Result<()> {
        let sections =
            [("functions", &self.functions), ("filters", &self.filters), ("tests", &self.tests)];
        for (section, table) in sections {
            for (key, source) in table {
                check_expression(source).map_err(|e| {
                    hook_error(&self.name, format!("{section}.{key}: invalid expression: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

impl Customization for DeclarativeHooks {
    fn name(&self) -> &str {
        &self.name
    }

    fn engine_options(&self) -> EngineOptions {
        self.engine.clone()
    }

    fn configure_engine(&self, engine: &mut Environment<'static>) -> anyhow::Result<()> {
        for (name, value) in &self.globals {
            engine.add_global(name.clone(), Value::from_serialize(value));
        }
        for (name, source) in &self.functions {
            let source = source.clone();
            engine.add_function(name.clone(), move |state: &State, args: Rest<Value>| {
                eval_expression(state, &source, Value::UNDEFINED, args.as_slice())
            });
        }
        Ok(())
    }

    fn global_names(&self) -> Vec<String> {
        self.globals.keys().chain(self.functions.keys()).cloned().collect()
    }

    fn alter_context(&self, context: Context) -> anyhow::Result<Context> {
        if self.defaults.is_empty() && self.overrides.is_empty() {
            return Ok(context);
        }
        let mut altered = self.defaults.clone();
        squash(&mut altered, &context);
        squash(&mut altered, &self.overrides);
        Ok(altered)
    }

    fn filters(&self) -> BTreeMap<String, FilterFn> {
        self.filters
            .iter()
            .map(|(name, source)| {
                let source = source.clone();
                let filter: FilterFn = Arc::new(move |state: &State, value: Value, args: &[Value]| {
                    eval_expression(state, &source, value, args)
                });
                (name.clone(), filter)
            })
            .collect()
    }

    fn tests(&self) -> BTreeMap<String, TestFn> {
        self.tests
            .iter()
            .map(|(name, source)| {
                let source = source.clone();
                let test: TestFn = Arc::new(move |state: &State, value: Value, args: &[Value]| {
                    Ok(eval_expression(state, &source, value, args)?.is_true())
                });
                (name.clone(), test)
            })
            .collect()
    }
}

fn read_hook_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| hook_error(&path.display().to_string(), format!("cannot read file: {e}")))
}

fn hook_error(name: &str, reason: String) -> J2Error {
    J2Error::HookError {
        hook: name.to_string(),
        reason,
    }
}

/// Syntax check only; filter and function names resolve at render time.
fn check_expression(source: &str) -> std::result::Result<(), minijinja::Error> {
    let env = Environment::empty();
    env.compile_expression(source)?;
    Ok(())
}

/// Evaluate a hook expression on the rendering engine with `value` and `args` in scope.
fn eval_expression(
    state: &State,
    source: &str,
    value: Value,
    args: &[Value],
) -> std::result::Result<Value, minijinja::Error> {
    let expression = state.env().compile_expression(source)?;
    expression.eval(minijinja::context! {
        value => value,
        args => Value::from(args.to_vec()),
    })
}
