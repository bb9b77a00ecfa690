//! Customization hooks for the render pipeline.
//!
//! A [`Customization`] can touch five points of a render run, all optional:
//!
//! | Hook point          | When                                   |
//! |---------------------|----------------------------------------|
//! | `engine_options`    | before the engine is constructed       |
//! | `configure_engine`  | after built-in filters are registered  |
//! | `alter_context`     | after merge, before rendering          |
//! | `filters` / `tests` | while the engine is being configured   |
//!
//! The pipeline only ever sees a [`HookRegistry`]. How an implementation was
//! obtained (compiled in, or loaded from a hook file by [`declarative`]) is
//! invisible to it.
//!
//! # Example
//!
//! ```rust,no_run
//! use j2cli::context::Context;
//! use j2cli::hooks::{Customization, HookRegistry};
//!
//! struct Stamp;
//!
//! impl Customization for Stamp {
//!     fn name(&self) -> &str {
//!         "stamp"
//!     }
//!
//!     fn alter_context(&self, mut context: Context) -> anyhow::Result<Context> {
//!         context.insert("generated".into(), true.into());
//!         Ok(context)
//!     }
//! }
//!
//! let mut hooks = HookRegistry::new();
//! hooks.register(Stamp);
//! ```

pub mod declarative;

use minijinja::value::Rest;
use minijinja::{Environment, State, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::core::{J2Error, Result};

pub use declarative::DeclarativeHooks;

/// A custom filter: receives the render state, the piped value and the call
/// arguments. The state gives access to the engine doing the rendering.
pub type FilterFn = Arc<
    dyn Fn(&State, Value, &[Value]) -> std::result::Result<Value, minijinja::Error> + Send + Sync,
>;

/// A custom test: same shape as [`FilterFn`], answering a yes/no question.
pub type TestFn = Arc<
    dyn Fn(&State, Value, &[Value]) -> std::result::Result<bool, minijinja::Error> + Send + Sync,
>;

/// Engine construction options. Unset fields keep the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    pub block_start: Option<String>,
    pub block_end: Option<String>,
    pub variable_start: Option<String>,
    pub variable_end: Option<String>,
    pub comment_start: Option<String>,
    pub comment_end: Option<String>,
    pub trim_blocks: Option<bool>,
    pub lstrip_blocks: Option<bool>,
    pub keep_trailing_newline: Option<bool>,
}

impl EngineOptions {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(&mut self, other: EngineOptions) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.block_start, other.block_start);
        take(&mut self.block_end, other.block_end);
        take(&mut self.variable_start, other.variable_start);
        take(&mut self.variable_end, other.variable_end);
        take(&mut self.comment_start, other.comment_start);
        take(&mut self.comment_end, other.comment_end);
        take(&mut self.trim_blocks, other.trim_blocks);
        take(&mut self.lstrip_blocks, other.lstrip_blocks);
        take(&mut self.keep_trailing_newline, other.keep_trailing_newline);
    }

    /// Whether any delimiter differs from the engine default.
    pub fn has_custom_syntax(&self) -> bool {
        self.block_start.is_some()
            || self.block_end.is_some()
            || self.variable_start.is_some()
            || self.variable_end.is_some()
            || self.comment_start.is_some()
            || self.comment_end.is_some()
    }
}

/// Extension points of a render run. Every method defaults to a no-op.
pub trait Customization: Send + Sync {
    /// Identity used in errors and logs.
    fn name(&self) -> &str;

    fn engine_options(&self) -> EngineOptions {
        EngineOptions::default()
    }

    /// Post-process the constructed engine.
    fn configure_engine(&self, _engine: &mut Environment<'static>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Globals and functions added by `configure_engine`.
    ///
    /// Template references to these names are not reported as undefined.
    fn global_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Transform the merged context before it reaches the engine.
    fn alter_context(&self, context: Context) -> anyhow::Result<Context> {
        Ok(context)
    }

    fn filters(&self) -> BTreeMap<String, FilterFn> {
        BTreeMap::new()
    }

    fn tests(&self) -> BTreeMap<String, TestFn> {
        BTreeMap::new()
    }
}

/// Ordered set of customizations applied to a render run.
///
/// Hooks run in registration order; for filters, tests and engine options a
/// later registration overrides an earlier one.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Customization>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hooks.iter().map(|hook| hook.name())).finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl Customization + 'static) {
        self.register_arc(Arc::new(hook));
    }

    pub fn register_arc(&mut self, hook: Arc<dyn Customization>) {
        tracing::debug!("Registered customization hook '{}'", hook.name());
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn engine_options(&self) -> EngineOptions {
        let mut options = EngineOptions::default();
        for hook in &self.hooks {
            options.merge(hook.engine_options());
        }
        options
    }

    pub fn configure_engine(&self, engine: &mut Environment<'static>) -> Result<()> {
        for hook in &self.hooks {
            hook.configure_engine(engine).map_err(|e| hook_error(hook.as_ref(), &e))?;
        }
        Ok(())
    }

    pub fn global_names(&self) -> Vec<String> {
        self.hooks.iter().flat_map(|hook| hook.global_names()).collect()
    }

    pub fn alter_context(&self, mut context: Context) -> Result<Context> {
        for hook in &self.hooks {
            context = hook.alter_context(context).map_err(|e| hook_error(hook.as_ref(), &e))?;
        }
        Ok(context)
    }

    pub fn filters(&self) -> BTreeMap<String, FilterFn> {
        let mut filters = BTreeMap::new();
        for hook in &self.hooks {
            filters.extend(hook.filters());
        }
        filters
    }

    pub fn tests(&self) -> BTreeMap<String, TestFn> {
        let mut tests = BTreeMap::new();
        for hook in &self.hooks {
            tests.extend(hook.tests());
        }
        tests
    }

    /// Add every hook filter and test to `engine`, replacing same-named ones.
    pub fn register_filters_and_tests(&self, engine: &mut Environment<'static>) {
        for (name, filter) in self.filters() {
            tracing::debug!("Registering filter '{}'", name);
            engine.add_filter(name, move |state: &State, value: Value, args: Rest<Value>| {
                filter(state, value, args.as_slice())
            });
        }
        for (name, test) in self.tests() {
            tracing::debug!("Registering test '{}'", name);
            engine.add_test(name, move |state: &State, value: Value, args: Rest<Value>| {
                test(state, value, args.as_slice())
            });
        }
    }
}

fn hook_error(hook: &dyn Customization, error: &anyhow::Error) -> J2Error {
    J2Error::HookError {
        hook: hook.name().to_string(),
        reason: format!("{error:#}"),
    }
}
