//! The render pipeline: decode, merge, alter, render, write.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{TemplateRenderer, UndefinedPolicy};
use crate::context::{
    Context, ContextMerger, Contribution, DataInput, DataSource, EnvSnapshot, FormatDecoder,
};
use crate::core::{J2Error, Result};
use crate::hooks::{EngineOptions, HookRegistry};

/// Where rendered text goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSink {
    #[default]
    Stdout,
    File(PathBuf),
}

impl OutputSink {
    /// Write the complete rendered text.
    pub fn write(&self, rendered: &str) -> Result<()> {
        match self {
            OutputSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
            }
            OutputSink::File(path) => {
                std::fs::write(path, rendered).map_err(|e| J2Error::FileSystemError {
                    operation: "write output file".to_string(),
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                tracing::info!("Wrote {} bytes to {}", rendered.len(), path.display());
            }
        }
        Ok(())
    }
}

/// Orchestrates one render run.
///
/// ```text
/// sources ─► FormatDecoder ─► ContextMerger ─► alter_context hooks ─► engine ─► sink
/// ```
///
/// The process environment only enters through the [`EnvSnapshot`] given to
/// [`RenderPipeline::new`].
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    decoder: FormatDecoder,
    merger: ContextMerger,
    hooks: HookRegistry,
    snapshot: Arc<EnvSnapshot>,
    undefined: UndefinedPolicy,
    compact: bool,
}

impl RenderPipeline {
    pub fn new(snapshot: EnvSnapshot) -> Self {
        Self {
            decoder: FormatDecoder::new(),
            merger: ContextMerger::new(),
            hooks: HookRegistry::new(),
            snapshot: Arc::new(snapshot),
            undefined: UndefinedPolicy::default(),
            compact: true,
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: FormatDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_undefined(mut self, policy: UndefinedPolicy) -> Self {
        self.undefined = policy;
        self
    }

    /// `trim_blocks` and `lstrip_blocks` on (the default) or off.
    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn snapshot(&self) -> &EnvSnapshot {
        &self.snapshot
    }

    /// Decode every source and merge them in order.
    ///
    /// `import_env` adds the environment snapshot as the last contribution:
    /// squashed at the top level when empty, mounted under the given path
    /// otherwise. All formats are resolved before anything is read.
    pub fn assemble_context(
        &self,
        sources: &[DataSource],
        import_env: Option<&str>,
        stdin: &mut dyn Read,
    ) -> Result<Context> {
        let stdin_sources = sources.iter().filter(|s| s.input == DataInput::Stdin).count();
        if stdin_sources > 1 {
            return Err(J2Error::ConfigError {
                message: format!("standard input can be read only once, but {stdin_sources} data sources use it"),
            });
        }

        let formats = sources
            .iter()
            .map(|source| self.decoder.resolve_format(source))
            .collect::<Result<Vec<_>>>()?;

        let mut contributions = Vec::with_capacity(sources.len() + 1);
        for (source, format) in sources.iter().zip(formats) {
            let data = self.decoder.load(source, format, &self.snapshot, stdin)?;
            contributions
                .push(Contribution::new(source.input.to_string(), data).mounted_at(source.mount.clone()));
        }

        if let Some(name) = import_env {
            let mount = Some(name.to_string()).filter(|n| !n.is_empty());
            contributions.push(
                Contribution::new(DataInput::Environment.to_string(), self.snapshot.to_context())
                    .mounted_at(mount),
            );
        }

        self.merger.merge(&contributions)
    }

    /// Resolved engine options: compact defaults overlaid with hook options.
    pub fn engine_options(&self) -> EngineOptions {
        let mut options = EngineOptions {
            trim_blocks: Some(self.compact),
            lstrip_blocks: Some(self.compact),
            keep_trailing_newline: Some(true),
            ..Default::default()
        };
        options.merge(self.hooks.engine_options());
        options
    }

    /// Apply `alter_context` hooks and render the template text.
    pub fn render(&self, template_name: &str, template_source: &str, context: Context) -> Result<String> {
        let context = self.hooks.alter_context(context)?;
        let mut renderer = TemplateRenderer::new(
            self.undefined,
            &self.engine_options(),
            &self.hooks,
            Arc::clone(&self.snapshot),
        )?;
        Ok(renderer.render(template_name, template_source, &context)?)
    }

    /// Full run: read the template, assemble the context, render, write.
    ///
    /// Nothing is written unless rendering succeeded.
    pub fn run(
        &self,
        template: &Path,
        sources: &[DataSource],
        import_env: Option<&str>,
        stdin: &mut dyn Read,
        sink: &OutputSink,
    ) -> Result<()> {
        let template_source = std::fs::read_to_string(template).map_err(|e| J2Error::FileSystemError {
            operation: "read template".to_string(),
            path: template.display().to_string(),
            reason: e.to_string(),
        })?;

        let context = self.assemble_context(sources, import_env, stdin)?;
        tracing::debug!("Assembled context with {} top-level keys", context.len());

        let rendered = self.render(&template.display().to_string(), &template_source, context)?;
        sink.write(&rendered)
    }
}

/// Summary of where context keys came from, for verbose logging.
pub fn describe_sources(sources: &[DataSource]) -> BTreeMap<String, String> {
    sources
        .iter()
        .map(|source| {
            let target = source.mount.clone().unwrap_or_else(|| "<top level>".to_string());
            (source.input.to_string(), format!("{} -> {}", source.format, target))
        })
        .collect()
}
