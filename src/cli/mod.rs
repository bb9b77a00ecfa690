//! Command-line interface for j2cli.
//!
//! ```bash
//! # Render with a data file, format inferred from the extension
//! j2 nginx.conf.j2 nginx.json
//!
//! # Several sources, merged left to right; the INI file is mounted under `conf`
//! j2 app.j2 base.yaml overrides.json settings.cfg:ini:conf
//!
//! # Data piped on standard input
//! curl -s http://example.com/service.json | j2 --format=json config.j2
//!
//! # No data at all: the environment becomes the context
//! NGINX_HOSTNAME=localhost j2 nginx.conf.j2
//!
//! # Environment on top of a file, mounted under `env`
//! j2 --import-env=env nginx.conf.j2 nginx.yaml
//! ```
//!
//! Each `DATA` argument is `PATH[:FORMAT[:MOUNT]]`. `PATH` of `-` reads
//! standard input, `FORMAT` of `?` or empty means the `--format` default, and
//! `MOUNT` is a dotted key the decoded data is attached under. Options go
//! before the first `DATA` argument; after it, anything starting with `-` is
//! read as another data source (`-:json`, `-::mnt`).
//!
//! Flags that are not given fall back to the defaults file described in
//! [`crate::config`].

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::GlobalConfig;
use crate::context::{DataInput, DataSource, EnvSnapshot, FormatDecoder, FormatTag};
use crate::core::{ErrorContext, J2Error};
use crate::hooks::{DeclarativeHooks, HookRegistry};
use crate::templating::{
    OutputSink, RenderErrorKind, RenderPipeline, UndefinedPolicy, describe_sources,
};

/// Render a Jinja2 template with data from JSON, YAML, INI and env sources.
#[derive(Parser, Debug)]
#[command(
    name = "j2",
    about = "Render Jinja2 templates from the command line",
    version,
    long_about = "Render a Jinja2 template with a context merged from JSON, YAML, INI and env \
                  files, standard input and the process environment."
)]
pub struct Cli {
    /// Template file to render
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// Data sources, `PATH[:FORMAT[:MOUNT]]`, merged left to right
    #[arg(value_name = "DATA", allow_hyphen_values = true)]
    data: Vec<String>,

    /// Default format for data sources that do not name one
    #[arg(short, long, value_name = "FORMAT", default_value = "auto")]
    format: FormatTag,

    /// Format to use when `auto` cannot infer one from the file name
    #[arg(long, value_name = "FORMAT")]
    fallback_format: Option<FormatTag>,

    /// Merge the process environment last; with `=NAME`, mount it under NAME
    #[arg(
        long,
        value_name = "NAME",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    import_env: Option<String>,

    /// Write the rendered text to this file instead of standard output
    #[arg(short = 'o', long = "outfile", value_name = "OUTFILE")]
    outfile: Option<PathBuf>,

    /// Policy for undefined variables: strict, normal or debug
    #[arg(
        long,
        value_name = "POLICY",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "normal"
    )]
    undefined: Option<UndefinedPolicy>,

    /// TOML file of extra filters (repeatable)
    #[arg(long = "filters", value_name = "FILE", action = ArgAction::Append)]
    filters: Vec<PathBuf>,

    /// TOML file of extra tests (repeatable)
    #[arg(long = "tests", value_name = "FILE", action = ArgAction::Append)]
    tests: Vec<PathBuf>,

    /// TOML customize file (engine options, globals, context hooks)
    #[arg(long, value_name = "FILE")]
    customize: Option<PathBuf>,

    /// Treat missing data files as empty
    #[arg(short = 'I', long)]
    ignore_missing: bool,

    /// Keep the whitespace around block tags (disables trim_blocks and lstrip_blocks)
    #[arg(long)]
    no_compact: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Defaults file (overrides J2CLI_CONFIG_PATH and ~/.j2cli/config.toml)
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Flags merged with the defaults file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSettings {
    undefined: UndefinedPolicy,
    compact: bool,
    fallback_format: Option<FormatTag>,
    ignore_missing: bool,
    filters: Vec<PathBuf>,
    tests: Vec<PathBuf>,
    customize: Option<PathBuf>,
}

impl Cli {
    /// Log level selected by the verbosity flags.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Install the stderr subscriber. `RUST_LOG` wins over the flags.
    pub fn init_logging(&self, env: &EnvSnapshot) {
        let filter = match env.get("RUST_LOG").filter(|v| !v.is_empty()) {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::new(self.log_level().to_string()),
        };
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .try_init();
    }

    /// Run the render described by the command line.
    pub fn execute(self, env: EnvSnapshot) -> Result<()> {
        let config = GlobalConfig::load(self.config.as_deref(), &env)?;
        let settings = self.settings(&config)?;
        let sources = self.data_sources()?;
        let hooks = load_hooks(&settings)?;

        tracing::info!("Rendering {} with undefined={}", self.template.display(), settings.undefined);
        for (source, target) in describe_sources(&sources) {
            tracing::info!("  {source}: {target}");
        }

        let decoder = FormatDecoder::new()
            .with_fallback(settings.fallback_format)
            .ignore_missing(settings.ignore_missing);
        let pipeline = RenderPipeline::new(env)
            .with_decoder(decoder)
            .with_hooks(hooks)
            .with_undefined(settings.undefined)
            .with_compact(settings.compact);

        let sink = self.outfile.clone().map_or(OutputSink::Stdout, OutputSink::File);
        let mut stdin = std::io::stdin().lock();
        pipeline
            .run(&self.template, &sources, self.import_env.as_deref(), &mut stdin, &sink)
            .map_err(|e| self.explain(e, !std::io::stdin().is_terminal()))
    }

    fn settings(&self, config: &GlobalConfig) -> Result<RunSettings, J2Error> {
        let fallback_format = match self.fallback_format {
            Some(format) => Some(format),
            None => config.fallback_format_tag().map_err(|message| J2Error::ConfigError {
                message,
            })?,
        };
        fn pick(cli: &[PathBuf], file: &[PathBuf]) -> Vec<PathBuf> {
            if cli.is_empty() { file.to_vec() } else { cli.to_vec() }
        }

        Ok(RunSettings {
            undefined: self.undefined.or(config.undefined).unwrap_or_default(),
            compact: !(self.no_compact || config.no_compact.unwrap_or(false)),
            fallback_format,
            ignore_missing: self.ignore_missing || config.ignore_missing.unwrap_or(false),
            filters: pick(&self.filters, &config.filters),
            tests: pick(&self.tests, &config.tests),
            customize: self.customize.clone().or_else(|| config.customize.clone()),
        })
    }

    /// Positional data specifications, or the implicit source when there are none.
    fn data_sources(&self) -> Result<Vec<DataSource>, J2Error> {
        if let Some(input) = self.implicit_input() {
            let format = if input == DataInput::Environment { FormatTag::Env } else { self.format };
            return Ok(vec![DataSource::new(input, format)]);
        }

        self.data.iter().map(|spec| DataSource::parse_spec(spec, self.format)).collect()
    }

    /// Source read when no DATA is given.
    fn implicit_input(&self) -> Option<DataInput> {
        if !self.data.is_empty() {
            return None;
        }
        Some(match self.format {
            FormatTag::Auto | FormatTag::Env => DataInput::Environment,
            _ => DataInput::Stdin,
        })
    }

    /// Undefined variables rendered from the environment while something is
    /// piped in usually mean the `-` was forgotten.
    fn explain(&self, error: J2Error, stdin_piped: bool) -> anyhow::Error {
        let forgot_stdin = stdin_piped && self.implicit_input() == Some(DataInput::Environment);
        match error {
            J2Error::RenderError(render)
                if forgot_stdin && render.kind == RenderErrorKind::UndefinedVariable =>
            {
                let details = render.format_with_context();
                anyhow::Error::new(
                    ErrorContext::new(J2Error::RenderError(render))
                        .with_details(details)
                        .with_suggestion(
                            "Data was piped to standard input but no DATA argument was given; \
                             pass '-' to read it, e.g. 'j2 --format=json template.j2 -'",
                        ),
                )
            }
            other => anyhow::Error::new(other),
        }
    }
}

/// Hooks run in command-line order: filter files, test files, then the customize file.
fn load_hooks(settings: &RunSettings) -> Result<HookRegistry, J2Error> {
    let mut registry = HookRegistry::new();
    for path in &settings.filters {
        registry.register(DeclarativeHooks::load_filters(path)?);
    }
    for path in &settings.tests {
        registry.register(DeclarativeHooks::load_tests(path)?);
    }
    if let Some(path) = &settings.customize {
        registry.register(DeclarativeHooks::load_customize(path)?);
    }
    tracing::debug!("Registered {} customization hooks", registry.len());
    Ok(registry)
}
