//! j2 command-line entry point
//!
//! Parses the command line, captures the process environment once, sets up
//! logging and runs the render. Errors are printed with details and a
//! suggestion, and the process exits with status 1.

use anyhow::Result;
use clap::Parser;
use j2cli::cli::Cli;
use j2cli::context::EnvSnapshot;
use j2cli::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let env = EnvSnapshot::capture();
    cli.init_logging(&env);

    match cli.execute(env) {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
