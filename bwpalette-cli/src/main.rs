//! `bwpalette` - command-line access to a Bitwarden vault through `bw`
//!
//! Provides commands for unlocking and locking the vault, browsing items
//! with filters and search, watching TOTP codes, editing items and
//! generating passwords.

mod cli;
mod commands;
mod config;
mod error;
mod util;

use bwpalette_core::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
use clap::Parser;
use cli::Cli;
use util::Context;

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        TracingLevel::from_verbosity(cli.verbose)
    };
    let tracing_config = TracingConfig::new()
        .with_level(level)
        .with_output(TracingOutput::Stderr);
    match init_tracing(&tracing_config) {
        Ok(()) | Err(TracingError::AlreadyInitialized) => {}
        Err(e) => eprintln!("Warning: {e}"),
    }

    let ctx = Context {
        config_path: cli.config,
        session: cli.session.filter(|s| !s.trim().is_empty()),
        quiet: cli.quiet,
    };

    if let Err(e) = commands::dispatch(&ctx, cli.command) {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
