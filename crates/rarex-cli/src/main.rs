//! Rarex CLI - Command-line utility for safe RAR extraction.

// Without the native decoder only `completion` is reachable from `main`.
#![cfg_attr(not(feature = "unrar"), allow(dead_code))]

mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod progress;

use clap::Parser;
use cli::Commands;
use output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    logging::init(cli.verbose);
    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match dispatch(&cli.command, &*formatter, cli.quiet || cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            formatter.format_error(&err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "unrar")]
fn dispatch(
    command: &Commands,
    formatter: &dyn OutputFormatter,
    quiet: bool,
) -> anyhow::Result<()> {
    commands::run(&rarex_core::native::UnrarBackend, command, formatter, quiet)
}

#[cfg(not(feature = "unrar"))]
fn dispatch(
    command: &Commands,
    _formatter: &dyn OutputFormatter,
    _quiet: bool,
) -> anyhow::Result<()> {
    if let Commands::Completion(args) = command {
        commands::completion::execute(args.shell);
        return Ok(());
    }
    anyhow::bail!(
        "rarex was built without the native RAR decoder\n\
         HINT: Rebuild with `cargo install rarex-cli --features unrar` (requires a C++ toolchain)."
    )
}
