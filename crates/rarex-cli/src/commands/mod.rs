//! Subcommand implementations.
//!
//! Every command that touches an archive is generic over the native
//! [`Backend`], so the binary runs them against UnRAR while the tests run
//! them against in-memory archives.

pub mod cat;
pub mod comment;
pub mod completion;
pub mod extract;
pub mod list;

use crate::cli::Commands;
use crate::output::OutputFormatter;
use anyhow::Result;
use rarex_core::native::Backend;
use rarex_core::native_version;
use tracing::debug;

/// Runs `command` against `backend`.
pub fn run<B: Backend>(
    backend: &B,
    command: &Commands,
    formatter: &dyn OutputFormatter,
    quiet: bool,
) -> Result<()> {
    debug!(version = native_version(backend), "native decoder");

    match command {
        Commands::Extract(args) => extract::execute(backend, args, formatter, quiet),
        Commands::List(args) => list::execute(backend, args, formatter),
        Commands::Comment(args) => comment::execute(backend, args, formatter),
        Commands::Cat(args) => cat::execute(backend, args, formatter),
        Commands::Completion(args) => {
            completion::execute(args.shell);
            Ok(())
        }
    }
}
