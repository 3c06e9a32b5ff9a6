//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use rarex_core::ExtractOptions;
use rarex_core::NoopProgress;
use rarex_core::ProgressCallback;
use rarex_core::extract_archive_with_progress;
use rarex_core::native::Backend;
use std::env;

fn options(args: &ExtractArgs) -> ExtractOptions {
    let options = ExtractOptions::default()
        .with_verify_data(args.verify)
        .with_preserve_mtime(!args.no_mtime)
        .with_allow_symlinks(!args.no_symlinks);
    match &args.password {
        Some(password) => options.with_password(password.clone()),
        None => options,
    }
}

pub fn execute<B: Backend>(
    backend: &B,
    args: &ExtractArgs,
    formatter: &dyn OutputFormatter,
    quiet: bool,
) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };
    let options = options(args);

    let mut spinner;
    let mut noop = NoopProgress;
    let progress: &mut dyn ProgressCallback = if CliProgress::should_show(quiet) {
        spinner = CliProgress::new("Extracting");
        &mut spinner
    } else {
        &mut noop
    };

    let report = add_archive_context(
        extract_archive_with_progress(backend, &args.archive, &output_dir, &options, progress),
        &args.archive,
    )?;

    formatter.format_extraction_result(&report)
}
