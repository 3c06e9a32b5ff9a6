//! Comment command implementation.

use crate::cli::CommentArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use rarex_core::native::Backend;
use rarex_core::read_comment;

pub fn execute<B: Backend>(
    backend: &B,
    args: &CommentArgs,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let comment = add_archive_context(read_comment(backend, &args.archive), &args.archive)?;
    formatter.format_comment(&comment)
}
