//! List command implementation

use crate::cli::ListArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use rarex_core::HeaderRecord;
use rarex_core::inspection::list_entries;
use rarex_core::list_names;
use rarex_core::native::Backend;

pub fn execute<B: Backend>(
    backend: &B,
    args: &ListArgs,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let password = args.password.as_deref();

    if args.long {
        let mut entries =
            add_archive_context(list_entries(backend, &args.archive, password), &args.archive)?;
        if args.useful {
            entries.retain(HeaderRecord::is_useful);
        }
        formatter.format_entries_long(&entries, args.human_readable)
    } else {
        let names = add_archive_context(
            list_names(backend, &args.archive, args.useful, password),
            &args.archive,
        )?;
        formatter.format_names(&names)
    }
}
