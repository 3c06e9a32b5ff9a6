//! Cat command implementation.

use crate::cli::CatArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::bail;
use rarex_core::Archive;
use rarex_core::ExtractOptions;
use rarex_core::ExtractedMember;
use rarex_core::native::Backend;

fn read<B: Backend>(backend: &B, args: &CatArgs) -> Result<ExtractedMember> {
    let mut options = ExtractOptions::default().with_verify_data(args.verify);
    if let Some(limit) = args.max_size {
        options = options.with_max_member_size(limit);
    }

    let mut archive = Archive::new(backend, &args.archive).with_options(options);
    if let Some(password) = &args.password {
        archive = archive.with_password(password.clone());
    }

    let name = args.member.replace('\\', "/");
    match add_archive_context(archive.read(&name), &args.archive)? {
        Some(member) => Ok(member),
        None => bail!(
            "No member named '{}' in '{}'\n\
             HINT: Use `rarex list --useful` to see the file names.",
            args.member,
            args.archive.display()
        ),
    }
}

pub fn execute<B: Backend>(
    backend: &B,
    args: &CatArgs,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let member = read(backend, args)?;
    formatter.format_member(&member)
}
