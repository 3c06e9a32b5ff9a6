//! High-level public API for RAR extraction.

use std::path::Path;
use std::time::Instant;

use tracing::debug;
use tracing::instrument;

use crate::ExtractionReport;
use crate::Result;
use crate::callback::PasswordState;
use crate::config::ExtractOptions;
use crate::extraction::CrcMap;
use crate::extraction::ExtractedMember;
use crate::extraction::ExtractionEngine;
use crate::extraction::read_member;
use crate::headers::Headers;
use crate::inspection::verify_crcs;
use crate::native::Backend;
use crate::native::HeaderRecord;
use crate::native::OpenMode;
use crate::report::NoopProgress;
use crate::report::ProgressCallback;
use crate::session::ArchiveSession;
use crate::types::DestDir;

/// Extracts an archive into an existing directory.
///
/// Every regular file must resolve inside `output_dir`; an entry that would
/// escape ends the pass. Directories are created idempotently, and Unix
/// symlinks are created only when their target stays inside `output_dir`.
/// Files split across volumes are reassembled by appending each part.
///
/// With `verify_data` set, entry data streams through the callback and the
/// accumulated CRC32 of every file is compared with the archive afterwards.
///
/// # Errors
///
/// Returns an error if:
/// - `output_dir` does not exist or is not a directory
/// - the archive cannot be opened
/// - a password is missing or wrong
/// - a regular file would be written outside `output_dir`
/// - a checksum does not match
/// - the decoder or the filesystem fails
///
/// # Examples
///
/// ```no_run
/// use rarex_core::ExtractOptions;
/// use rarex_core::extract_archive;
/// use rarex_core::native::MemoryBackend;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new();
/// let options = ExtractOptions::default().with_verify_data(true);
/// let report = extract_archive(&backend, "archive.rar", "/tmp/output", &options)?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<B, P, Q>(
    backend: &B,
    archive: P,
    output_dir: Q,
    options: &ExtractOptions,
) -> Result<ExtractionReport>
where
    B: Backend,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut progress = NoopProgress;
    extract_archive_with_progress(backend, archive, output_dir, options, &mut progress)
}

/// Extracts an archive, reporting progress to `progress`.
///
/// # Errors
///
/// Same as [`extract_archive`].
pub fn extract_archive_with_progress<B, P, Q>(
    backend: &B,
    archive: P,
    output_dir: Q,
    options: &ExtractOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport>
where
    B: Backend,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    extract_impl(
        backend,
        archive.as_ref(),
        output_dir.as_ref(),
        options,
        progress,
    )
}

#[instrument(
    skip_all,
    fields(archive = %archive.display(), dest = %output_dir.display(), verify = options.verify_data)
)]
fn extract_impl<B: Backend>(
    backend: &B,
    archive: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let start = Instant::now();
    let dest = DestDir::new(output_dir)?;
    let mut report = ExtractionReport::new();

    let mut password = PasswordState::new(options.password.clone());
    let mut session =
        ArchiveSession::open(backend, archive, OpenMode::Extract, false, &mut password)?;
    let crcs = ExtractionEngine::new(&dest, options).run(&mut session, &mut report, progress)?;
    session.close()?;

    if options.verify_data {
        verify_crcs(backend, archive, &crcs, options.password.as_deref())?;
        report.verified = true;
    }

    report.duration = start.elapsed();
    progress.on_complete();
    debug!(
        files = report.files_extracted,
        bytes = report.bytes_written,
        skipped = report.entries_skipped,
        "extraction finished"
    );
    Ok(report)
}

/// Reads the first regular file accepted by `predicate` into memory.
///
/// Returns `Ok(None)` when no entry matches. With `verify_data` set, the
/// member's checksum is compared with the one recorded in the archive.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened, a password is missing
/// or wrong, the member exceeds `max_member_size`, or its checksum does not
/// match.
///
/// # Examples
///
/// ```
/// use rarex_core::ExtractOptions;
/// use rarex_core::extract_member;
/// use rarex_core::native::MemoryArchive;
/// use rarex_core::native::MemoryBackend;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new()
///     .with_archive("a.rar", MemoryArchive::new().file("one.txt", b"one\n"));
///
/// let member = extract_member(&backend, "a.rar", &ExtractOptions::default(), |h| {
///     h.filename == "one.txt"
/// })?;
/// assert_eq!(member.map(|m| m.data), Some(b"one\n".to_vec()));
/// # Ok(())
/// # }
/// ```
pub fn extract_member<B, P, F>(
    backend: &B,
    archive: P,
    options: &ExtractOptions,
    predicate: F,
) -> Result<Option<ExtractedMember>>
where
    B: Backend,
    P: AsRef<Path>,
    F: FnMut(&HeaderRecord) -> bool,
{
    member_impl(backend, archive.as_ref(), options, predicate)
}

#[instrument(skip_all, fields(archive = %archive.display(), verify = options.verify_data))]
fn member_impl<B, F>(
    backend: &B,
    archive: &Path,
    options: &ExtractOptions,
    predicate: F,
) -> Result<Option<ExtractedMember>>
where
    B: Backend,
    F: FnMut(&HeaderRecord) -> bool,
{
    let mut password = PasswordState::new(options.password.clone());
    let mut session =
        ArchiveSession::open(backend, archive, OpenMode::Extract, false, &mut password)?;
    let member = read_member(&mut session, options, predicate)?;
    session.close()?;

    if let Some(member) = member.as_ref().filter(|_| options.verify_data) {
        let crcs: CrcMap = std::iter::once((member.filename.clone(), member.crc)).collect();
        verify_crcs(backend, archive, &crcs, options.password.as_deref())?;
    }
    Ok(member)
}

/// Opens `archive` and iterates over its headers.
///
/// `OpenMode::List` yields one header per file; `OpenMode::ListIncSplit`
/// and `OpenMode::Extract` yield one per volume part.
///
/// # Errors
///
/// Returns [`ExtractionError::OpenFailure`](crate::ExtractionError::OpenFailure)
/// if the archive cannot be opened. Failures while reading headers are
/// yielded by the iterator.
pub fn headers<B, P>(
    backend: &B,
    archive: P,
    password: Option<&str>,
    mode: OpenMode,
) -> Result<Headers<B::Archive>>
where
    B: Backend,
    P: AsRef<Path>,
{
    let mut state = PasswordState::new(password.map(String::from));
    let session = ArchiveSession::open(backend, archive.as_ref(), mode, false, &mut state)?;
    Ok(Headers::new(session, state))
}

/// Version of the native decoder's API.
#[inline]
#[must_use]
pub fn native_version<B: Backend>(backend: &B) -> u32 {
    backend.version()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use crate::native::MemoryArchive;
    use crate::native::MemoryBackend;
    use crate::native::MemoryEntry;
    use tempfile::TempDir;

    fn backend(archive: MemoryArchive) -> MemoryBackend {
        MemoryBackend::new().with_archive("t.rar", archive)
    }

    #[test]
    fn test_extract_archive_closes_every_session() {
        let backend = backend(MemoryArchive::new().file("a.txt", b"a").dir("d"));
        let temp = TempDir::new().unwrap();
        let options = ExtractOptions::default().with_verify_data(true);

        let report = extract_archive(&backend, "t.rar", temp.path(), &options).unwrap();

        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.directories_created, 1);
        assert!(report.verified);
        // Extraction pass plus verification listing.
        assert_eq!(backend.open_count(), 2);
        assert_eq!(backend.close_count(), 2);
    }

    #[test]
    fn test_extract_archive_missing_dest() {
        let backend = backend(MemoryArchive::new().file("a.txt", b"a"));
        let temp = TempDir::new().unwrap();
        let err = extract_archive(
            &backend,
            "t.rar",
            temp.path().join("missing"),
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
        assert_eq!(backend.open_count(), 0);
    }

    #[test]
    fn test_extract_archive_failure_still_closes() {
        let backend = backend(
            MemoryArchive::new().entry(MemoryEntry::file("s.txt", b"secret").encrypted("pw")),
        );
        let temp = TempDir::new().unwrap();
        let err =
            extract_archive(&backend, "t.rar", temp.path(), &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::PasswordRequired { .. }));
        assert_eq!(backend.close_count(), 1);
    }

    #[test]
    fn test_unverified_report() {
        let backend = backend(MemoryArchive::new().file("a.txt", b"a"));
        let temp = TempDir::new().unwrap();
        let report =
            extract_archive(&backend, "t.rar", temp.path(), &ExtractOptions::default()).unwrap();
        assert!(!report.verified);
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn test_extract_member_verifies() {
        let backend = backend(
            MemoryArchive::new()
                .entry(MemoryEntry::file("bad.txt", b"payload").recorded_crc(7))
                .file("good.txt", b"fine"),
        );
        let options = ExtractOptions::default().with_verify_data(true);

        let good = extract_member(&backend, "t.rar", &options, |h| h.filename == "good.txt")
            .unwrap()
            .unwrap();
        assert_eq!(good.data, b"fine");

        let err = extract_member(&backend, "t.rar", &options, |h| h.filename == "bad.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::DataCorruption { expected: 7, .. }
        ));
    }

    #[test]
    fn test_extract_member_unverified_ignores_recorded_crc() {
        let backend =
            backend(MemoryArchive::new().entry(MemoryEntry::file("bad.txt", b"x").recorded_crc(7)));
        let member = extract_member(&backend, "t.rar", &ExtractOptions::default(), |_| true)
            .unwrap()
            .unwrap();
        assert_eq!(member.data, b"x");
    }

    #[test]
    fn test_headers_modes() {
        let backend =
            backend(MemoryArchive::new().entry(MemoryEntry::file("big", vec![1u8; 12]).split(3)));
        let listed = headers(&backend, "t.rar", None, OpenMode::List).unwrap().count();
        let parts = headers(&backend, "t.rar", None, OpenMode::ListIncSplit)
            .unwrap()
            .count();
        assert_eq!(listed, 1);
        assert_eq!(parts, 3);
    }

    #[test]
    fn test_native_version() {
        let backend = MemoryBackend::new().with_version(8);
        assert_eq!(native_version(&backend), 8);
    }
}
