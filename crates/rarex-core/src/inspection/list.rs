//! Listing archive contents without extracting.

use std::path::Path;

use crate::Result;
use crate::callback::PasswordState;
use crate::headers::Headers;
use crate::native::Backend;
use crate::native::HeaderRecord;
use crate::native::OpenMode;
use crate::session::ArchiveSession;

/// Collects the headers of every entry, one per logical file.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or a header cannot be
/// read.
pub fn list_entries<B: Backend>(
    backend: &B,
    archive: &Path,
    password: Option<&str>,
) -> Result<Vec<HeaderRecord>> {
    let mut state = PasswordState::new(password.map(String::from));
    let session = ArchiveSession::open(backend, archive, OpenMode::List, false, &mut state)?;
    Headers::new(session, state).collect()
}

/// Lists entry names in archive order, with `/` as the separator.
///
/// With `only_useful`, directories and redirections are left out.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or a header cannot be
/// read.
///
/// # Examples
///
/// ```
/// use rarex_core::inspection::list_names;
/// use rarex_core::native::MemoryArchive;
/// use rarex_core::native::MemoryBackend;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new().with_archive(
///     "a.rar",
///     MemoryArchive::new().dir("d").file(r"d\f.txt", b"x").symlink("l", "d"),
/// );
///
/// let all = list_names(&backend, Path::new("a.rar"), false, None)?;
/// assert_eq!(all, ["d", "d/f.txt", "l"]);
///
/// let useful = list_names(&backend, Path::new("a.rar"), true, None)?;
/// assert_eq!(useful, ["d/f.txt"]);
/// # Ok(())
/// # }
/// ```
pub fn list_names<B: Backend>(
    backend: &B,
    archive: &Path,
    only_useful: bool,
    password: Option<&str>,
) -> Result<Vec<String>> {
    let entries = list_entries(backend, archive, password)?;
    Ok(entries
        .into_iter()
        .filter(|header| !only_useful || header.is_useful())
        .map(|header| header.filename)
        .collect())
}

/// Reads the archive comment as UTF-8; empty when there is none.
///
/// Invalid UTF-8 sequences are replaced.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened.
pub fn read_comment<B: Backend>(backend: &B, archive: &Path) -> Result<String> {
    let mut state = PasswordState::default();
    let session = ArchiveSession::open(backend, archive, OpenMode::List, true, &mut state)?;
    let comment = String::from_utf8_lossy(session.comment().unwrap_or_default()).into_owned();
    session.close()?;
    Ok(comment)
}
