//! CRC32 verification against the checksums recorded in the archive.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::ExtractionError;
use crate::Result;
use crate::callback::PasswordState;
use crate::extraction::CrcMap;
use crate::headers::Headers;
use crate::native::Backend;
use crate::native::OpenMode;
use crate::session::ArchiveSession;

/// Reads the recorded checksum of every file.
///
/// The archive is listed with volume parts included, and a later part
/// overrides an earlier one, so a split file maps to the checksum stored on
/// its final part: the CRC32 of the whole file.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or listed.
pub fn nominal_crcs<B: Backend>(
    backend: &B,
    archive: &Path,
    password: Option<&str>,
) -> Result<HashMap<String, u32>> {
    let mut state = PasswordState::new(password.map(String::from));
    let session = ArchiveSession::open(backend, archive, OpenMode::ListIncSplit, false, &mut state)?;

    let mut crcs = HashMap::new();
    for header in Headers::new(session, state) {
        let header = header?;
        crcs.insert(header.filename, header.file_crc);
    }
    Ok(crcs)
}

/// Compares accumulated checksums with the recorded ones.
///
/// A name missing from `nominal` is compared against `0`. Stops at the first
/// mismatch, in filename order.
///
/// # Errors
///
/// Returns [`ExtractionError::DataCorruption`] on a mismatch.
///
/// # Examples
///
/// ```
/// use rarex_core::extraction::CrcMap;
/// use rarex_core::inspection::compare_crcs;
/// use std::collections::HashMap;
///
/// let nominal = HashMap::from([("a.txt".to_string(), 0x1234)]);
///
/// let mut accumulated = CrcMap::new();
/// accumulated.insert("a.txt", 0x1234);
/// assert!(compare_crcs(&nominal, &accumulated).is_ok());
///
/// accumulated.insert("a.txt", 0x9999);
/// assert!(compare_crcs(&nominal, &accumulated).is_err());
/// ```
pub fn compare_crcs(nominal: &HashMap<String, u32>, accumulated: &CrcMap) -> Result<()> {
    for (filename, actual) in accumulated.iter() {
        let expected = nominal.get(filename).copied().unwrap_or(0);
        if expected != actual {
            return Err(ExtractionError::DataCorruption {
                filename: filename.to_string(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Re-reads `archive` and checks `accumulated` against it.
///
/// # Errors
///
/// Returns an error if the archive cannot be listed, or
/// [`ExtractionError::DataCorruption`] on the first mismatch.
pub fn verify_crcs<B: Backend>(
    backend: &B,
    archive: &Path,
    accumulated: &CrcMap,
    password: Option<&str>,
) -> Result<()> {
    let nominal = nominal_crcs(backend, archive, password)?;
    compare_crcs(&nominal, accumulated)?;
    debug!(archive = %archive.display(), files = accumulated.len(), "checksums verified");
    Ok(())
}
