//! Extraction of a single member into memory.

use tracing::debug;
use tracing::warn;

use crate::Result;
use crate::callback::BufferSink;
use crate::callback::PasswordState;
use crate::config::ExtractOptions;
use crate::native::Directive;
use crate::native::HeaderRecord;
use crate::native::NativeArchive;
use crate::session::ArchiveSession;

/// A member read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMember {
    /// Entry name as stored in the archive.
    pub filename: String,
    /// Decompressed content.
    pub data: Vec<u8>,
    /// CRC32 of `data`.
    pub crc: u32,
}

impl ExtractedMember {
    /// Splits into name and content.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.filename, self.data)
    }
}

/// Reads the first regular file accepted by `predicate`.
///
/// Directories, redirections and rejected entries are skipped without
/// decompression; a failure while skipping is ignored. A member split across
/// volumes is collected from all of its parts. Returns `Ok(None)` when no
/// entry matches.
///
/// # Errors
///
/// Returns the translated native failure while reading headers or the
/// matching member. Exceeding `max_member_size` yields
/// [`ExtractionError::CallbackCancellation`](crate::ExtractionError::CallbackCancellation).
pub fn read_member<A, P>(
    session: &mut ArchiveSession<A>,
    options: &ExtractOptions,
    mut predicate: P,
) -> Result<Option<ExtractedMember>>
where
    A: NativeArchive,
    P: FnMut(&HeaderRecord) -> bool,
{
    let mut password = PasswordState::new(options.password.clone());

    let header = loop {
        let Some(header) = session.read_header(&mut password)? else {
            return Ok(None);
        };
        if header.is_useful() && predicate(&header) {
            break header;
        }
        if let Err(err) = session.skip(&mut password) {
            debug!(entry = %header.filename, %err, "ignoring failure while skipping");
        }
        password.reset();
    };

    debug!(entry = %header.filename, "reading member");
    let mut buffer = Vec::new();
    let mut crc = 0;
    let mut part = header;
    loop {
        let mut sink = BufferSink::resume(&mut password, buffer, crc, options.max_member_size);
        let result = session.process(Directive::Test, &mut sink);
        (buffer, crc) = sink.into_parts();
        result.map_err(|err| session.translate(err, &password))?;
        password.reset();

        if !part.split_after {
            break;
        }
        match session.read_header(&mut password)? {
            Some(next) if next.filename == part.filename => part = next,
            next => {
                warn!(
                    entry = %part.filename,
                    next = next.as_ref().map(|h| h.filename.as_str()),
                    "member continuation not found"
                );
                break;
            }
        }
    }

    Ok(Some(ExtractedMember {
        filename: part.filename,
        data: buffer,
        crc,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use crate::native::MemoryArchive;
    use crate::native::MemoryBackend;
    use crate::native::MemoryEntry;
    use crate::native::OpenMode;
    use std::path::Path;

    fn read(
        archive: MemoryArchive,
        options: &ExtractOptions,
        predicate: impl FnMut(&HeaderRecord) -> bool,
    ) -> Result<Option<ExtractedMember>> {
        let backend = MemoryBackend::new().with_archive("m.rar", archive);
        let mut password = PasswordState::default();
        let mut session = ArchiveSession::open(
            &backend,
            Path::new("m.rar"),
            OpenMode::Extract,
            false,
            &mut password,
        )?;
        read_member(&mut session, options, predicate)
    }

    #[test]
    fn test_first_match() {
        let archive = MemoryArchive::new()
            .file("a.txt", b"a")
            .file("b.txt", b"b")
            .file("b.txt", b"second");
        let member = read(archive, &ExtractOptions::default(), |h| h.filename == "b.txt")
            .unwrap()
            .unwrap();
        assert_eq!(member.clone().into_parts(), ("b.txt".to_string(), b"b".to_vec()));
        assert_eq!(member.crc, crc32fast::hash(b"b"));
    }

    #[test]
    fn test_no_match() {
        let archive = MemoryArchive::new().file("a.txt", b"a");
        let member = read(archive, &ExtractOptions::default(), |_| false).unwrap();
        assert!(member.is_none());
    }

    #[test]
    fn test_directories_and_links_never_match() {
        let archive = MemoryArchive::new().dir("d").symlink("l", "d");
        let member = read(archive, &ExtractOptions::default(), |_| true).unwrap();
        assert!(member.is_none());
    }

    #[test]
    fn test_skipped_encrypted_entries_need_no_password() {
        let archive = MemoryArchive::new()
            .entry(MemoryEntry::file("locked", b"x").encrypted("pw"))
            .file("open", b"data");
        let member = read(archive, &ExtractOptions::default(), |h| h.filename == "open")
            .unwrap()
            .unwrap();
        assert_eq!(member.data, b"data");
    }

    #[test]
    fn test_split_member_collected() {
        let data: Vec<u8> = (0..100u8).collect();
        let archive = MemoryArchive::new()
            .entry(MemoryEntry::file("split.bin", data.clone()).split(4))
            .file("after", b"z");
        let member = read(archive, &ExtractOptions::default(), |h| h.filename == "split.bin")
            .unwrap()
            .unwrap();
        assert_eq!(member.data, data);
        assert_eq!(member.crc, crc32fast::hash(&data));
    }

    #[test]
    fn test_size_limit_cancels() {
        let archive = MemoryArchive::new().file("big", vec![1u8; 100]).chunk_size(10);
        let options = ExtractOptions::default().with_max_member_size(50);
        let err = read(archive, &options, |_| true).unwrap_err();
        assert!(matches!(err, ExtractionError::CallbackCancellation { .. }));
    }

    #[test]
    fn test_wrong_password() {
        let archive =
            MemoryArchive::new().entry(MemoryEntry::file("s", b"secret").encrypted("pw"));
        let options = ExtractOptions::default().with_password("nope");
        let err = read(archive, &options, |_| true).unwrap_err();
        assert!(matches!(err, ExtractionError::BadPassword { .. }));
    }
}
