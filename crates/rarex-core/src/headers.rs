//! Lazy iteration over archive headers.

use tracing::debug;

use crate::Result;
use crate::callback::PasswordState;
use crate::native::HeaderRecord;
use crate::native::NativeArchive;
use crate::session::ArchiveSession;

/// Single-pass iterator over the headers of one open archive.
///
/// Each entry's data is skipped, not tested, before the next header is
/// read, and a failure while skipping is ignored; it surfaces, if at all,
/// from the next header read. Entry data is therefore never decoded: in
/// [`OpenMode::Extract`](crate::native::OpenMode::Extract) an encrypted entry
/// is listed without asking for a password instead of failing with
/// [`PasswordRequired`](crate::ExtractionError::PasswordRequired). Use
/// [`extract_member`](crate::extract_member) to read data. After the end of the archive or the first error the iterator
/// yields nothing more, and the session is closed. Iterating again requires
/// a new session.
///
/// # Examples
///
/// ```
/// use rarex_core::native::MemoryArchive;
/// use rarex_core::native::MemoryBackend;
/// use rarex_core::native::OpenMode;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new()
///     .with_archive("a.rar", MemoryArchive::new().dir("d").file("d/f.txt", b"x"));
///
/// let names: Vec<String> = rarex_core::headers(&backend, "a.rar", None, OpenMode::List)?
///     .map(|header| header.map(|h| h.filename))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(names, ["d", "d/f.txt"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Headers<A: NativeArchive> {
    session: Option<ArchiveSession<A>>,
    password: PasswordState,
    pending: bool,
}

impl<A: NativeArchive> Headers<A> {
    /// Iterates over the headers of `session`.
    #[must_use]
    pub const fn new(session: ArchiveSession<A>, password: PasswordState) -> Self {
        Self {
            session: Some(session),
            password,
            pending: false,
        }
    }

    fn advance(&mut self) -> Result<Option<HeaderRecord>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        if self.pending {
            self.pending = false;
            if let Err(err) = session.skip(&mut self.password) {
                debug!(%err, "ignoring failure while skipping entry data");
            }
            self.password.reset();
        }
        let header = session.read_header(&mut self.password)?;
        self.pending = header.is_some();
        Ok(header)
    }

    fn finish(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }
}

impl<A: NativeArchive> Iterator for Headers<A> {
    type Item = Result<HeaderRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => self.finish().err().map(Err),
            Err(err) => {
                debug!(%err, "header iteration stopped");
                // Dropping closes the session; a close failure is only logged.
                self.session = None;
                Some(Err(err))
            }
        }
    }
}

impl<A: NativeArchive> std::iter::FusedIterator for Headers<A> {}
