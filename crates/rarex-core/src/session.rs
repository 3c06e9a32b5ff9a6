//! Lifetime of one open archive handle.

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::Result;
use crate::callback::Callback;
use crate::callback::Listing;
use crate::callback::PasswordState;
use crate::error::ExtractionError;
use crate::error::translate;
use crate::error::translate_open;
use crate::native::Backend;
use crate::native::Directive;
use crate::native::HeaderRecord;
use crate::native::NativeArchive;
use crate::native::NativeError;
use crate::native::NativeResult;
use crate::native::OpenMode;

/// One open archive.
///
/// The handle is closed exactly once: by [`ArchiveSession::close`], or on
/// drop if the session is abandoned on an early return or a panic.
#[derive(Debug)]
pub struct ArchiveSession<A: NativeArchive> {
    handle: A,
    path: PathBuf,
    mode: OpenMode,
    comment: Option<Vec<u8>>,
    closed: bool,
}

impl<A: NativeArchive> ArchiveSession<A> {
    /// Opens `path` through `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::OpenFailure`] when the decoder cannot open
    /// the archive.
    pub fn open<B>(
        backend: &B,
        path: &Path,
        mode: OpenMode,
        want_comment: bool,
        password: &mut PasswordState,
    ) -> Result<Self>
    where
        B: Backend<Archive = A>,
    {
        let (handle, comment) = backend
            .open(path, mode, want_comment, &mut Listing::new(password))
            .map_err(|err| translate_open(err, path))?;
        debug!(archive = %path.display(), ?mode, "opened archive");
        Ok(Self {
            handle,
            path: path.to_path_buf(),
            mode,
            comment,
            closed: false,
        })
    }

    /// Archive path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the archive was opened in.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Raw comment, when it was requested at open.
    #[must_use]
    pub fn comment(&self) -> Option<&[u8]> {
        self.comment.as_deref()
    }

    /// Reads the next header. `Ok(None)` marks the end of the archive.
    ///
    /// # Errors
    ///
    /// Returns the translated native failure.
    pub fn read_header(&mut self, password: &mut PasswordState) -> Result<Option<HeaderRecord>> {
        let result = self.handle.read_next_header(&mut Listing::new(password));
        result.map_err(|err| self.translate(err, password))
    }

    /// Moves past the current entry without delivering data.
    ///
    /// # Errors
    ///
    /// Returns the translated native failure.
    pub fn skip(&mut self, password: &mut PasswordState) -> Result<()> {
        let result = self
            .handle
            .process_entry(Directive::Skip, &mut Listing::new(password));
        result.map_err(|err| self.translate(err, password))
    }

    /// Processes the current entry, discarding any data.
    ///
    /// # Errors
    ///
    /// Returns the translated native failure.
    pub fn discard(&mut self, password: &mut PasswordState) -> Result<()> {
        let result = self
            .handle
            .process_entry(Directive::Test, &mut Listing::new(password));
        result.map_err(|err| self.translate(err, password))
    }

    /// Processes the current entry with a caller-supplied sink.
    ///
    /// The raw result is returned so the caller can release the sink's
    /// borrow of the password state before translating a failure with
    /// [`ArchiveSession::translate`].
    pub fn process(
        &mut self,
        directive: Directive<'_>,
        callback: &mut dyn Callback,
    ) -> NativeResult<()> {
        self.handle.process_entry(directive, callback)
    }

    /// Translates a native failure from this session.
    #[must_use]
    pub fn translate(&self, err: NativeError, password: &PasswordState) -> ExtractionError {
        translate(err, &self.path, password)
    }

    /// Closes the handle.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnderlyingFailure`] if the decoder reports
    /// a failure while closing.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let result = self.handle.close();
        debug!(archive = %self.path.display(), "closed archive");
        result.map_err(|source| ExtractionError::UnderlyingFailure {
            path: self.path.clone(),
            source,
        })
    }
}

impl<A: NativeArchive> Drop for ArchiveSession<A> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.handle.close() {
            warn!(archive = %self.path.display(), %err, "failed to close archive");
        } else {
            debug!(archive = %self.path.display(), "closed archive on drop");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::native::MemoryArchive;
    use crate::native::MemoryBackend;
    use crate::native::MemoryEntry;
    use crate::native::NativeCode;

    fn backend() -> MemoryBackend {
        MemoryBackend::new().with_archive(
            "a.rar",
            MemoryArchive::new()
                .file("one.txt", b"one\n")
                .entry(MemoryEntry::file("locked.txt", b"x").encrypted("pw"))
                .comment("some comment\n"),
        )
    }

    #[test]
    fn test_open_failure() {
        let backend = backend();
        let mut password = PasswordState::default();
        let err = ArchiveSession::open(
            &backend,
            Path::new("nope.rar"),
            OpenMode::List,
            false,
            &mut password,
        )
        .unwrap_err();
        match err {
            ExtractionError::OpenFailure { path, source } => {
                assert_eq!(path, Path::new("nope.rar"));
                assert_eq!(source, NativeError::Code(NativeCode::EOpen));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_comment_requested() {
        let backend = backend();
        let mut password = PasswordState::default();
        let session =
            ArchiveSession::open(&backend, Path::new("a.rar"), OpenMode::List, true, &mut password)
                .unwrap();
        assert_eq!(session.comment(), Some(&b"some comment\n"[..]));
        assert_eq!(session.mode(), OpenMode::List);
        session.close().unwrap();
    }

    #[test]
    fn test_explicit_close_runs_once() {
        let backend = backend();
        let mut password = PasswordState::default();
        let session = ArchiveSession::open(
            &backend,
            Path::new("a.rar"),
            OpenMode::List,
            false,
            &mut password,
        )
        .unwrap();
        session.close().unwrap();
        assert_eq!(backend.open_count(), 1);
        assert_eq!(backend.close_count(), 1);
    }

    #[test]
    fn test_drop_closes() {
        let backend = backend();
        let mut password = PasswordState::default();
        {
            let mut session = ArchiveSession::open(
                &backend,
                Path::new("a.rar"),
                OpenMode::Extract,
                false,
                &mut password,
            )
            .unwrap();
            session.read_header(&mut password).unwrap();
        }
        assert_eq!(backend.close_count(), 1);
    }

    #[test]
    fn test_close_after_failure() {
        fn failing(backend: &MemoryBackend) -> Result<()> {
            let mut password = PasswordState::default();
            let mut session = ArchiveSession::open(
                backend,
                Path::new("a.rar"),
                OpenMode::Extract,
                false,
                &mut password,
            )?;
            session.read_header(&mut password)?;
            session.skip(&mut password)?;
            session.read_header(&mut password)?;
            session.discard(&mut password)?;
            session.close()
        }

        let backend = backend();
        let err = failing(&backend).unwrap_err();
        assert!(matches!(err, ExtractionError::PasswordRequired { .. }));
        assert_eq!(backend.close_count(), 1);
    }
}
