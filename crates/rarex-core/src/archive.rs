//! Archive handle bound to a decoder backend.

use std::path::Path;
use std::path::PathBuf;

use crate::ExtractionReport;
use crate::Result;
use crate::config::ExtractOptions;
use crate::extraction::ExtractedMember;
use crate::headers::Headers;
use crate::native::Backend;
use crate::native::HeaderRecord;
use crate::native::OpenMode;
use crate::report::ProgressCallback;

/// A RAR archive on disk together with the options used to read it.
///
/// Nothing is opened until an operation runs; each operation opens and
/// closes its own session.
///
/// # Examples
///
/// ```
/// use rarex_core::Archive;
/// use rarex_core::native::MemoryArchive;
/// use rarex_core::native::MemoryBackend;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new().with_archive(
///     "notes.rar",
///     MemoryArchive::new()
///         .file("todo.txt", b"buy milk\n")
///         .comment("weekly"),
/// );
///
/// let archive = Archive::new(&backend, "notes.rar");
/// assert_eq!(archive.names(true)?, ["todo.txt"]);
/// assert_eq!(archive.comment()?, "weekly");
///
/// let member = archive.read("todo.txt")?.expect("member exists");
/// assert_eq!(member.data, b"buy milk\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Archive<'b, B: Backend> {
    backend: &'b B,
    path: PathBuf,
    options: ExtractOptions,
}

impl<'b, B: Backend> Archive<'b, B> {
    /// Binds `path` to `backend` with default options.
    #[must_use]
    pub fn new<P: AsRef<Path>>(backend: &'b B, path: P) -> Self {
        Self {
            backend,
            path: path.as_ref().to_path_buf(),
            options: ExtractOptions::default(),
        }
    }

    /// Replaces the extraction options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the password used for encrypted entries.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.options.password = Some(password.into());
        self
    }

    /// Returns the path to the archive file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the extraction options.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Iterates over the headers, one per file.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be opened.
    pub fn headers(&self) -> Result<Headers<B::Archive>> {
        crate::api::headers(
            self.backend,
            &self.path,
            self.options.password.as_deref(),
            OpenMode::List,
        )
    }

    /// Lists entry names; see [`list_names`](crate::inspection::list_names).
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be opened or listed.
    pub fn names(&self, only_useful: bool) -> Result<Vec<String>> {
        crate::inspection::list_names(
            self.backend,
            &self.path,
            only_useful,
            self.options.password.as_deref(),
        )
    }

    /// Reads the archive comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be opened.
    pub fn comment(&self) -> Result<String> {
        crate::inspection::read_comment(self.backend, &self.path)
    }

    /// Extracts everything into `output_dir`.
    ///
    /// # Errors
    ///
    /// See [`extract_archive`](crate::extract_archive).
    pub fn extract<P: AsRef<Path>>(&self, output_dir: P) -> Result<ExtractionReport> {
        crate::api::extract_archive(self.backend, &self.path, output_dir, &self.options)
    }

    /// Extracts everything into `output_dir`, reporting progress.
    ///
    /// # Errors
    ///
    /// See [`extract_archive`](crate::extract_archive).
    pub fn extract_with_progress<P: AsRef<Path>>(
        &self,
        output_dir: P,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExtractionReport> {
        crate::api::extract_archive_with_progress(
            self.backend,
            &self.path,
            output_dir,
            &self.options,
            progress,
        )
    }

    /// Reads the first regular file accepted by `predicate`.
    ///
    /// # Errors
    ///
    /// See [`extract_member`](crate::extract_member).
    pub fn extract_member<F>(&self, predicate: F) -> Result<Option<ExtractedMember>>
    where
        F: FnMut(&HeaderRecord) -> bool,
    {
        crate::api::extract_member(self.backend, &self.path, &self.options, predicate)
    }

    /// Reads the regular file named `name`.
    ///
    /// # Errors
    ///
    /// See [`extract_member`](crate::extract_member).
    pub fn read(&self, name: &str) -> Result<Option<ExtractedMember>> {
        self.extract_member(|header| header.filename == name)
    }
}
