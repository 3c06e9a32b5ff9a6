//! Extraction operation reporting.

use std::path::Path;
use std::time::Duration;

/// Report of an archive extraction operation.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files written (a file rebuilt from several volume
    /// parts counts once).
    pub files_extracted: usize,

    /// Number of directory entries materialized.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Entries that were not materialized: unsafe or unsupported links,
    /// unsafe directories, unnamed entries.
    pub entries_skipped: usize,

    /// Volume parts appended to a file already written in this pass.
    pub continuation_writes: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// CRC32 checksums were compared against the archive.
    pub verified: bool,

    /// Duration of the extraction operation.
    pub duration: Duration,

    /// Warnings generated during extraction.
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns total number of items materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created + self.symlinks_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Callback trait for progress reporting during extraction.
///
/// The number of entries is not known before the pass ends, so entries are
/// numbered as they are met.
///
/// # Examples
///
/// ```
/// use rarex_core::ProgressCallback;
/// use std::path::Path;
///
/// struct SimpleProgress;
///
/// impl ProgressCallback for SimpleProgress {
///     fn on_entry_start(&mut self, path: &Path, current: usize) {
///         println!("Processing #{}: {}", current, path.display());
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, path: &Path) {
///         println!("Completed: {}", path.display());
///     }
///
///     fn on_complete(&mut self) {
///         println!("Extraction complete");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called before an entry is processed.
    ///
    /// # Arguments
    ///
    /// * `path` - Entry name as stored in the archive
    /// * `current` - Running entry number (1-indexed)
    fn on_entry_start(&mut self, path: &Path, current: usize);

    /// Called after bytes of an entry were written.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called when an entry has been completely processed.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called when the whole pass, including verification, is complete.
    fn on_complete(&mut self);
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}
