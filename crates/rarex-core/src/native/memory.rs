//! In-process decoder over archives described in memory.
//!
//! [`MemoryBackend`] follows the same protocol as the native library:
//!
//! - `List` mode reports one header per logical file. `ListIncSplit` and
//!   `Extract` report one header per volume part. Every part carries the same
//!   name, and the final part carries the CRC32 of the whole file.
//! - Processing an encrypted entry calls the password hook once. A declined
//!   password fails with `ERAR_MISSING_PASSWORD`. A wrong one delivers
//!   garbled bytes, then fails with `ERAR_BAD_DATA`.
//! - Data is delivered in chunks; a `false` from the data hook fails with
//!   [`CallbackFault::Cancelled`].
//! - [`Directive::TestToFile`] writes to the file and never calls the data
//!   hook.
//! - Processing in the list modes, or with [`Directive::Skip`], moves past the
//!   entry without touching either hook.
//!
//! # Examples
//!
//! ```
//! use rarex_core::native::MemoryArchive;
//! use rarex_core::native::MemoryBackend;
//! use rarex_core::native::MemoryEntry;
//!
//! let backend = MemoryBackend::new().with_archive(
//!     "docs.rar",
//!     MemoryArchive::new()
//!         .dir("docs")
//!         .file("docs/readme.txt", b"hello\n")
//!         .entry(MemoryEntry::file("secret.txt", b"hidden").encrypted("pw")),
//! );
//! assert_eq!(backend.archive_count(), 1);
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::SystemTime;

use super::Backend;
use super::CallbackFault;
use super::Directive;
use super::HeaderRecord;
use super::NativeArchive;
use super::NativeCode;
use super::NativeError;
use super::NativeResult;
use super::OpenMode;
use super::RedirType;
use crate::callback::Callback;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DLL_VERSION: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    File(Vec<u8>),
    Dir,
    Redirect {
        redir_type: RedirType,
        target: Option<String>,
    },
}

/// One entry of a [`MemoryArchive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    name: String,
    content: Content,
    modified: SystemTime,
    password: Option<String>,
    corrupt: bool,
    recorded_crc: Option<u32>,
    parts: usize,
}

impl MemoryEntry {
    fn with_content(name: impl Into<String>, content: Content) -> Self {
        Self {
            name: name.into(),
            content,
            modified: SystemTime::UNIX_EPOCH,
            password: None,
            corrupt: false,
            recorded_crc: None,
            parts: 1,
        }
    }

    /// Regular file.
    #[must_use]
    pub fn file(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::with_content(name, Content::File(data.into()))
    }

    /// Directory.
    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self::with_content(name, Content::Dir)
    }

    /// Unix symlink pointing at `target`.
    #[must_use]
    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::redirect(name, RedirType::UnixSymlink, Some(target.into()))
    }

    /// Redirection of any kind.
    #[must_use]
    pub fn redirect(
        name: impl Into<String>,
        redir_type: RedirType,
        target: Option<String>,
    ) -> Self {
        Self::with_content(name, Content::Redirect { redir_type, target })
    }

    /// Sets the modification time.
    #[must_use]
    pub const fn modified(mut self, time: SystemTime) -> Self {
        self.modified = time;
        self
    }

    /// Encrypts the entry data with `password`.
    #[must_use]
    pub fn encrypted(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Makes processing fail with `ERAR_BAD_DATA` after the data is delivered.
    #[must_use]
    pub const fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }

    /// Overrides the CRC32 recorded for the whole file.
    #[must_use]
    pub const fn recorded_crc(mut self, crc: u32) -> Self {
        self.recorded_crc = Some(crc);
        self
    }

    /// Splits the entry across `parts` volumes.
    #[must_use]
    pub fn split(mut self, parts: usize) -> Self {
        self.parts = parts.max(1);
        self
    }

    /// Entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File content, empty for directories and redirections.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match &self.content {
            Content::File(data) => data,
            Content::Dir | Content::Redirect { .. } => &[],
        }
    }

    fn part_range(&self, part: usize, parts: usize) -> Range<usize> {
        let len = self.data().len();
        let size = len.div_ceil(parts);
        let start = (part * size).min(len);
        let end = (start + size).min(len);
        start..end
    }

    fn header(&self, part: usize, parts: usize) -> HeaderRecord {
        let mut header = HeaderRecord::new(self.name.clone());
        match &self.content {
            Content::File(_) => {}
            Content::Dir => header.is_dir = true,
            Content::Redirect { redir_type, target } => {
                header.redir_type = *redir_type;
                header.redir_name.clone_from(target);
            }
        }
        let data = self.data();
        let range = self.part_range(part, parts);
        let last = part + 1 == parts;
        header.unpack_size = data.len() as u64;
        header.pack_size = range.len() as u64;
        header.file_crc = if last {
            self.recorded_crc.unwrap_or_else(|| crc32fast::hash(data))
        } else {
            crc32fast::hash(&data[range])
        };
        header.file_time = self.modified;
        header.encrypted = self.password.is_some();
        header.split_before = part > 0;
        header.split_after = !last;
        header
    }
}

/// An archive described in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryArchive {
    entries: Vec<MemoryEntry>,
    comment: Option<Vec<u8>>,
    chunk_size: usize,
    missing_volume: bool,
    damaged: bool,
}

impl Default for MemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArchive {
    /// Creates an empty archive.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            comment: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            missing_volume: false,
            damaged: false,
        }
    }

    /// Appends an entry.
    #[must_use]
    pub fn entry(mut self, entry: MemoryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Appends a regular file.
    #[must_use]
    pub fn file(self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.entry(MemoryEntry::file(name, data))
    }

    /// Appends a directory.
    #[must_use]
    pub fn dir(self, name: impl Into<String>) -> Self {
        self.entry(MemoryEntry::dir(name))
    }

    /// Appends a Unix symlink.
    #[must_use]
    pub fn symlink(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.entry(MemoryEntry::symlink(name, target))
    }

    /// Sets the archive comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the size of the chunks handed to the data hook.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Drops the volume holding the final part of the last split entry.
    #[must_use]
    pub const fn missing_volume(mut self) -> Self {
        self.missing_volume = true;
        self
    }

    /// Makes every open fail with `ERAR_BAD_ARCHIVE`.
    #[must_use]
    pub const fn damaged(mut self) -> Self {
        self.damaged = true;
        self
    }

    /// Entries in archive order.
    #[must_use]
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    fn steps(&self, mode: OpenMode) -> Vec<Step> {
        let cut = if self.missing_volume {
            self.entries.iter().rposition(|e| e.parts > 1)
        } else {
            None
        };

        let mut steps = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let truncated = cut == Some(index);
            if mode == OpenMode::List {
                steps.push(Step::Header {
                    entry: index,
                    part: 0,
                    parts: 1,
                });
                if truncated {
                    steps.push(Step::MissingVolume);
                    break;
                }
                continue;
            }
            for part in 0..entry.parts {
                if truncated && part + 1 == entry.parts {
                    steps.push(Step::MissingVolume);
                    return steps;
                }
                steps.push(Step::Header {
                    entry: index,
                    part,
                    parts: entry.parts,
                });
            }
        }
        steps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Header {
        entry: usize,
        part: usize,
        parts: usize,
    },
    MissingVolume,
}

/// Decoder over a set of [`MemoryArchive`] values keyed by path.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    archives: HashMap<PathBuf, Arc<MemoryArchive>>,
    version: u32,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a backend with no archives.
    #[must_use]
    pub fn new() -> Self {
        Self {
            archives: HashMap::new(),
            version: DLL_VERSION,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registers `archive` under `path`.
    #[must_use]
    pub fn with_archive(mut self, path: impl Into<PathBuf>, archive: MemoryArchive) -> Self {
        self.insert(path, archive);
        self
    }

    /// Registers `archive` under `path`, replacing any previous one.
    pub fn insert(&mut self, path: impl Into<PathBuf>, archive: MemoryArchive) {
        self.archives.insert(path.into(), Arc::new(archive));
    }

    /// Overrides the reported library version.
    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Number of registered archives.
    #[must_use]
    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Number of successful opens so far.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of explicit closes so far.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Backend for MemoryBackend {
    type Archive = MemoryHandle;

    fn open(
        &self,
        path: &Path,
        mode: OpenMode,
        want_comment: bool,
        _callback: &mut dyn Callback,
    ) -> NativeResult<(MemoryHandle, Option<Vec<u8>>)> {
        let archive = self
            .archives
            .get(path)
            .ok_or(NativeError::Code(NativeCode::EOpen))?;
        if archive.damaged {
            return Err(NativeError::Code(NativeCode::BadArchive));
        }

        let comment = want_comment.then(|| archive.comment.clone().unwrap_or_default());
        self.opened.fetch_add(1, Ordering::SeqCst);
        let handle = MemoryHandle {
            steps: archive.steps(mode),
            archive: Arc::clone(archive),
            mode,
            cursor: 0,
            current: None,
            closed: false,
            close_counter: Arc::clone(&self.closed),
        };
        Ok((handle, comment))
    }

    fn version(&self) -> u32 {
        self.version
    }
}

/// Open handle produced by [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryHandle {
    archive: Arc<MemoryArchive>,
    steps: Vec<Step>,
    mode: OpenMode,
    cursor: usize,
    current: Option<Step>,
    closed: bool,
    close_counter: Arc<AtomicUsize>,
}

impl MemoryHandle {
    fn deliver(
        &self,
        directive: Directive<'_>,
        callback: &mut dyn Callback,
        bytes: &[u8],
    ) -> NativeResult<()> {
        match directive {
            Directive::TestToFile(file) => file
                .write_all(bytes)
                .map_err(|e| CallbackFault::WriteFailed(e.to_string()).into()),
            Directive::Test => {
                for chunk in bytes.chunks(self.archive.chunk_size) {
                    if !callback.accept_data(chunk) {
                        return Err(CallbackFault::Cancelled.into());
                    }
                }
                Ok(())
            }
            Directive::Skip => Ok(()),
        }
    }
}

impl NativeArchive for MemoryHandle {
    fn read_next_header(
        &mut self,
        _callback: &mut dyn Callback,
    ) -> NativeResult<Option<HeaderRecord>> {
        if self.closed {
            return Err(NativeError::Code(NativeCode::Unknown));
        }
        self.current = None;
        let Some(step) = self.steps.get(self.cursor).copied() else {
            return Ok(None);
        };
        match step {
            Step::MissingVolume => Err(CallbackFault::MissingVolume.into()),
            Step::Header { entry, part, parts } => {
                self.cursor += 1;
                self.current = Some(step);
                Ok(Some(self.archive.entries[entry].header(part, parts)))
            }
        }
    }

    fn process_entry(
        &mut self,
        directive: Directive<'_>,
        callback: &mut dyn Callback,
    ) -> NativeResult<()> {
        let Some(Step::Header { entry, part, parts }) = self.current.take() else {
            return Err(NativeError::Code(NativeCode::Unknown));
        };
        if self.mode != OpenMode::Extract || matches!(directive, Directive::Skip) {
            return Ok(());
        }

        let archive = Arc::clone(&self.archive);
        let entry = &archive.entries[entry];
        if !matches!(entry.content, Content::File(_)) {
            return Ok(());
        }
        let data = &entry.data()[entry.part_range(part, parts)];

        if let Some(expected) = &entry.password {
            match callback.supply_password() {
                None => return Err(NativeError::Code(NativeCode::MissingPassword)),
                Some(given) if given != *expected => {
                    let garbled: Vec<u8> = data.iter().map(|b| b ^ 0x5a).collect();
                    self.deliver(directive, callback, &garbled)?;
                    return Err(NativeError::Code(NativeCode::BadData));
                }
                Some(_) => {}
            }
        }

        self.deliver(directive, callback, data)?;
        if entry.corrupt {
            return Err(NativeError::Code(NativeCode::BadData));
        }
        Ok(())
    }

    fn close(&mut self) -> NativeResult<()> {
        if self.closed {
            return Err(NativeError::Code(NativeCode::EClose));
        }
        self.closed = true;
        self.current = None;
        self.close_counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
