//! Boundary to the native archive-decoding library.
//!
//! The extraction engine never parses the RAR container itself. Everything it
//! needs from the decoder goes through the two traits in this module:
//!
//! - [`Backend`] opens archives and reports the library version.
//! - [`NativeArchive`] is one open handle: it yields header records and
//!   processes (tests, skips or redirects) the entry under the cursor.
//!
//! Every call that can reach the password or data hooks takes the
//! [`Callback`] explicitly. The handle never stores it, so the borrow of the
//! callback ends when the call returns.
//!
//! Two implementations ship with the crate: [`memory::MemoryBackend`], an
//! in-process decoder over [`memory::MemoryArchive`] values, and
//! `unrar::UnrarBackend` (feature `unrar`), which binds the system UnRAR
//! library.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::time::SystemTime;

use thiserror::Error;

use crate::callback::Callback;

pub mod memory;
#[cfg(feature = "unrar")]
pub mod unrar;

pub use memory::MemoryArchive;
pub use memory::MemoryBackend;
pub use memory::MemoryEntry;
pub use memory::MemoryHandle;
#[cfg(feature = "unrar")]
pub use unrar::UnrarBackend;

/// Mode an archive is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Header enumeration only. Files split across volumes are reported once.
    List,
    /// Header enumeration that reports every volume part of a split file.
    ListIncSplit,
    /// Full processing of entry data.
    Extract,
}

/// What the decoder should do with the entry under the cursor.
#[derive(Debug)]
pub enum Directive<'a> {
    /// Decompress and verify the entry, delivering bytes to
    /// [`Callback::accept_data`].
    Test,
    /// Move past the entry without delivering any data.
    Skip,
    /// Decompress and verify the entry, writing bytes straight to the file.
    /// The data hook is not called.
    TestToFile(&'a mut File),
}

impl Directive<'_> {
    /// Short name used in log events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Skip => "skip",
            Self::TestToFile(_) => "test-to-file",
        }
    }
}

/// Kind of redirection carried by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RedirType {
    /// Regular entry.
    #[default]
    None,
    /// Unix symbolic link.
    UnixSymlink,
    /// Windows symbolic link.
    WindowsSymlink,
    /// Windows junction point.
    Junction,
    /// Hard link to an earlier entry.
    HardLink,
    /// Copy of an earlier entry.
    FileCopy,
    /// Redirection type this crate does not know about.
    Unknown(u32),
}

impl RedirType {
    /// Maps the raw redirection code used by the RAR format.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::UnixSymlink,
            2 => Self::WindowsSymlink,
            3 => Self::Junction,
            4 => Self::HardLink,
            5 => Self::FileCopy,
            other => Self::Unknown(other),
        }
    }

    /// Returns `true` for any redirection.
    #[must_use]
    pub const fn is_redirection(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Metadata for one archive entry, valid until the next header is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// Entry name with `/` as the only separator.
    pub filename: String,
    /// Entry is a directory.
    pub is_dir: bool,
    /// Redirection kind.
    pub redir_type: RedirType,
    /// Redirection target, when the archive records one.
    pub redir_name: Option<String>,
    /// CRC32 recorded for the entry (the whole file on a final volume part).
    pub file_crc: u32,
    /// Unpacked size of the logical file.
    pub unpack_size: u64,
    /// Packed size of this part.
    pub pack_size: u64,
    /// Modification time.
    pub file_time: SystemTime,
    /// Entry data is encrypted.
    pub encrypted: bool,
    /// Entry continues from a previous volume.
    pub split_before: bool,
    /// Entry continues in the next volume.
    pub split_after: bool,
}

impl HeaderRecord {
    /// Creates a record for a regular file, normalizing `\` separators.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: normalize_separators(filename.into()),
            is_dir: false,
            redir_type: RedirType::None,
            redir_name: None,
            file_crc: 0,
            unpack_size: 0,
            pack_size: 0,
            file_time: SystemTime::UNIX_EPOCH,
            encrypted: false,
            split_before: false,
            split_after: false,
        }
    }

    /// Returns `true` when the entry carries file content: not a directory
    /// and not a redirection.
    #[must_use]
    pub const fn is_useful(&self) -> bool {
        !(self.is_dir || self.redir_type.is_redirection())
    }
}

fn normalize_separators(name: String) -> String {
    if name.contains('\\') {
        name.replace('\\', "/")
    } else {
        name
    }
}

/// Status codes reported by the native decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCode {
    /// Out of memory.
    NoMemory,
    /// Data failed its integrity check (also: wrong password).
    BadData,
    /// Archive structure is damaged.
    BadArchive,
    /// Not a RAR archive, or an unsupported version.
    UnknownFormat,
    /// Archive or volume could not be opened.
    EOpen,
    /// Output file could not be created.
    ECreate,
    /// File could not be closed.
    EClose,
    /// Read error.
    ERead,
    /// Write error.
    EWrite,
    /// Buffer too small.
    SmallBuf,
    /// Unknown failure, or a failure inside the callback.
    Unknown,
    /// Entry is encrypted and no password was provided.
    MissingPassword,
    /// Reference to a file that is not in the archive.
    EReference,
    /// Wrong password (newer decoders only).
    BadPassword,
    /// Code outside the known range.
    Other(i32),
}

impl NativeCode {
    /// Maps a raw `ERAR_*` value. Returns `None` for success and end of archive.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 | 10 => return None,
            11 => Self::NoMemory,
            12 => Self::BadData,
            13 => Self::BadArchive,
            14 => Self::UnknownFormat,
            15 => Self::EOpen,
            16 => Self::ECreate,
            17 => Self::EClose,
            18 => Self::ERead,
            19 => Self::EWrite,
            20 => Self::SmallBuf,
            21 => Self::Unknown,
            22 => Self::MissingPassword,
            23 => Self::EReference,
            24 => Self::BadPassword,
            other => Self::Other(other),
        })
    }

    /// Symbolic name of the code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoMemory => "ERAR_NO_MEMORY",
            Self::BadData => "ERAR_BAD_DATA",
            Self::BadArchive => "ERAR_BAD_ARCHIVE",
            Self::UnknownFormat => "ERAR_UNKNOWN_FORMAT",
            Self::EOpen => "ERAR_EOPEN",
            Self::ECreate => "ERAR_ECREATE",
            Self::EClose => "ERAR_ECLOSE",
            Self::ERead => "ERAR_EREAD",
            Self::EWrite => "ERAR_EWRITE",
            Self::SmallBuf => "ERAR_SMALL_BUF",
            Self::Unknown => "ERAR_UNKNOWN",
            Self::MissingPassword => "ERAR_MISSING_PASSWORD",
            Self::EReference => "ERAR_EREFERENCE",
            Self::BadPassword => "ERAR_BAD_PASSWORD",
            Self::Other(_) => "Unknown error",
        }
    }
}

impl fmt::Display for NativeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(raw) => write!(f, "Unknown error ({raw})"),
            code => f.write_str(code.name()),
        }
    }
}

/// Fault raised while the decoder was driving the callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackFault {
    /// The data hook returned `false`.
    #[error("Processing canceled by the callback")]
    Cancelled,
    /// The next volume of a multi-part archive does not exist.
    #[error("Could not find next part of a multi-part archive")]
    MissingVolume,
    /// The decoder handed the callback a negative buffer length.
    #[error("Invalid buffer length sent to callback: {0}")]
    InvalidBuffer(i64),
    /// Writing to the redirected descriptor failed.
    #[error("Failed to write all bytes to output file. Error: {0}")]
    WriteFailed(String),
}

/// Failure reported by the native collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// Plain status code.
    #[error("{0}")]
    Code(NativeCode),
    /// The callback protocol failed.
    #[error("{0}")]
    Callback(CallbackFault),
}

impl NativeError {
    /// Returns the status code, if this is a plain code failure.
    #[must_use]
    pub const fn code(&self) -> Option<NativeCode> {
        match self {
            Self::Code(code) => Some(*code),
            Self::Callback(_) => None,
        }
    }
}

impl From<NativeCode> for NativeError {
    fn from(code: NativeCode) -> Self {
        Self::Code(code)
    }
}

impl From<CallbackFault> for NativeError {
    fn from(fault: CallbackFault) -> Self {
        Self::Callback(fault)
    }
}

/// Result of a native call.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// An open archive handle.
///
/// A handle is single-threaded and not reentrant: the engine drives it from
/// one flow at a time. `close` is called exactly once by
/// [`ArchiveSession`](crate::session::ArchiveSession); implementations should
/// also release native resources on drop.
pub trait NativeArchive {
    /// Reads the next header. Returns `Ok(None)` at the end of the archive.
    ///
    /// Reading a header while the previous entry is still unprocessed skips
    /// that entry.
    fn read_next_header(&mut self, callback: &mut dyn Callback) -> NativeResult<Option<HeaderRecord>>;

    /// Processes the entry whose header was read last.
    fn process_entry(
        &mut self,
        directive: Directive<'_>,
        callback: &mut dyn Callback,
    ) -> NativeResult<()>;

    /// Releases the handle.
    fn close(&mut self) -> NativeResult<()>;
}

/// Entry point of a native decoder.
pub trait Backend {
    /// Handle type produced by [`Backend::open`].
    type Archive: NativeArchive;

    /// Opens the archive at `path`.
    ///
    /// When `want_comment` is set, the archive comment is returned as raw
    /// bytes (`Some(vec![])` when the archive has none).
    fn open(
        &self,
        path: &Path,
        mode: OpenMode,
        want_comment: bool,
        callback: &mut dyn Callback,
    ) -> NativeResult<(Self::Archive, Option<Vec<u8>>)>;

    /// Version of the native library.
    fn version(&self) -> u32;
}
