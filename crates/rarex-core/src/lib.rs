//! Safe RAR extraction on top of a native decoder.
//!
//! `rarex-core` drives a RAR decoder (the UnRAR library, or the in-process
//! [`native::MemoryBackend`]) and takes care of everything around it:
//! confining every written path to the destination directory, refusing
//! symlinks that point outside it, reassembling files split across volumes,
//! telling a missing password apart from a wrong one, verifying CRC32
//! checksums, and closing every archive handle on every exit path.
//!
//! # Examples
//!
//! ```no_run
//! use rarex_core::ExtractOptions;
//! use rarex_core::extract_archive;
//! use rarex_core::native::MemoryBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MemoryBackend::new();
//! let options = ExtractOptions::default()
//!     .with_password("example")
//!     .with_verify_data(true);
//! let report = extract_archive(&backend, "archive.rar", "/output/dir", &options)?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod archive;
pub mod callback;
pub mod config;
pub mod error;
pub mod extraction;
pub mod headers;
pub mod inspection;
pub mod native;
pub mod report;
pub mod session;
pub mod types;

// Re-export main API
pub use api::extract_archive;
pub use api::extract_archive_with_progress;
pub use api::extract_member;
pub use api::headers;
pub use api::native_version;
pub use archive::Archive;
pub use config::Capabilities;
pub use config::ExtractOptions;
pub use error::ExtractionError;
pub use error::Result;
pub use extraction::ExtractedMember;
pub use headers::Headers;
pub use inspection::list_names;
pub use inspection::read_comment;
pub use native::HeaderRecord;
pub use native::OpenMode;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;

// Re-export types module for easier access
pub use types::DestDir;
pub use types::EntryKind;
pub use types::SafePath;
pub use types::SafeSymlink;
