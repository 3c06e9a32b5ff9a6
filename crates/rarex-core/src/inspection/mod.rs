//! Archive inspection without extraction.
//!
//! # Examples
//!
//! ```no_run
//! use rarex_core::inspection::list_names;
//! use rarex_core::inspection::read_comment;
//! use rarex_core::native::MemoryBackend;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MemoryBackend::new();
//! for name in list_names(&backend, Path::new("archive.rar"), true, None)? {
//!     println!("{name}");
//! }
//! println!("{}", read_comment(&backend, Path::new("archive.rar"))?);
//! # Ok(())
//! # }
//! ```

pub mod list;
pub mod verify;

pub use list::list_entries;
pub use list::list_names;
pub use list::read_comment;
pub use verify::compare_crcs;
pub use verify::nominal_crcs;
pub use verify::verify_crcs;
