//! Type-safe wrappers for extraction destinations.
//!
//! Archive content never reaches the filesystem through a raw `PathBuf`: the
//! engine writes only through [`SafePath`] and [`SafeSymlink`], which can be
//! built only by passing the confinement checks against a [`DestDir`].

pub mod dest_dir;
pub mod entry_kind;
pub mod safe_path;
pub mod safe_symlink;

pub use dest_dir::DestDir;
pub use entry_kind::EntryKind;
pub use safe_path::SafePath;
pub use safe_symlink::SafeSymlink;
