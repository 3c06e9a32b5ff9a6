//! Symlink target confinement.

use std::io;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;
use super::SafePath;
use super::safe_path::normalize;

/// Returns `true` if `target`, read relative to the directory containing the
/// link, stays inside `root`.
///
/// Unlike [`resolve`](super::safe_path::resolve), a target equal to the root
/// itself is accepted. The root boundary is a full path component: with root
/// `/out`, `/out2/x` is rejected.
///
/// # Examples
///
/// ```
/// use rarex_core::types::safe_symlink::symlink_target_safe;
/// use std::path::Path;
///
/// let root = Path::new("/out");
/// assert!(symlink_target_safe(root, Path::new("/out/a"), "../b.txt"));
/// assert!(symlink_target_safe(root, Path::new("/out/a"), ".."));
/// assert!(!symlink_target_safe(root, Path::new("/out/a"), "../../etc/passwd"));
/// assert!(!symlink_target_safe(root, Path::new("/out"), "/etc/passwd"));
/// ```
#[must_use]
pub fn symlink_target_safe(root: &Path, link_dir: &Path, target: &str) -> bool {
    let root = normalize(root);
    normalize(&link_dir.join(target)).starts_with(&root)
}

/// A symlink whose location and target are both confined to a [`DestDir`].
///
/// The stored target is the text from the archive, unchanged. Only its
/// resolution has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSymlink {
    link: SafePath,
    target: PathBuf,
}

impl SafeSymlink {
    /// Validates `target` for a link at `link`. Returns `None` when the
    /// target escapes the destination.
    #[must_use]
    pub fn new(dest: &DestDir, link: SafePath, target: &str) -> Option<Self> {
        symlink_target_safe(dest.as_path(), link.parent(), target).then(|| Self {
            link,
            target: PathBuf::from(target),
        })
    }

    /// Location of the link.
    #[inline]
    #[must_use]
    pub fn link_path(&self) -> &Path {
        self.link.as_path()
    }

    /// Target text as stored in the archive.
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target
    }

    /// Creates the link, and its containing directory if missing.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from directory or link creation. An existing
    /// file at the link location yields [`io::ErrorKind::AlreadyExists`].
    #[cfg(unix)]
    pub fn create(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.link.parent())?;
        std::os::unix::fs::symlink(&self.target, self.link.as_path())
    }

    /// Symlink creation is not available on this platform.
    #[cfg(not(unix))]
    pub fn create(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symlinks are not supported on this platform",
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path()).expect("failed to create dest");
        (temp, dest)
    }

    #[test]
    fn test_target_inside() {
        assert!(symlink_target_safe(
            Path::new("/out"),
            Path::new("/out/a/b"),
            "../c/file"
        ));
    }

    #[test]
    fn test_target_equal_to_root_allowed() {
        assert!(symlink_target_safe(Path::new("/out"), Path::new("/out/a"), ".."));
        assert!(symlink_target_safe(Path::new("/out"), Path::new("/out"), "."));
    }

    #[test]
    fn test_target_escape_rejected() {
        assert!(!symlink_target_safe(Path::new("/out"), Path::new("/out"), ".."));
        assert!(!symlink_target_safe(
            Path::new("/out"),
            Path::new("/out/a"),
            "../../../etc/shadow"
        ));
    }

    #[test]
    fn test_target_sibling_prefix_rejected() {
        assert!(!symlink_target_safe(Path::new("/out"), Path::new("/out"), "../out2/x"));
    }

    #[test]
    fn test_absolute_target() {
        assert!(!symlink_target_safe(Path::new("/out"), Path::new("/out"), "/etc"));
        assert!(symlink_target_safe(Path::new("/out"), Path::new("/out"), "/out/x"));
    }

    #[test]
    fn test_safe_symlink_new() {
        let (_temp, dest) = create_test_dest();
        let link = SafePath::resolve(&dest, "dir/link").unwrap();
        let symlink = SafeSymlink::new(&dest, link, "../target.txt").unwrap();
        assert_eq!(symlink.target_path(), Path::new("../target.txt"));
        assert!(symlink.link_path().ends_with("dir/link"));

        let link = SafePath::resolve(&dest, "dir/link").unwrap();
        assert!(SafeSymlink::new(&dest, link, "../../outside").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_safe_symlink_create() {
        let (temp, dest) = create_test_dest();
        std::fs::write(temp.path().join("target.txt"), b"data").unwrap();

        let link = SafePath::resolve(&dest, "nested/link").unwrap();
        let symlink = SafeSymlink::new(&dest, link, "../target.txt").unwrap();
        symlink.create().unwrap();

        let link_path = temp.path().join("nested/link");
        assert!(link_path.is_symlink());
        assert_eq!(std::fs::read(&link_path).unwrap(), b"data");

        let err = symlink.create().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }
}
