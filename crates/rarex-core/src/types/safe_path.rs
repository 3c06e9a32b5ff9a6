//! Destination path confinement.
//!
//! Archive entry names are untrusted. Before anything is written, the name is
//! joined to the destination root and normalized lexically; the result must be
//! a strict descendant of the root. This blocks `..` escapes, absolute names
//! that would replace the root on join, and names that collapse to the root
//! itself (`""`, `"."`, `"a/.."`).

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;
use crate::ExtractionError;
use crate::Result;

/// Normalizes a path lexically, without touching the filesystem.
///
/// `.` components are dropped and `..` removes the preceding normal component.
/// A `..` directly under the root stays at the root. Leading `..` components
/// of a relative path are kept.
///
/// # Examples
///
/// ```
/// use rarex_core::types::safe_path::normalize;
/// use std::path::Path;
///
/// assert_eq!(normalize(Path::new("/a/./b/../c")), Path::new("/a/c"));
/// assert_eq!(normalize(Path::new("/../etc")), Path::new("/etc"));
/// assert_eq!(normalize(Path::new("../x")), Path::new("../x"));
/// ```
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => {
                    normalized.push(Component::ParentDir);
                }
            },
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

/// Resolves an entry name against `root`.
///
/// Returns the normalized join when it is a strict descendant of the
/// normalized root, `None` otherwise. Re-resolving a returned path against
/// the same root returns it unchanged.
///
/// # Examples
///
/// ```
/// use rarex_core::types::safe_path::resolve;
/// use std::path::Path;
///
/// let root = Path::new("/srv/out");
/// assert_eq!(
///     resolve(root, Path::new("docs/./a.txt")),
///     Some(Path::new("/srv/out/docs/a.txt").to_path_buf())
/// );
/// assert_eq!(resolve(root, Path::new("../etc/passwd")), None);
/// assert_eq!(resolve(root, Path::new("/etc/passwd")), None);
/// assert_eq!(resolve(root, Path::new("")), None);
/// ```
#[must_use]
pub fn resolve(root: &Path, relative: &Path) -> Option<PathBuf> {
    let root = normalize(root);
    let resolved = normalize(&root.join(relative));
    (resolved != root && resolved.starts_with(&root)).then_some(resolved)
}

/// A destination path proven to lie strictly inside a [`DestDir`].
///
/// # Examples
///
/// ```no_run
/// use rarex_core::types::DestDir;
/// use rarex_core::types::SafePath;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/out")?;
/// let safe = SafePath::resolve(&dest, "docs/readme.txt")?;
/// assert!(safe.as_path().starts_with(dest.as_path()));
///
/// assert!(SafePath::resolve(&dest, "../escape.txt").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Resolves `name` inside `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] when the name escapes or
    /// collapses to the destination root.
    pub fn resolve(dest: &DestDir, name: &str) -> Result<Self> {
        resolve(dest.as_path(), Path::new(name))
            .map(Self)
            .ok_or_else(|| ExtractionError::PathTraversal {
                path: PathBuf::from(name),
            })
    }

    /// Returns the absolute path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns the directory that contains this path.
    #[must_use]
    pub fn parent(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.0
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
    fn test_normalize_removes_cur_dir() {
        assert_eq!(normalize(Path::new("/a/./b/.")), Path::new("/a/b"));
    }

    #[test]
    fn test_normalize_parent_at_root() {
        assert_eq!(normalize(Path::new("/../../x")), Path::new("/x"));
    }

    #[test]
    fn test_normalize_relative_leading_parent() {
        assert_eq!(normalize(Path::new("../../a/b/..")), Path::new("../../a"));
    }

    #[test]
    fn test_resolve_simple() {
        let resolved = resolve(Path::new("/root"), Path::new("a/b.txt"));
        assert_eq!(resolved, Some(PathBuf::from("/root/a/b.txt")));
    }

    #[test]
    fn test_resolve_inner_parent_allowed() {
        let resolved = resolve(Path::new("/root"), Path::new("a/../b.txt"));
        assert_eq!(resolved, Some(PathBuf::from("/root/b.txt")));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        assert_eq!(resolve(Path::new("/root"), Path::new("../x")), None);
        assert_eq!(resolve(Path::new("/root"), Path::new("a/../../x")), None);
    }

    #[test]
    fn test_resolve_rejects_sibling_with_shared_prefix() {
        assert_eq!(resolve(Path::new("/root"), Path::new("../root2/x")), None);
    }

    #[test]
    fn test_resolve_rejects_root_equality() {
        assert_eq!(resolve(Path::new("/root"), Path::new("")), None);
        assert_eq!(resolve(Path::new("/root"), Path::new(".")), None);
        assert_eq!(resolve(Path::new("/root"), Path::new("a/..")), None);
    }

    #[test]
    fn test_resolve_absolute_override() {
        assert_eq!(resolve(Path::new("/root"), Path::new("/etc/passwd")), None);
        assert_eq!(
            resolve(Path::new("/root"), Path::new("/root/inside")),
            Some(PathBuf::from("/root/inside"))
        );
    }

    #[test]
    fn test_resolve_normalizes_root() {
        let resolved = resolve(Path::new("/srv/./out/"), Path::new("f"));
        assert_eq!(resolved, Some(PathBuf::from("/srv/out/f")));
    }

    #[test]
    fn test_resolve_idempotent() {
        let root = Path::new("/root");
        let first = resolve(root, Path::new("x/./y/../z")).unwrap();
        assert_eq!(resolve(root, &first), Some(first.clone()));
    }

    #[test]
    fn test_safe_path_resolve() {
        let (_temp, dest) = create_test_dest();
        let safe = SafePath::resolve(&dest, "dir/file.txt").unwrap();
        assert!(safe.as_path().starts_with(dest.as_path()));
        assert_eq!(safe.parent(), dest.as_path().join("dir"));
    }

    #[test]
    fn test_safe_path_traversal_error() {
        let (_temp, dest) = create_test_dest();
        let err = SafePath::resolve(&dest, "../../etc/passwd").unwrap_err();
        assert!(matches!(err, ExtractionError::PathTraversal { .. }));
        assert!(err.is_security_violation());
    }
}
