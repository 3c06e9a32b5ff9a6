//! Classification of archive entries.

use crate::native::HeaderRecord;
use crate::native::RedirType;

/// How the extraction engine treats one header.
///
/// Every header maps to exactly one kind.
///
/// # Examples
///
/// ```
/// use rarex_core::native::HeaderRecord;
/// use rarex_core::native::RedirType;
/// use rarex_core::types::EntryKind;
///
/// let mut header = HeaderRecord::new("link");
/// header.redir_type = RedirType::UnixSymlink;
/// header.redir_name = Some("target.txt".into());
///
/// assert_eq!(
///     EntryKind::classify(&header),
///     EntryKind::Symlink {
///         target: Some("target.txt".into())
///     }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Header with an empty name. Nothing is materialized.
    Unnamed,

    /// Directory entry.
    Directory,

    /// Unix symbolic link. The target has NOT been validated.
    Symlink {
        /// Link target, when the archive records one.
        target: Option<String>,
    },

    /// Any other redirection (Windows link, junction, hard link, file copy).
    /// These are never materialized.
    Redirect(RedirType),

    /// Regular file content.
    File,
}

impl EntryKind {
    /// Classifies a header.
    #[must_use]
    pub fn classify(header: &HeaderRecord) -> Self {
        if header.filename.is_empty() {
            return Self::Unnamed;
        }
        if header.is_dir {
            return Self::Directory;
        }
        match header.redir_type {
            RedirType::None => Self::File,
            RedirType::UnixSymlink => Self::Symlink {
                target: header.redir_name.clone().filter(|t| !t.is_empty()),
            },
            other => Self::Redirect(other),
        }
    }

    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Short label used in log events and listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unnamed => "unnamed",
            Self::Directory => "dir",
            Self::Symlink { .. } => "symlink",
            Self::Redirect(_) => "redirect",
            Self::File => "file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_file() {
        assert_eq!(EntryKind::classify(&HeaderRecord::new("a.txt")), EntryKind::File);
    }

    #[test]
    fn test_classify_unnamed() {
        let mut header = HeaderRecord::new("");
        header.is_dir = true;
        assert_eq!(EntryKind::classify(&header), EntryKind::Unnamed);
    }

    #[test]
    fn test_classify_directory_wins_over_redirect() {
        let mut header = HeaderRecord::new("d");
        header.is_dir = true;
        header.redir_type = RedirType::Junction;
        assert_eq!(EntryKind::classify(&header), EntryKind::Directory);
    }

    #[test]
    fn test_classify_symlink_without_target() {
        let mut header = HeaderRecord::new("link");
        header.redir_type = RedirType::UnixSymlink;
        header.redir_name = Some(String::new());
        assert_eq!(
            EntryKind::classify(&header),
            EntryKind::Symlink { target: None }
        );
    }

    #[test]
    fn test_classify_other_redirect() {
        let mut header = HeaderRecord::new("copy");
        header.redir_type = RedirType::FileCopy;
        let kind = EntryKind::classify(&header);
        assert_eq!(kind, EntryKind::Redirect(RedirType::FileCopy));
        assert!(!kind.is_file());
        assert_eq!(kind.label(), "redirect");
    }
}
