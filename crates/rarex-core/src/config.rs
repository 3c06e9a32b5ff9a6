//! Extraction options and platform capabilities.

/// Options for extracting a RAR archive.
///
/// # Examples
///
/// ```
/// use rarex_core::ExtractOptions;
///
/// let options = ExtractOptions::default()
///     .with_password("example")
///     .with_verify_data(true);
/// assert!(options.verify_data);
///
/// let options = ExtractOptions {
///     max_member_size: Some(16 * 1024 * 1024), // 16 MB
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Password for encrypted entries.
    pub password: Option<String>,

    /// Stream entry data through the callback and compare CRC32 checksums
    /// against the archive after the pass. When disabled, the decoder writes
    /// straight to the output file.
    pub verify_data: bool,

    /// Set each extracted file's modification time from the archive.
    pub preserve_mtime: bool,

    /// Create Unix symlink entries whose target stays inside the
    /// destination. Ignored where the platform cannot create symlinks.
    pub allow_symlinks: bool,

    /// Maximum size of a member extracted into memory. Exceeding it cancels
    /// processing.
    pub max_member_size: Option<u64>,
}

impl Default for ExtractOptions {
    /// Default values:
    /// - `password`: none
    /// - `verify_data`: false
    /// - `preserve_mtime`: true
    /// - `allow_symlinks`: true
    /// - `max_member_size`: none (unlimited)
    fn default() -> Self {
        Self {
            password: None,
            verify_data: false,
            preserve_mtime: true,
            allow_symlinks: true,
            max_member_size: None,
        }
    }
}

impl ExtractOptions {
    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enables or disables CRC verification.
    #[must_use]
    pub const fn with_verify_data(mut self, verify: bool) -> Self {
        self.verify_data = verify;
        self
    }

    /// Enables or disables modification time restoration.
    #[must_use]
    pub const fn with_preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    /// Enables or disables symlink creation.
    #[must_use]
    pub const fn with_allow_symlinks(mut self, allow: bool) -> Self {
        self.allow_symlinks = allow;
        self
    }

    /// Caps the size of in-memory member extraction.
    #[must_use]
    pub const fn with_max_member_size(mut self, limit: u64) -> Self {
        self.max_member_size = Some(limit);
        self
    }
}

/// What the current platform can do, probed once per extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Unix symlinks can be created.
    pub symlinks: bool,
}

impl Capabilities {
    /// Probes the running platform.
    #[must_use]
    pub const fn probe() -> Self {
        Self {
            symlinks: cfg!(unix),
        }
    }

    /// Returns `true` if symlink entries should be materialized under
    /// `options`.
    #[must_use]
    pub const fn creates_symlinks(self, options: &ExtractOptions) -> bool {
        self.symlinks && options.allow_symlinks
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::probe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.password.is_none());
        assert!(!options.verify_data);
        assert!(options.preserve_mtime);
        assert!(options.allow_symlinks);
        assert!(options.max_member_size.is_none());
    }

    #[test]
    fn test_builders() {
        let options = ExtractOptions::default()
            .with_password("pw")
            .with_verify_data(true)
            .with_preserve_mtime(false)
            .with_allow_symlinks(false)
            .with_max_member_size(10);
        assert_eq!(options.password.as_deref(), Some("pw"));
        assert!(options.verify_data);
        assert!(!options.preserve_mtime);
        assert!(!options.allow_symlinks);
        assert_eq!(options.max_member_size, Some(10));
    }

    #[test]
    fn test_capabilities_gate_symlinks() {
        let caps = Capabilities { symlinks: true };
        assert!(caps.creates_symlinks(&ExtractOptions::default()));
        assert!(!caps.creates_symlinks(&ExtractOptions::default().with_allow_symlinks(false)));

        let caps = Capabilities { symlinks: false };
        assert!(!caps.creates_symlinks(&ExtractOptions::default()));
    }

    #[test]
    fn test_probe_matches_platform() {
        assert_eq!(Capabilities::probe().symlinks, cfg!(unix));
    }
}
