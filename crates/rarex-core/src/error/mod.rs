//! Error types for RAR extraction operations.

mod translator;

pub use translator::translate;
pub use translator::translate_open;

use std::path::PathBuf;

use thiserror::Error;

use crate::native::CallbackFault;
use crate::native::NativeCode;
use crate::native::NativeError;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur during archive extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The native decoder could not open the archive.
    #[error("failed to open {path}: {source}")]
    OpenFailure {
        /// Archive path.
        path: PathBuf,
        /// Native failure.
        #[source]
        source: NativeError,
    },

    /// An entry is encrypted and no usable password was provided.
    #[error("password required for {path}")]
    PasswordRequired {
        /// Archive path.
        path: PathBuf,
    },

    /// The provided password is wrong.
    #[error("incorrect password for {path}")]
    BadPassword {
        /// Archive path.
        path: PathBuf,
    },

    /// Extracted data does not match the checksum recorded in the archive.
    #[error("CRC mismatch for {filename}: expected {expected:#010x}, got {actual:#010x}")]
    DataCorruption {
        /// Entry name.
        filename: String,
        /// Checksum recorded in the archive.
        expected: u32,
        /// Checksum of the extracted bytes.
        actual: u32,
    },

    /// The data sink stopped processing.
    #[error("processing of {path} canceled by the callback")]
    CallbackCancellation {
        /// Archive path.
        path: PathBuf,
    },

    /// Any other native failure, passed through unchanged.
    #[error("{path}: {source}")]
    UnderlyingFailure {
        /// Archive path.
        path: PathBuf,
        /// Native failure.
        #[source]
        source: NativeError,
    },

    /// An entry would be written outside the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// Entry path as stored in the archive.
        path: PathBuf,
    },
}

impl ExtractionError {
    /// Returns `true` for password problems, including a wrong-password code
    /// reported directly by the decoder.
    ///
    /// # Examples
    ///
    /// ```
    /// use rarex_core::ExtractionError;
    /// use std::path::PathBuf;
    ///
    /// let err = ExtractionError::PasswordRequired {
    ///     path: PathBuf::from("secret.rar"),
    /// };
    /// assert!(err.is_password_error());
    ///
    /// let err = ExtractionError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(!err.is_password_error());
    /// ```
    #[must_use]
    pub const fn is_password_error(&self) -> bool {
        match self {
            Self::PasswordRequired { .. } | Self::BadPassword { .. } => true,
            Self::UnderlyingFailure { source, .. } => {
                matches!(source, NativeError::Code(NativeCode::BadPassword))
            }
            _ => false,
        }
    }

    /// Returns `true` if this error represents a security violation.
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }

    /// Returns `true` if the data sink stopped processing.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::CallbackCancellation { .. }
                | Self::UnderlyingFailure {
                    source: NativeError::Callback(CallbackFault::Cancelled),
                    ..
                }
        )
    }

    /// Returns the native failure carried by this error, if any.
    #[must_use]
    pub const fn native_error(&self) -> Option<&NativeError> {
        match self {
            Self::OpenFailure { source, .. } | Self::UnderlyingFailure { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    /// Stable machine-readable code for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rarex_core::ExtractionError;
    ///
    /// let err = ExtractionError::DataCorruption {
    ///     filename: "one.txt".into(),
    ///     expected: 1,
    ///     actual: 2,
    /// };
    /// assert_eq!(err.code(), "DATA_CORRUPTION");
    /// ```
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::OpenFailure { .. } => "OPEN_FAILURE",
            Self::PasswordRequired { .. } => "PASSWORD_REQUIRED",
            Self::BadPassword { .. } => "BAD_PASSWORD",
            Self::DataCorruption { .. } => "DATA_CORRUPTION",
            Self::CallbackCancellation { .. } => "CALLBACK_CANCELLATION",
            Self::UnderlyingFailure { .. } => "NATIVE_FAILURE",
            Self::PathTraversal { .. } => "PATH_TRAVERSAL",
        }
    }
}
