//! Error conversion utilities for CLI.
//!
//! Converts rarex-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use rarex_core::ExtractionError;
use std::path::Path;

/// Converts `ExtractionError` to user-friendly anyhow error with context
pub fn convert_extraction_error(err: ExtractionError, archive: &Path) -> anyhow::Error {
    if err.is_password_error() && !matches!(err, ExtractionError::PasswordRequired { .. }) {
        return anyhow!(
            "Incorrect password for '{}'\n\
             HINT: Check the password passed with --password.",
            archive.display()
        );
    }

    match err {
        ExtractionError::PathTraversal { path } => {
            anyhow!(
                "Security violation: Archive '{}' attempted path traversal with '{}'\n\
                 HINT: This archive may be malicious. Do not extract from untrusted sources.",
                archive.display(),
                path.display()
            )
        }
        ExtractionError::PasswordRequired { .. } => {
            anyhow!(
                "Archive '{}' contains encrypted entries\n\
                 HINT: Provide the password with --password.",
                archive.display()
            )
        }
        ExtractionError::DataCorruption {
            filename,
            expected,
            actual,
        } => {
            anyhow!(
                "Checksum mismatch in '{}' for '{filename}': expected {expected:08x}, got {actual:08x}\n\
                 HINT: The archive is damaged. Try recovering it with the recovery record if it has one.",
                archive.display()
            )
        }
        ExtractionError::OpenFailure { source, .. } => {
            anyhow!(
                "Cannot open archive '{}': {source}\n\
                 HINT: Check that the file exists and is a RAR archive. For multi-part archives, pass the first volume.",
                archive.display()
            )
        }
        ExtractionError::CallbackCancellation { .. } => {
            anyhow!(
                "Processing of '{}' was stopped\n\
                 HINT: The member exceeds --max-size.",
                archive.display()
            )
        }
        ExtractionError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                archive.display(),
                io_err
            )
        }
        ExtractionError::UnderlyingFailure { .. } | ExtractionError::BadPassword { .. } => {
            anyhow::Error::from(err)
                .context(format!("Error processing archive '{}'", archive.display()))
        }
    }
}

/// Adds context to a generic error about archive operations
pub fn add_archive_context<T>(
    result: Result<T, ExtractionError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_extraction_error(e, archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rarex_core::native::CallbackFault;
    use rarex_core::native::NativeCode;
    use rarex_core::native::NativeError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_path_traversal_error() {
        let err = ExtractionError::PathTraversal {
            path: PathBuf::from("../../../etc/passwd"),
        };
        let converted = convert_extraction_error(err, Path::new("malicious.rar"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("path traversal"));
        assert!(msg.contains("malicious.rar"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_password_errors() {
        let missing = ExtractionError::PasswordRequired {
            path: PathBuf::from("secret.rar"),
        };
        let msg = format!("{:?}", convert_extraction_error(missing, Path::new("secret.rar")));
        assert!(msg.contains("--password"));
        assert!(msg.contains("encrypted"));

        let wrong = ExtractionError::BadPassword {
            path: PathBuf::from("secret.rar"),
        };
        let msg = format!("{:?}", convert_extraction_error(wrong, Path::new("secret.rar")));
        assert!(msg.contains("Incorrect password"));
    }

    #[test]
    fn test_convert_native_bad_password_code() {
        let err = ExtractionError::UnderlyingFailure {
            path: PathBuf::from("secret.rar"),
            source: NativeError::Code(NativeCode::BadPassword),
        };
        let msg = format!("{:?}", convert_extraction_error(err, Path::new("secret.rar")));
        assert!(msg.contains("Incorrect password"));
    }

    #[test]
    fn test_convert_data_corruption_error() {
        let err = ExtractionError::DataCorruption {
            filename: "one.txt".to_string(),
            expected: 0xdead_beef,
            actual: 7,
        };
        let msg = format!("{:?}", convert_extraction_error(err, Path::new("a.rar")));
        assert!(msg.contains("one.txt"));
        assert!(msg.contains("deadbeef"));
        assert!(msg.contains("00000007"));
    }

    #[test]
    fn test_underlying_failure_keeps_source() {
        let err = ExtractionError::UnderlyingFailure {
            path: PathBuf::from("vol.part1.rar"),
            source: NativeError::Callback(CallbackFault::MissingVolume),
        };
        let msg = format!("{:?}", convert_extraction_error(err, Path::new("vol.part1.rar")));
        assert!(msg.contains("Error processing archive 'vol.part1.rar'"));
        assert!(msg.contains("next part"));
    }

    #[test]
    fn test_convert_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ExtractionError::Io(io_err);
        let converted = convert_extraction_error(err, Path::new("archive.rar"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("I/O error"));
    }
}
