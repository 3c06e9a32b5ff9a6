//! Translation of native failures into [`ExtractionError`].
//!
//! The decoder uses `ERAR_BAD_DATA` both for corrupt data and for data
//! decrypted with a wrong key. Only the callback state tells the two apart:
//! if the password hook fired during the failing call, bad data means a
//! password problem.

use std::path::Path;

use super::ExtractionError;
use crate::callback::PasswordState;
use crate::native::CallbackFault;
use crate::native::NativeCode;
use crate::native::NativeError;

/// Maps a native failure from a header read or entry processing call.
///
/// | native failure | password requested | password given | result |
/// |---|---|---|---|
/// | `ERAR_MISSING_PASSWORD` | any | any | [`PasswordRequired`] |
/// | `ERAR_BAD_DATA` | yes | yes | [`BadPassword`] |
/// | `ERAR_BAD_DATA` | yes | no | [`PasswordRequired`] |
/// | callback cancelled | any | any | [`CallbackCancellation`] |
/// | anything else | any | any | [`UnderlyingFailure`] |
///
/// [`PasswordRequired`]: ExtractionError::PasswordRequired
/// [`BadPassword`]: ExtractionError::BadPassword
/// [`CallbackCancellation`]: ExtractionError::CallbackCancellation
/// [`UnderlyingFailure`]: ExtractionError::UnderlyingFailure
///
/// # Examples
///
/// ```
/// use rarex_core::ExtractionError;
/// use rarex_core::callback::PasswordState;
/// use rarex_core::error::translate;
/// use rarex_core::native::NativeCode;
/// use rarex_core::native::NativeError;
/// use std::path::Path;
///
/// let mut state = PasswordState::new(Some("wrong".into()));
/// state.request();
///
/// let err = translate(
///     NativeError::Code(NativeCode::BadData),
///     Path::new("secret.rar"),
///     &state,
/// );
/// assert!(matches!(err, ExtractionError::BadPassword { .. }));
/// ```
#[must_use]
pub fn translate(err: NativeError, archive: &Path, password: &PasswordState) -> ExtractionError {
    let path = archive.to_path_buf();
    match err {
        NativeError::Code(NativeCode::MissingPassword) => ExtractionError::PasswordRequired { path },
        NativeError::Code(NativeCode::BadData) if password.was_requested() => {
            if password.has_password() {
                ExtractionError::BadPassword { path }
            } else {
                ExtractionError::PasswordRequired { path }
            }
        }
        NativeError::Callback(CallbackFault::Cancelled) => {
            ExtractionError::CallbackCancellation { path }
        }
        source => ExtractionError::UnderlyingFailure { path, source },
    }
}

/// Maps a failure to open the archive.
#[must_use]
pub fn translate_open(err: NativeError, archive: &Path) -> ExtractionError {
    ExtractionError::OpenFailure {
        path: archive.to_path_buf(),
        source: err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(password: Option<&str>) -> PasswordState {
        let mut state = PasswordState::new(password.map(String::from));
        state.request();
        state
    }

    #[test]
    fn test_missing_password() {
        let err = translate(
            NativeError::Code(NativeCode::MissingPassword),
            Path::new("a.rar"),
            &PasswordState::default(),
        );
        assert!(matches!(err, ExtractionError::PasswordRequired { .. }));
    }

    #[test]
    fn test_bad_data_with_wrong_password() {
        let err = translate(
            NativeError::Code(NativeCode::BadData),
            Path::new("a.rar"),
            &requested(Some("nope")),
        );
        assert!(matches!(err, ExtractionError::BadPassword { .. }));
    }

    #[test]
    fn test_bad_data_requested_without_password() {
        let err = translate(
            NativeError::Code(NativeCode::BadData),
            Path::new("a.rar"),
            &requested(None),
        );
        assert!(matches!(err, ExtractionError::PasswordRequired { .. }));
    }

    #[test]
    fn test_bad_data_without_request_is_corruption() {
        let state = PasswordState::new(Some("pw".into()));
        let err = translate(NativeError::Code(NativeCode::BadData), Path::new("a.rar"), &state);
        match err {
            ExtractionError::UnderlyingFailure { source, .. } => {
                assert_eq!(source, NativeError::Code(NativeCode::BadData));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cancellation() {
        let err = translate(
            NativeError::Callback(CallbackFault::Cancelled),
            Path::new("a.rar"),
            &PasswordState::default(),
        );
        assert!(err.is_cancellation());
        assert!(matches!(err, ExtractionError::CallbackCancellation { .. }));
    }

    #[test]
    fn test_other_faults_pass_through() {
        let err = translate(
            NativeError::Callback(CallbackFault::MissingVolume),
            Path::new("a.rar"),
            &requested(Some("pw")),
        );
        assert!(matches!(
            err,
            ExtractionError::UnderlyingFailure {
                source: NativeError::Callback(CallbackFault::MissingVolume),
                ..
            }
        ));

        let err = translate(
            NativeError::Code(NativeCode::BadPassword),
            Path::new("a.rar"),
            &requested(Some("pw")),
        );
        assert!(matches!(err, ExtractionError::UnderlyingFailure { .. }));
        assert!(err.is_password_error());
    }

    #[test]
    fn test_translate_open() {
        let err = translate_open(NativeError::Code(NativeCode::EOpen), Path::new("gone.rar"));
        match err {
            ExtractionError::OpenFailure { path, source } => {
                assert_eq!(path, Path::new("gone.rar"));
                assert_eq!(source.code(), Some(NativeCode::EOpen));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
