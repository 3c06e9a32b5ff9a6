//! Output formatter trait for CLI results.

use anyhow::Result;
use rarex_core::ExtractedMember;
use rarex_core::ExtractionReport;
use rarex_core::HeaderRecord;
use serde::Serialize;
use std::time::SystemTime;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format extraction result
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()>;

    /// Format entry names, one per line
    fn format_names(&self, names: &[String]) -> Result<()>;

    /// Format entry headers with kind, size and checksum
    fn format_entries_long(&self, entries: &[HeaderRecord], human_readable: bool) -> Result<()>;

    /// Format the archive comment
    fn format_comment(&self, comment: &str) -> Result<()>;

    /// Format a member read into memory
    fn format_member(&self, member: &ExtractedMember) -> Result<()>;

    /// Format error message
    fn format_error(&self, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Single-letter kind marker used by long listings.
pub const fn kind_char(header: &HeaderRecord) -> char {
    if header.is_dir {
        'd'
    } else if header.redir_type.is_redirection() {
        'l'
    } else {
        '-'
    }
}

/// Seconds since the Unix epoch, clamped at zero.
pub fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rarex_core::native::RedirType;
    use std::time::Duration;

    #[test]
    fn test_kind_char() {
        let mut header = HeaderRecord::new("a");
        assert_eq!(kind_char(&header), '-');
        header.redir_type = RedirType::UnixSymlink;
        assert_eq!(kind_char(&header), 'l');
        header.is_dir = true;
        assert_eq!(kind_char(&header), 'd');
    }

    #[test]
    fn test_unix_seconds() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_098_472_878);
        assert_eq!(unix_seconds(time), 1_098_472_878);
        let before = SystemTime::UNIX_EPOCH - Duration::from_secs(5);
        assert_eq!(unix_seconds(before), 0);
    }
}
