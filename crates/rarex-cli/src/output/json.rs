//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::unix_seconds;
use anyhow::Result;
use rarex_core::EntryKind;
use rarex_core::ExtractedMember;
use rarex_core::ExtractionReport;
use rarex_core::HeaderRecord;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

#[derive(Debug, Serialize)]
struct EntryOutput {
    name: String,
    kind: &'static str,
    size: u64,
    packed_size: u64,
    crc32: String,
    mtime: u64,
    encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

impl From<&HeaderRecord> for EntryOutput {
    fn from(header: &HeaderRecord) -> Self {
        Self {
            name: header.filename.clone(),
            kind: EntryKind::classify(header).label(),
            size: header.unpack_size,
            packed_size: header.pack_size,
            crc32: format!("{:08x}", header.file_crc),
            mtime: unix_seconds(header.file_time),
            encrypted: header.encrypted,
            target: header.redir_name.clone(),
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput<'a> {
            files_extracted: usize,
            directories_created: usize,
            symlinks_created: usize,
            entries_skipped: usize,
            continuation_writes: usize,
            bytes_written: u64,
            verified: bool,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = ExtractionOutput {
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            entries_skipped: report.entries_skipped,
            continuation_writes: report.continuation_writes,
            bytes_written: report.bytes_written,
            verified: report.verified,
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        };

        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_names(&self, names: &[String]) -> Result<()> {
        Self::output(&JsonOutput::success("list", names))
    }

    fn format_entries_long(&self, entries: &[HeaderRecord], _human_readable: bool) -> Result<()> {
        let data: Vec<EntryOutput> = entries.iter().map(EntryOutput::from).collect();
        Self::output(&JsonOutput::success("list", data))
    }

    fn format_comment(&self, comment: &str) -> Result<()> {
        #[derive(Serialize)]
        struct CommentOutput<'a> {
            comment: &'a str,
        }

        Self::output(&JsonOutput::success("comment", CommentOutput { comment }))
    }

    fn format_member(&self, member: &ExtractedMember) -> Result<()> {
        #[derive(Serialize)]
        struct MemberOutput<'a> {
            name: &'a str,
            size: usize,
            crc32: String,
            content: String,
        }

        let data = MemberOutput {
            name: &member.filename,
            size: member.data.len(),
            crc32: format!("{:08x}", member.crc),
            content: String::from_utf8_lossy(&member.data).into_owned(),
        };
        Self::output(&JsonOutput::success("cat", data))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error("error", format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        let _ = Self::output(&JsonOutput::success("warning", WarningData { message }));
    }
}
