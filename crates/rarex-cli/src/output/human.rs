//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::kind_char;
use anyhow::Result;
use console::Term;
use console::style;
use rarex_core::ExtractedMember;
use rarex_core::ExtractionReport;
use rarex_core::HeaderRecord;
use std::io::Write;
use std::io::{self};

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        match bytes {
            b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
            b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
            b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
            b => format!("{b} B"),
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.use_colors {
            format!("{} {text}", style("✓").green().bold())
        } else {
            text.to_string()
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let title = if report.verified {
            "Extraction complete (checksums verified)"
        } else {
            "Extraction complete"
        };
        self.line(&self.heading(title));
        self.line(&format!("  Files extracted: {}", report.files_extracted));
        self.line(&format!("  Directories: {}", report.directories_created));
        self.line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));
        if report.entries_skipped > 0 {
            self.line(&format!("  Skipped: {}", report.entries_skipped));
        }

        if self.verbose {
            self.line(&format!("  Symlinks: {}", report.symlinks_created));
            self.line(&format!(
                "  Continuation parts: {}",
                report.continuation_writes
            ));
            self.line(&format!("  Duration: {:?}", report.duration));
        }

        for warning in &report.warnings {
            self.format_warning(warning);
        }

        Ok(())
    }

    fn format_names(&self, names: &[String]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for name in names {
            self.line(name);
        }

        Ok(())
    }

    fn format_entries_long(&self, entries: &[HeaderRecord], human_readable: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut total = 0u64;
        for entry in entries {
            let size = if human_readable {
                Self::format_size(entry.unpack_size)
            } else {
                entry.unpack_size.to_string()
            };
            let lock = if entry.encrypted { '*' } else { ' ' };

            let name = match (&entry.redir_name, entry.redir_type.is_redirection()) {
                (Some(target), true) => format!("{} -> {target}", entry.filename),
                _ => entry.filename.clone(),
            };

            self.line(&format!(
                "{}{lock} {:>10}  {:08x}  {name}",
                kind_char(entry),
                size,
                entry.file_crc,
            ));
            total = total.saturating_add(entry.unpack_size);
        }

        self.line("");
        self.line(&format!(
            "Total: {} entries, {}",
            entries.len(),
            Self::format_size(total)
        ));

        Ok(())
    }

    fn format_comment(&self, comment: &str) -> Result<()> {
        if self.quiet || comment.is_empty() {
            return Ok(());
        }

        let mut stdout = io::stdout().lock();
        stdout.write_all(comment.as_bytes())?;
        if !comment.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn format_member(&self, member: &ExtractedMember) -> Result<()> {
        // Member contents are the command's payload; quiet does not apply.
        let mut stdout = io::stdout().lock();
        stdout.write_all(&member.data)?;
        stdout.flush()?;
        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = term.write_line(&format!("WARNING: {message}"));
        }
    }
}
