//! Progress spinner for extraction.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use rarex_core::ProgressCallback;
use std::path::Path;
use std::time::Duration;

/// CLI spinner implementing `ProgressCallback`.
///
/// The entry count of a RAR archive is only known once the pass is over, so
/// this shows a running count, the bytes written so far and the current
/// entry instead of a bounded bar. Cleared on drop.
pub struct CliProgress {
    bar: ProgressBar,
    bytes_written: u64,
}

impl CliProgress {
    /// Creates a spinner prefixed with `message` (e.g. "Extracting").
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix} {pos} entries ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            bytes_written: 0,
        }
    }

    /// Progress is drawn only on an interactive stderr and when output is
    /// not suppressed.
    #[must_use]
    pub fn should_show(quiet: bool) -> bool {
        !quiet && Term::stderr().is_term()
    }

    fn refresh(&self, entry: &Path) {
        self.bar.set_message(format!(
            "{}, {}",
            humanize_bytes(self.bytes_written),
            entry.display()
        ));
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_entry_start(&mut self, path: &Path, current: usize) {
        self.bar.set_position(current as u64);
        self.refresh(path);
    }

    fn on_bytes_written(&mut self, bytes: u64) {
        self.bytes_written += bytes;
    }

    fn on_entry_complete(&mut self, path: &Path) {
        self.refresh(path);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Converts bytes to human-readable format (KB, MB, GB, TB).
fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(512), "512 B");
        assert_eq!(humanize_bytes(1024), "1.0 KB");
        assert_eq!(humanize_bytes(1536), "1.5 KB");
        assert_eq!(humanize_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(humanize_bytes(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(humanize_bytes(1024_u64.pow(4)), "1.0 TB");
        assert_eq!(humanize_bytes(1024_u64.pow(5)), "1024.0 TB");
    }

    #[test]
    fn test_progress_callback() {
        let mut progress = CliProgress::new("Testing");

        progress.on_entry_start(Path::new("one.txt"), 1);
        progress.on_bytes_written(1024);
        progress.on_entry_complete(Path::new("one.txt"));
        progress.on_entry_start(Path::new("two.txt"), 2);
        progress.on_bytes_written(10);

        assert_eq!(progress.bytes_written, 1034);
        assert_eq!(progress.bar.position(), 2);
        progress.on_complete();
    }

    #[test]
    fn test_quiet_hides_progress() {
        assert!(!CliProgress::should_show(true));
    }
}
