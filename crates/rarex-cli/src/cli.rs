//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rarex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract archive contents into a directory
    Extract(ExtractArgs),
    /// List archive entries without extraction
    List(ListArgs),
    /// Print the archive comment
    Comment(CommentArgs),
    /// Write a single member to stdout
    Cat(CatArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file (first volume for multi-part archives)
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory, which must exist (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Password for encrypted entries
    #[arg(short, long)]
    pub password: Option<String>,

    /// Compare CRC32 checksums of the extracted data against the archive
    #[arg(long)]
    pub verify: bool,

    /// Do not create symlinks, even when they stay inside the output directory
    #[arg(long)]
    pub no_symlinks: bool,

    /// Do not restore modification times
    #[arg(long)]
    pub no_mtime: bool,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Only list entries with file content (no directories or links)
    #[arg(short, long)]
    pub useful: bool,

    /// Show kind, size and checksum for each entry
    #[arg(short, long)]
    pub long: bool,

    /// Human-readable sizes in long format
    #[arg(short = 'H', long, requires = "long")]
    pub human_readable: bool,

    /// Password for archives with encrypted headers
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(clap::Args)]
pub struct CommentArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

#[derive(clap::Args)]
pub struct CatArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Member name as listed by `rarex list`
    #[arg(value_name = "MEMBER")]
    pub member: String,

    /// Password for encrypted entries
    #[arg(short, long)]
    pub password: Option<String>,

    /// Compare the member's CRC32 checksum against the archive
    #[arg(long)]
    pub verify: bool,

    /// Refuse members larger than this size (suffixes K, M, G, T)
    #[arg(long, value_parser = parse_byte_size)]
    pub max_size: Option<u64>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum, value_name = "SHELL")]
    pub shell: Shell,
}

/// Parse byte size with optional suffix (K, M, G, T)
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (digits, multiplier) = match s.char_indices().last() {
        Some((idx, 'T')) => (&s[..idx], 1024_u64.pow(4)),
        Some((idx, 'G')) => (&s[..idx], 1024_u64.pow(3)),
        Some((idx, 'M')) => (&s[..idx], 1024_u64.pow(2)),
        Some((idx, 'K')) => (&s[..idx], 1024),
        _ => (s, 1),
    };

    digits
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
