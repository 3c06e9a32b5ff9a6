//! Core extraction engine.
//!
//! One pass over an archive opened in `Extract` mode. Each header is
//! classified and handled by exactly one branch:
//!
//! - directories are created (existing ones are fine);
//! - Unix symlinks are created when their target stays inside the
//!   destination, and skipped otherwise;
//! - other redirections are skipped;
//! - regular files are written, appending when the same destination was
//!   already written in this pass (a file split across volumes).
//!
//! A regular file that resolves outside the destination ends the pass with
//! [`ExtractionError::PathTraversal`]. Directories and links are never fatal.

use std::collections::HashSet;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use filetime::FileTime;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::CrcMap;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::ProgressCallback;
use crate::Result;
use crate::callback::FileSink;
use crate::callback::Listing;
use crate::callback::PasswordState;
use crate::config::Capabilities;
use crate::config::ExtractOptions;
use crate::native::Directive;
use crate::native::HeaderRecord;
use crate::native::NativeArchive;
use crate::native::RedirType;
use crate::session::ArchiveSession;
use crate::types::DestDir;
use crate::types::EntryKind;
use crate::types::SafePath;
use crate::types::SafeSymlink;
use crate::types::safe_symlink::symlink_target_safe;

/// Main extraction engine.
#[derive(Debug)]
pub struct ExtractionEngine<'a> {
    dest: &'a DestDir,
    options: &'a ExtractOptions,
    capabilities: Capabilities,
}

/// State of one pass.
struct Pass<'p> {
    password: PasswordState,
    crc_map: CrcMap,
    written: HashSet<PathBuf>,
    report: &'p mut ExtractionReport,
    progress: &'p mut dyn ProgressCallback,
}

impl<'a> ExtractionEngine<'a> {
    /// Creates an engine writing into `dest`, probing platform capabilities.
    #[must_use]
    pub fn new(dest: &'a DestDir, options: &'a ExtractOptions) -> Self {
        Self {
            dest,
            options,
            capabilities: Capabilities::probe(),
        }
    }

    /// Overrides the probed capabilities.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Extracts every entry of `session` and returns the checksums
    /// accumulated for regular files.
    ///
    /// With verification disabled the decoder writes straight to each file
    /// and the stored checksums are only the seeds; they are meaningful only
    /// when `verify_data` is set.
    ///
    /// # Errors
    ///
    /// Returns the first translated native failure, a path traversal by a
    /// regular file, or an I/O error while writing.
    pub fn run<A: NativeArchive>(
        &self,
        session: &mut ArchiveSession<A>,
        report: &mut ExtractionReport,
        progress: &mut dyn ProgressCallback,
    ) -> Result<CrcMap> {
        let mut pass = Pass {
            password: PasswordState::new(self.options.password.clone()),
            crc_map: CrcMap::new(),
            written: HashSet::new(),
            report,
            progress,
        };
        let mut index = 0;

        while let Some(header) = session.read_header(&mut pass.password)? {
            let kind = EntryKind::classify(&header);
            if kind == EntryKind::Unnamed {
                debug!("skipping entry without a name");
                pass.report.entries_skipped += 1;
                pass.password.reset();
                continue;
            }

            index += 1;
            let entry_path = Path::new(&header.filename);
            pass.progress.on_entry_start(entry_path, index);
            debug!(entry = %header.filename, kind = kind.label(), "processing entry");

            match kind {
                EntryKind::Directory => self.directory(session, &header, &mut pass)?,
                EntryKind::Symlink { target } => {
                    self.symlink(session, &header, target.as_deref(), &mut pass)?;
                }
                EntryKind::Redirect(redir_type) => {
                    self.redirect(session, &header, redir_type, &mut pass)?;
                }
                EntryKind::File => self.file(session, &header, &mut pass)?,
                EntryKind::Unnamed => {}
            }

            pass.password.reset();
            pass.progress.on_entry_complete(entry_path);
        }

        Ok(pass.crc_map)
    }

    fn directory<A: NativeArchive>(
        &self,
        session: &mut ArchiveSession<A>,
        header: &HeaderRecord,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        match SafePath::resolve(self.dest, &header.filename) {
            Ok(path) if confined_on_disk(self.dest, path.as_path()) => {
                match std::fs::create_dir_all(path.as_path()) {
                    Ok(()) => pass.report.directories_created += 1,
                    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                        skip(pass, &header.filename, "directory path is occupied");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            _ => skip(pass, &header.filename, "directory escapes destination"),
        }
        pass.crc_map.remove(&header.filename);
        session.discard(&mut pass.password)
    }

    fn symlink<A: NativeArchive>(
        &self,
        session: &mut ArchiveSession<A>,
        header: &HeaderRecord,
        target: Option<&str>,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        match target {
            Some(_) if !self.capabilities.creates_symlinks(self.options) => {
                skip(pass, &header.filename, "symlinks are not created here");
            }
            Some(target) => match self.create_symlink(&header.filename, target) {
                Ok(true) => pass.report.symlinks_created += 1,
                Ok(false) => skip(pass, &header.filename, "symlink target escapes destination"),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    skip(pass, &header.filename, "symlink path is occupied");
                }
                Err(err) => return Err(err.into()),
            },
            None => skip(pass, &header.filename, "symlink has no target"),
        }
        pass.crc_map.remove(&header.filename);
        session.discard(&mut pass.password)
    }

    /// Returns `Ok(false)` when the link or its target is not confined.
    fn create_symlink(&self, name: &str, target: &str) -> io::Result<bool> {
        let Ok(link) = SafePath::resolve(self.dest, name) else {
            return Ok(false);
        };
        if !confined_on_disk(self.dest, link.as_path()) {
            return Ok(false);
        }
        let Some(symlink) = SafeSymlink::new(self.dest, link, target) else {
            return Ok(false);
        };

        // Check the target again from the physical directory, so links
        // created earlier in the pass cannot be chained out of the root.
        let parent = symlink.link_path().parent().unwrap_or(self.dest.as_path());
        std::fs::create_dir_all(parent)?;
        let real_parent = parent.canonicalize()?;
        if !symlink_target_safe(self.dest.as_path(), &real_parent, target) {
            return Ok(false);
        }

        symlink.create()?;
        Ok(true)
    }

    fn redirect<A: NativeArchive>(
        &self,
        session: &mut ArchiveSession<A>,
        header: &HeaderRecord,
        redir_type: RedirType,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        skip(
            pass,
            &header.filename,
            &format!("unsupported redirection {redir_type:?}"),
        );
        pass.crc_map.remove(&header.filename);
        session.discard(&mut pass.password)
    }

    fn file<A: NativeArchive>(
        &self,
        session: &mut ArchiveSession<A>,
        header: &HeaderRecord,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        let path = SafePath::resolve(self.dest, &header.filename)?;
        if !confined_on_disk(self.dest, path.as_path()) {
            return Err(ExtractionError::PathTraversal {
                path: PathBuf::from(&header.filename),
            });
        }
        std::fs::create_dir_all(path.parent())?;

        let continuation = pass.written.contains(path.as_path());
        let mut file = open_destination(path.as_path(), &header.filename, continuation)?;
        let start_len = if continuation { file.metadata()?.len() } else { 0 };
        let seed = pass.crc_map.seed(&header.filename);

        let crc = if self.options.verify_data {
            let mut sink = FileSink::new(&mut pass.password, &mut file, seed);
            let result = session.process(Directive::Test, &mut sink);
            if let Some(err) = sink.take_error() {
                return Err(err.into());
            }
            let crc = sink.crc();
            result.map_err(|err| session.translate(err, &pass.password))?;
            crc
        } else {
            let result = session.process(
                Directive::TestToFile(&mut file),
                &mut Listing::new(&mut pass.password),
            );
            result.map_err(|err| session.translate(err, &pass.password))?;
            seed
        };

        let written = file.metadata()?.len().saturating_sub(start_len);
        drop(file);

        if self.options.preserve_mtime {
            let mtime = FileTime::from_system_time(header.file_time);
            filetime::set_file_times(path.as_path(), mtime, mtime)?;
        }

        pass.crc_map.insert(header.filename.clone(), crc);
        pass.written.insert(path.into_path_buf());
        if continuation {
            trace!(entry = %header.filename, bytes = written, "appended volume part");
            pass.report.continuation_writes += 1;
        } else {
            pass.report.files_extracted += 1;
        }
        pass.report.bytes_written += written;
        pass.progress.on_bytes_written(written);
        Ok(())
    }
}

fn skip(pass: &mut Pass<'_>, name: &str, reason: &str) {
    warn!(entry = %name, reason, "skipping entry");
    pass.report.entries_skipped += 1;
    pass.report.add_warning(format!("{name}: {reason}"));
}

/// Opens the destination of a regular file without following a symlink at
/// the leaf.
///
/// A fresh write unlinks whatever file or link already sits at `path` and
/// creates a new file in its place. A continuation appends to the file
/// written earlier in this pass; finding a symlink there instead is fatal.
fn open_destination(path: &Path, name: &str, continuation: bool) -> Result<File> {
    let existing = match std::fs::symlink_metadata(path) {
        Ok(meta) => Some(meta.file_type()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };
    let is_link = existing.is_some_and(|kind| kind.is_symlink());

    if continuation {
        if is_link {
            return Err(ExtractionError::PathTraversal {
                path: PathBuf::from(name),
            });
        }
        let mut options = OpenOptions::new();
        options.append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOFOLLOW);
        }
        return Ok(options.open(path)?);
    }

    if is_link || existing.is_some_and(|kind| kind.is_file()) {
        if is_link {
            debug!(entry = %name, "replacing symlink at file destination");
        }
        std::fs::remove_file(path)?;
    }
    Ok(OpenOptions::new().write(true).create_new(true).open(path)?)
}

/// Returns `true` if the nearest existing ancestor of `path` resolves, after
/// following symlinks, inside `dest`.
fn confined_on_disk(dest: &DestDir, path: &Path) -> bool {
    let mut current = path.parent();
    while let Some(dir) = current {
        if let Ok(real) = dir.canonicalize() {
            return real.starts_with(dest.as_path());
        }
        current = dir.parent();
    }
    false
}
