/// Plan execution: moving files into their category folders.
///
/// The executor walks a plan in order. In dry-run mode it only reports what
/// would happen. Otherwise it creates destination folders as needed and moves
/// each file, recording a per-file outcome; a failed move never stops the
/// rest of the plan.
use crate::config::CompiledFilters;
use crate::file_category::RuleSet;
use crate::planner::{self, OrganizePlan, PlannedMove};
use filetime::FileTime;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal errors that stop a run before any file is moved.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target directory does not exist.
    #[error("directory '{}' does not exist", .path.display())]
    TargetNotFound { path: PathBuf },
    /// The target exists but is not a directory.
    #[error("'{}' is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    /// The target's metadata could not be read.
    #[error("invalid base path {}: {source}", .path.display())]
    InvalidBasePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The target directory could not be listed.
    #[error("error reading directory {}: {source}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Outcome of one planned move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveStatus {
    /// The file was moved.
    Moved,
    /// Dry run: the file would have been moved.
    WouldMove,
    /// The move was not attempted.
    Skipped(String),
    /// The move was attempted and failed; the source is left in place.
    Failed(String),
}

/// A planned move together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub planned: PlannedMove,
    pub status: MoveStatus,
}

/// Outcome counts for a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub moved: usize,
    pub would_move: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecutionSummary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status {
                MoveStatus::Moved => summary.moved += 1,
                MoveStatus::WouldMove => summary.would_move += 1,
                MoveStatus::Skipped(_) => summary.skipped += 1,
                MoveStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.moved + self.would_move + self.skipped + self.failed
    }

    /// Returns true if nothing was skipped or failed.
    pub fn is_complete_success(&self) -> bool {
        self.skipped == 0 && self.failed == 0
    }
}

/// Moves a single file to a destination path that does not yet exist.
pub trait FileMover {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

/// [`FileMover`] using the local filesystem.
///
/// Tries a rename first. When source and destination are on different
/// devices it copies to a temporary file next to the destination, verifies
/// the copy byte for byte, carries over timestamps, renames it into place,
/// and only then removes the source.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMover;

impl FileMover for FsMover {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()> {
        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "rename crosses devices, copying instead"
                );
                copy_verify_replace(source, destination)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_cross_device(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    // EXDEV on Linux and macOS, ERROR_NOT_SAME_DEVICE on Windows.
    #[cfg(unix)]
    let code = 18;
    #[cfg(windows)]
    let code = 17;
    #[cfg(not(any(unix, windows)))]
    let code = -1;
    e.raw_os_error() == Some(code)
}

/// Copies `source` to `destination` through a verified temporary file, then
/// removes `source`.
///
/// On any failure before the final rename the temporary file is removed and
/// `source` is untouched.
pub fn copy_verify_replace(source: &Path, destination: &Path) -> io::Result<()> {
    let dest_dir = destination.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent")
    })?;
    let tmp_path = dest_dir.join(temp_file_name());

    let result = copy_to_temp(source, &tmp_path).and_then(|()| {
        if destination.symlink_metadata().is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ));
        }
        fs::rename(&tmp_path, destination)
    });

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::remove_file(source).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("copied to {} but could not remove source: {e}", destination.display()),
        )
    })
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fixed-length temp name, independent of the destination name's length.
fn temp_file_name() -> String {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".orgdir-{}-{n}.tmp", std::process::id())
}

fn copy_to_temp(source: &Path, tmp_path: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    {
        let mut reader = File::open(source)?;
        let mut writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(tmp_path)?;
        io::copy(&mut reader, &mut writer)?;
        writer.sync_all()?;
    }

    if !files_identical(source, tmp_path)? {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "copy verification failed: contents differ",
        ));
    }

    fs::set_permissions(tmp_path, metadata.permissions())?;
    filetime::set_file_times(
        tmp_path,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    Ok(())
}

fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(File::open(a)?);
    let mut reader_b = BufReader::new(File::open(b)?);
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n = reader_a.read(&mut buf_a)?;
        if n == 0 {
            return Ok(true);
        }
        reader_b.read_exact(&mut buf_b[..n])?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
    }
}

/// Executes a plan with the filesystem mover.
pub fn execute(plan: &[PlannedMove], dry_run: bool) -> Vec<ExecutionResult> {
    execute_with(plan, dry_run, &FsMover, |_| {})
}

/// Executes a plan, calling `on_result` after each entry.
pub fn execute_with<F>(
    plan: &[PlannedMove],
    dry_run: bool,
    mover: &dyn FileMover,
    mut on_result: F,
) -> Vec<ExecutionResult>
where
    F: FnMut(&ExecutionResult),
{
    let mut results = Vec::with_capacity(plan.len());

    for planned in plan {
        let status = if dry_run {
            debug!(
                source = %planned.source.display(),
                destination = %planned.destination().display(),
                "dry-run: would move file"
            );
            MoveStatus::WouldMove
        } else {
            apply(planned, mover)
        };

        let result = ExecutionResult {
            planned: planned.clone(),
            status,
        };
        on_result(&result);
        results.push(result);
    }

    results
}

fn apply(planned: &PlannedMove, mover: &dyn FileMover) -> MoveStatus {
    let destination = planned.destination();

    if let Err(e) = fs::create_dir_all(&planned.destination_dir) {
        warn!(dir = %planned.destination_dir.display(), error = %e, "could not create folder");
        return MoveStatus::Failed(format!(
            "failed to create directory {}: {}",
            planned.destination_dir.display(),
            e
        ));
    }

    if destination.symlink_metadata().is_ok() {
        warn!(destination = %destination.display(), "destination appeared after planning");
        return MoveStatus::Skipped("destination already exists".to_string());
    }

    match mover.move_file(&planned.source, &destination) {
        Ok(()) => {
            info!(
                source = %planned.source.display(),
                destination = %destination.display(),
                "moved file"
            );
            MoveStatus::Moved
        }
        Err(e) => {
            warn!(source = %planned.source.display(), error = %e, "move failed");
            MoveStatus::Failed(e.to_string())
        }
    }
}

/// Plans and executes the organization of a directory.
pub struct FileOrganizer<'a> {
    rules: &'a RuleSet,
    filters: &'a CompiledFilters,
}

impl<'a> FileOrganizer<'a> {
    pub fn new(rules: &'a RuleSet, filters: &'a CompiledFilters) -> Self {
        Self { rules, filters }
    }

    /// Builds the plan for `target` without changing anything.
    ///
    /// # Errors
    ///
    /// Fails if `target` is missing, not a directory, or cannot be listed.
    pub fn plan(&self, target: &Path) -> OrganizeResult<OrganizePlan> {
        planner::plan(target, self.rules, self.filters)
    }

    /// Plans and executes in one step.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use orgdir::config::CompiledFilters;
    /// use orgdir::file_category::RuleSet;
    /// use orgdir::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let rules = RuleSet::default();
    /// let filters = CompiledFilters::default();
    /// let results = FileOrganizer::new(&rules, &filters)
    ///     .organize(Path::new("/path/to/Downloads"), true)
    ///     .expect("target directory should exist");
    /// for result in &results {
    ///     println!("{} -> {}", result.planned.source.display(), result.planned.destination().display());
    /// }
    /// ```
    pub fn organize(&self, target: &Path, dry_run: bool) -> OrganizeResult<Vec<ExecutionResult>> {
        let plan = self.plan(target)?;
        Ok(execute(&plan.moves, dry_run))
    }
}
