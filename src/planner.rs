//! Organization planning.
//!
//! Planning scans the immediate children of the target directory, decides
//! which entries are eligible, classifies them, and assigns each one a
//! conflict-free destination. Nothing is moved here; the resulting plan is
//! handed to the executor as-is for both real and dry runs.

use crate::config::{CompiledFilters, HiddenPolicy};
use crate::conflict::resolve_name;
use crate::file_category::RuleSet;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An item found directly inside the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// The entry's file name.
    pub name: String,
    /// The full path to the entry.
    pub path: PathBuf,
    /// True for regular files (symlinks are not regular files).
    pub is_file: bool,
    /// True for directories.
    pub is_dir: bool,
    /// True if the active hidden policy treats the entry as hidden.
    pub is_hidden: bool,
}

impl DirectoryEntry {
    /// A regular, visible file.
    pub fn file(dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: dir.join(name),
            is_file: true,
            is_dir: false,
            is_hidden: false,
        }
    }
}

/// A single planned relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    /// The file to move.
    pub source: PathBuf,
    /// The folder the file moves into.
    pub destination_dir: PathBuf,
    /// The file's name inside `destination_dir`, conflict-free at plan time.
    pub destination_name: String,
    /// The category that selected `destination_dir`.
    pub category: String,
}

impl PlannedMove {
    /// Full destination path.
    pub fn destination(&self) -> PathBuf {
        self.destination_dir.join(&self.destination_name)
    }

    /// The source file name.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// True if the destination name differs from the source name.
    pub fn is_renamed(&self) -> bool {
        self.source_name() != self.destination_name
    }
}

/// A file that stays in the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftInPlace {
    pub name: String,
    pub reason: Ineligible,
}

/// The moves to make, plus the files planning left where they are.
///
/// Directories are never listed in `left_in_place`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizePlan {
    pub moves: Vec<PlannedMove>,
    pub left_in_place: Vec<LeftInPlace>,
}

impl OrganizePlan {
    /// True if there is nothing to move.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Reports the names already present in a destination folder.
pub trait NameIndex {
    /// Names of all entries in `dir`; empty if the folder does not exist.
    fn existing_names(&self, dir: &Path) -> HashSet<String>;
}

/// [`NameIndex`] backed by directory listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsNameIndex;

impl NameIndex for FsNameIndex {
    fn existing_names(&self, dir: &Path) -> HashSet<String> {
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => HashSet::new(),
        }
    }
}

/// Checks that `path` exists and is a directory.
///
/// # Errors
///
/// Returns `TargetNotFound`, `NotADirectory`, or `InvalidBasePath` for other
/// metadata failures.
pub fn validate_target(path: &Path) -> OrganizeResult<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(OrganizeError::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OrganizeError::TargetNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(OrganizeError::InvalidBasePath {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Lists the immediate children of `target`, sorted by name.
///
/// # Errors
///
/// Returns `ReadDirFailed` if the directory cannot be listed.
pub fn scan_directory(target: &Path, hidden: HiddenPolicy) -> OrganizeResult<Vec<DirectoryEntry>> {
    let read_dir = fs::read_dir(target).map_err(|source| OrganizeError::ReadDirFailed {
        path: target.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for entry in read_dir.flatten() {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!(name = ?raw, "skipping entry with a non UTF-8 name");
                continue;
            }
        };
        // Metadata of the entry itself; symlinks are not followed.
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(name = %name, error = %e, "skipping entry without metadata");
                continue;
            }
        };
        let file_type = metadata.file_type();

        entries.push(DirectoryEntry {
            is_hidden: is_hidden(&name, &metadata, hidden),
            is_file: file_type.is_file(),
            is_dir: file_type.is_dir(),
            path: entry.path(),
            name,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn is_hidden(name: &str, metadata: &fs::Metadata, policy: HiddenPolicy) -> bool {
    match policy {
        HiddenPolicy::Include => false,
        HiddenPolicy::DotPrefix => name.starts_with('.'),
        HiddenPolicy::DotPrefixAndAttributes => {
            name.starts_with('.') || has_hidden_attribute(metadata)
        }
    }
}

#[cfg(windows)]
fn has_hidden_attribute(metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
    metadata.file_attributes() & (FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM) != 0
}

#[cfg(target_os = "macos")]
fn has_hidden_attribute(metadata: &fs::Metadata) -> bool {
    use std::os::macos::fs::MetadataExt;
    const UF_HIDDEN: u32 = 0x8000;
    metadata.st_flags() & UF_HIDDEN != 0
}

#[cfg(not(any(windows, target_os = "macos")))]
fn has_hidden_attribute(_metadata: &fs::Metadata) -> bool {
    false
}

/// Why an entry was left out of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    CategoryFolder,
    Directory,
    NotRegularFile,
    Hidden,
    Excluded,
}

impl Ineligible {
    /// Short reason shown to the user.
    pub fn describe(&self) -> &'static str {
        match self {
            Ineligible::CategoryFolder => "category folder",
            Ineligible::Directory => "directory",
            Ineligible::NotRegularFile => "not a regular file",
            Ineligible::Hidden => "hidden",
            Ineligible::Excluded => "excluded by filter",
        }
    }

    fn is_directory(&self) -> bool {
        matches!(self, Ineligible::CategoryFolder | Ineligible::Directory)
    }
}

/// Returns why `entry` cannot be planned, or `None` if it is eligible.
pub fn eligibility(
    entry: &DirectoryEntry,
    rules: &RuleSet,
    filters: &CompiledFilters,
) -> Option<Ineligible> {
    if entry.is_dir {
        if rules.is_category_folder(&entry.name) {
            return Some(Ineligible::CategoryFolder);
        }
        return Some(Ineligible::Directory);
    }
    if !entry.is_file {
        return Some(Ineligible::NotRegularFile);
    }
    if entry.is_hidden {
        return Some(Ineligible::Hidden);
    }
    if filters.is_excluded(&entry.name) {
        return Some(Ineligible::Excluded);
    }
    None
}

/// Plans moves for already-scanned entries.
///
/// Entries are processed in the order given. Each destination folder's
/// existing names are read from `index` once, then extended with every name
/// claimed during this pass.
pub fn plan_entries(
    target: &Path,
    entries: &[DirectoryEntry],
    rules: &RuleSet,
    filters: &CompiledFilters,
    index: &dyn NameIndex,
) -> OrganizePlan {
    let mut claimed: HashMap<PathBuf, HashSet<String>> = HashMap::new();
    let mut plan = OrganizePlan::default();

    for entry in entries {
        if let Some(reason) = eligibility(entry, rules, filters) {
            debug!(name = %entry.name, ?reason, "not planned");
            if !reason.is_directory() {
                plan.left_in_place.push(LeftInPlace {
                    name: entry.name.clone(),
                    reason,
                });
            }
            continue;
        }

        let category = rules.classify(&entry.name);
        let destination_dir = target.join(category.folder());
        let taken = claimed
            .entry(destination_dir.clone())
            .or_insert_with(|| index.existing_names(&destination_dir));

        let destination_name = resolve_name(&entry.name, taken);
        taken.insert(destination_name.clone());

        debug!(
            source = %entry.name,
            category = category.name(),
            destination = %destination_name,
            "planned move"
        );

        plan.moves.push(PlannedMove {
            source: entry.path.clone(),
            destination_dir,
            destination_name,
            category: category.name().to_string(),
        });
    }

    plan
}

/// Scans `target` and plans its organization.
///
/// # Errors
///
/// Fails if `target` is missing, not a directory, or cannot be listed.
pub fn plan(
    target: &Path,
    rules: &RuleSet,
    filters: &CompiledFilters,
) -> OrganizeResult<OrganizePlan> {
    validate_target(target)?;
    let entries = scan_directory(target, filters.hidden_policy())?;
    Ok(plan_entries(target, &entries, rules, filters, &FsNameIndex))
}
