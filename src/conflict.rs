//! Destination name conflict resolution.
//!
//! When a destination name is already taken, a numeric suffix is inserted
//! before the extension: `photo.jpg` becomes `photo (1).jpg`, then
//! `photo (2).jpg`, and so on.

use crate::file_category::split_extension;
use std::collections::HashSet;
use tracing::trace;

/// Returns `desired` if it is free, otherwise the first free `stem (n).ext`.
///
/// `existing` must contain both the names already present in the destination
/// folder and the names claimed by earlier moves in the same run. At most
/// `existing.len() + 1` candidates are probed.
///
/// ```
/// use orgdir::conflict::resolve_name;
/// use std::collections::HashSet;
///
/// let taken: HashSet<String> = ["photo.jpg".to_string()].into();
/// assert_eq!(resolve_name("photo.jpg", &taken), "photo (1).jpg");
/// assert_eq!(resolve_name("other.jpg", &taken), "other.jpg");
/// ```
pub fn resolve_name(desired: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(desired) {
        return desired.to_string();
    }

    let (stem, ext) = split_extension(desired);
    let mut n: usize = 1;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        if !existing.contains(&candidate) {
            trace!(desired, resolved = %candidate, probes = n, "resolved name conflict");
            return candidate;
        }
        n += 1;
    }
}
