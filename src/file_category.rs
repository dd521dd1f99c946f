//! Extension-based file categorization.
//!
//! A [`RuleSet`] maps lowercase file extensions (without the leading dot) to
//! named categories. Each category owns a destination folder inside the
//! directory being organized; a `/` in the category name nests the folder
//! (`Code/Markup` lands in `Code/Markup/`).
//!
//! # Examples
//!
//! ```
//! use orgdir::file_category::RuleSet;
//!
//! let rules = RuleSet::default();
//! assert_eq!(rules.classify("report.PDF").name(), "Documents");
//! assert_eq!(rules.classify("photo.png").name(), "Images");
//! assert_eq!(rules.classify("README").name(), "Other");
//! ```

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Name of the category that receives every file no rule matches.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Built-in category table, seeded into fresh config files.
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("Documents", &["md", "txt", "pdf", "rtf", "odt", "doc", "docx"]),
    ("Documents/Sheets", &["ods", "xls", "xlsm", "xlsx"]),
    ("Documents/Presentations", &["key", "odp", "pps", "ppt", "pptx"]),
    (
        "Images",
        &[
            "ai", "bmp", "gif", "heic", "ico", "jpeg", "jpg", "png", "ps", "psd", "svg", "tif",
            "tiff", "webp",
        ],
    ),
    (
        "Audio",
        &[
            "aac", "aif", "cda", "flac", "m4a", "mid", "mp3", "mpa", "ogg", "wav", "wma", "wpl",
        ],
    ),
    (
        "Videos",
        &[
            "3g2", "3gp", "avi", "flv", "h264", "m4v", "mkv", "mov", "mp4", "mpg", "rm", "swf",
            "vob", "webm", "wmv",
        ],
    ),
    (
        "Archives",
        &[
            "7z", "arj", "bz2", "gz", "lz4", "rar", "tar", "tgz", "xz", "z", "zip", "zst",
        ],
    ),
    ("Programs", &["apk", "bin", "deb", "dmg", "exe", "jar", "msi", "rpm"]),
    (
        "Code",
        &[
            "bat", "c", "class", "cpp", "cs", "css", "dart", "go", "h", "hpp", "java", "js", "kt",
            "pl", "php", "py", "r", "rb", "rs", "scala", "sh", "swift", "ts",
        ],
    ),
    ("Code/Markup", &["html", "htm", "mhtml", "xhtml", "xml"]),
    ("Code/Database", &["csv", "db", "json", "sql", "sqlite", "yaml", "yml", "toml"]),
];

/// A named group of extensions with its destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    folder: PathBuf,
}

impl Category {
    /// Creates a category, deriving its folder from the name.
    ///
    /// Returns `None` for names that are empty, absolute, or that contain
    /// `.` or `..` components.
    ///
    /// ```
    /// use orgdir::file_category::Category;
    /// use std::path::Path;
    ///
    /// let markup = Category::new("Code/Markup").unwrap();
    /// assert_eq!(markup.folder(), Path::new("Code").join("Markup"));
    /// assert!(Category::new("../escape").is_none());
    /// ```
    pub fn new(name: &str) -> Option<Self> {
        let trimmed = name.trim().trim_matches('/');
        if trimmed.is_empty() {
            return None;
        }

        let mut folder = PathBuf::new();
        for part in trimmed.split('/') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(c)), None) => folder.push(c),
                _ => return None,
            }
        }

        if folder.as_os_str().is_empty() {
            return None;
        }

        Some(Self {
            name: trimmed.to_string(),
            folder,
        })
    }

    /// The category name as written in the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The destination folder, relative to the organized directory.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The first path component of the folder (`Code` for `Code/Markup`).
    pub fn top_level_folder(&self) -> &Path {
        self.folder
            .components()
            .next()
            .map(|c| Path::new(c.as_os_str()))
            .unwrap_or(&self.folder)
    }
}

/// Splits a filename into stem and extension.
///
/// The extension is the text after the last `.`. Names without a dot, names
/// whose only dot is the leading one (`.bashrc`), and names ending in a dot
/// have no extension.
///
/// ```
/// use orgdir::file_category::split_extension;
///
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", None));
/// assert_eq!(split_extension("README"), ("README", None));
/// ```
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(idx) if idx + 1 == file_name.len() => (file_name, None),
        Some(idx) => (&file_name[..idx], Some(&file_name[idx + 1..])),
    }
}

/// Normalizes a configured extension: trims, drops one leading dot, lowercases.
fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if bare.is_empty() || bare.contains(['/', '\\']) || bare.chars().any(char::is_whitespace) {
        return None;
    }
    Some(bare.to_lowercase())
}

/// Merged, read-only extension-to-category mapping for one run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    extensions: HashMap<String, String>,
    categories: BTreeMap<String, Category>,
}

impl RuleSet {
    /// Builds a rule set from a defaults table and optional user overrides.
    ///
    /// `overrides` is expected to be a JSON object mapping category names to
    /// arrays of extensions. Every extension listed there is (re)assigned to
    /// that category, entries later in the document winning. Anything
    /// malformed is skipped on its own with a warning; the rest of the
    /// overrides still apply.
    pub fn build(defaults: &[(&str, &[&str])], overrides: Option<&Value>) -> Self {
        let mut rules = Self {
            extensions: HashMap::new(),
            categories: BTreeMap::new(),
        };

        for (name, exts) in defaults {
            for ext in *exts {
                rules.assign(ext, name);
            }
        }

        if let Some(overrides) = overrides {
            rules.apply_overrides(overrides);
        }

        if let Some(fallback) = Category::new(FALLBACK_CATEGORY) {
            rules
                .categories
                .entry(FALLBACK_CATEGORY.to_string())
                .or_insert(fallback);
        }

        rules
    }

    fn apply_overrides(&mut self, overrides: &Value) {
        let Some(map) = overrides.as_object() else {
            if !overrides.is_null() {
                warn!("ignoring file_categories: expected an object of category -> extensions");
            }
            return;
        };

        for (name, exts) in map {
            let Some(category) = Category::new(name) else {
                warn!(category = %name, "ignoring category with an invalid name");
                continue;
            };
            let Some(list) = exts.as_array() else {
                warn!(category = %name, "ignoring category: extensions must be a list");
                continue;
            };

            self.categories
                .entry(category.name().to_string())
                .or_insert_with(|| category.clone());

            for ext in list {
                match ext.as_str() {
                    Some(ext) => {
                        if !self.assign(ext, category.name()) {
                            warn!(category = %name, extension = %ext, "ignoring invalid extension");
                        }
                    }
                    None => {
                        warn!(category = %name, value = %ext, "ignoring non-string extension");
                    }
                }
            }
        }
    }

    /// Assigns `ext` to the named category. Returns false if either is malformed.
    fn assign(&mut self, ext: &str, category_name: &str) -> bool {
        let (Some(ext), Some(category)) = (normalize_extension(ext), Category::new(category_name))
        else {
            return false;
        };
        let name = category.name().to_string();
        self.categories.entry(name.clone()).or_insert(category);
        self.extensions.insert(ext, name);
        true
    }

    /// Looks up the category mapped to an extension (with or without the dot).
    pub fn category_for_extension(&self, ext: &str) -> Option<&Category> {
        let ext = normalize_extension(ext)?;
        self.extensions
            .get(&ext)
            .and_then(|name| self.categories.get(name))
    }

    /// Returns the category a filename belongs to, falling back to `Other`.
    pub fn classify(&self, file_name: &str) -> &Category {
        split_extension(file_name)
            .1
            .and_then(|ext| self.category_for_extension(ext))
            .unwrap_or_else(|| self.fallback())
    }

    /// The fallback category.
    pub fn fallback(&self) -> &Category {
        // `build` always registers the fallback.
        &self.categories[FALLBACK_CATEGORY]
    }

    /// Looks up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Returns true if `name` is the top-level folder of some category.
    pub fn is_category_folder(&self, name: &str) -> bool {
        self.categories
            .values()
            .any(|c| c.top_level_folder() == Path::new(name))
    }

    /// Number of mapped extensions.
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::build(DEFAULT_CATEGORIES, None)
    }
}

/// Returns the name of the category a filename belongs to.
pub fn classify<'a>(file_name: &str, rules: &'a RuleSet) -> &'a str {
    rules.classify(file_name).name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_mappings() {
        let rules = RuleSet::default();
        assert_eq!(classify("a.pdf", &rules), "Documents");
        assert_eq!(classify("b.png", &rules), "Images");
        assert_eq!(classify("song.mp3", &rules), "Audio");
        assert_eq!(classify("clip.mkv", &rules), "Videos");
        assert_eq!(classify("backup.zip", &rules), "Archives");
        assert_eq!(classify("main.rs", &rules), "Code");
        assert_eq!(classify("page.html", &rules), "Code/Markup");
        assert_eq!(classify("data.json", &rules), "Code/Database");
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let rules = RuleSet::default();
        assert_eq!(classify("DOCUMENT.PDF", &rules), "Documents");
        assert_eq!(classify("Photo.JpG", &rules), "Images");
    }

    #[test]
    fn test_classify_falls_back_to_other() {
        let rules = RuleSet::default();
        assert_eq!(classify("c.unknownext", &rules), FALLBACK_CATEGORY);
        assert_eq!(classify("README", &rules), FALLBACK_CATEGORY);
        assert_eq!(classify(".bashrc", &rules), FALLBACK_CATEGORY);
        assert_eq!(classify("trailing.", &rules), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_classify_uses_last_dot() {
        let rules = RuleSet::default();
        assert_eq!(classify("archive.tar.gz", &rules), "Archives");
        assert_eq!(classify(".hidden.txt", &rules), "Documents");
        assert_eq!(classify("notes.pdf.bak", &rules), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.jpg"), ("photo", Some("jpg")));
        assert_eq!(split_extension("a.b.c"), ("a.b", Some("c")));
        assert_eq!(split_extension(".env"), (".env", None));
        assert_eq!(split_extension("name."), ("name.", None));
    }

    #[test]
    fn test_fallback_always_present() {
        let rules = RuleSet::build(&[], None);
        assert_eq!(rules.fallback().name(), FALLBACK_CATEGORY);
        assert_eq!(rules.classify("x.pdf").name(), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_override_adds_new_category() {
        let overrides = json!({ "Ebooks": [".epub", "MOBI"] });
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(classify("book.epub", &rules), "Ebooks");
        assert_eq!(classify("book.mobi", &rules), "Ebooks");
        assert_eq!(classify("a.pdf", &rules), "Documents");
    }

    #[test]
    fn test_override_reassigns_single_extension() {
        let overrides = json!({ "Scans": [".PDF"] });
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(classify("scan.pdf", &rules), "Scans");
        // The rest of Documents is untouched.
        assert_eq!(classify("notes.txt", &rules), "Documents");
    }

    #[test]
    fn test_override_merges_per_extension() {
        let overrides = json!({ "Images": [".jpg"] });
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(classify("a.jpg", &rules), "Images");
        assert_eq!(classify("b.png", &rules), "Images");
    }

    #[test]
    #[test]
    fn test_later_category_in_document_wins() {
        // "Archive" sorts first but is written last.
        let overrides: Value =
            serde_json::from_str(r#"{ "Scans": [".pdf"], "Archive": [".pdf"] }"#).unwrap();
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(classify("x.pdf", &rules), "Archive");

        let overrides: Value =
            serde_json::from_str(r#"{ "Archive": [".pdf"], "Scans": [".pdf"] }"#).unwrap();
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(classify("x.pdf", &rules), "Scans");
    }

    #[test]
    fn test_repeated_extension_in_one_category() {
        let overrides = json!({ "Beta": [".dup", "DUP"] });
        let rules = RuleSet::build(&[], Some(&overrides));
        assert_eq!(classify("x.dup", &rules), "Beta");
        assert_eq!(rules.extension_count(), 1);
    }

    #[test]
    fn test_malformed_overrides_are_ignored_individually() {
        let overrides = json!({
            "Good": [".good", 42, "", "  ", null],
            "NotAList": ".nope",
            "../Escape": [".esc"],
            "": [".blank"],
        });
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(classify("f.good", &rules), "Good");
        assert_eq!(classify("f.nope", &rules), FALLBACK_CATEGORY);
        assert_eq!(classify("f.esc", &rules), FALLBACK_CATEGORY);
        assert_eq!(classify("f.blank", &rules), FALLBACK_CATEGORY);
        assert!(rules.category("NotAList").is_none());
        assert_eq!(classify("a.pdf", &rules), "Documents");
    }

    #[test]
    fn test_non_object_overrides_leave_defaults() {
        let overrides = json!(["not", "a", "map"]);
        let rules = RuleSet::build(DEFAULT_CATEGORIES, Some(&overrides));
        assert_eq!(rules.extension_count(), RuleSet::default().extension_count());
    }

    #[test]
    fn test_category_folders() {
        let markup = Category::new("Code/Markup").unwrap();
        assert_eq!(markup.folder(), Path::new("Code").join("Markup"));
        assert_eq!(markup.top_level_folder(), Path::new("Code"));

        assert!(Category::new("").is_none());
        assert!(Category::new("a/../b").is_none());
        assert!(Category::new("./x").is_none());
        assert_eq!(Category::new("/Docs/").unwrap().name(), "Docs");
    }

    #[test]
    fn test_is_category_folder() {
        let rules = RuleSet::default();
        assert!(rules.is_category_folder("Images"));
        assert!(rules.is_category_folder("Code"));
        assert!(rules.is_category_folder("Other"));
        assert!(!rules.is_category_folder("Markup"));
    }
}
