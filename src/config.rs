//! Configuration loading, discovery, and scan filters.
//!
//! The configuration file maps category names to extension lists and carries
//! optional scan filters. JSON is the default format; a file whose name ends
//! in `.toml` is read as TOML instead.
//!
//! ```json
//! {
//!   "file_categories": {
//!     "Images": [".jpg", ".png"],
//!     "Ebooks": [".epub"]
//!   },
//!   "filters": {
//!     "hidden": "dot-prefix",
//!     "exclude": {
//!       "filenames": ["Thumbs.db", "desktop.ini"],
//!       "extensions": ["part", "crdownload"],
//!       "patterns": ["~$*"],
//!       "regex": []
//!     }
//!   }
//! }
//! ```
//!
//! Lookup order:
//! 1. An explicitly given path (missing or unparsable is an error)
//! 2. `$ORGDIR_CONFIG`
//! 3. `<config dir>/orgdir/config.json`, created with the defaults if absent
//!
//! A discovered file that cannot be parsed is reported and replaced by the
//! built-in defaults for the run.

use crate::file_category::{DEFAULT_CATEGORIES, RuleSet};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable that relocates the discovered config file.
pub const CONFIG_ENV_VAR: &str = "ORGDIR_CONFIG";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The file could not be parsed or has the wrong structure.
    #[error("invalid configuration in {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    /// Invalid glob pattern provided.
    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading or writing configuration.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How hidden entries are detected during a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HiddenPolicy {
    /// Names starting with `.` are hidden.
    #[default]
    DotPrefix,
    /// Dot-prefixed names plus platform attributes (Windows hidden/system,
    /// macOS `UF_HIDDEN`).
    DotPrefixAndAttributes,
    /// Nothing is treated as hidden.
    Include,
}

impl HiddenPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HiddenPolicy::DotPrefix => "dot-prefix",
            HiddenPolicy::DotPrefixAndAttributes => "dot-prefix-and-attributes",
            HiddenPolicy::Include => "include",
        }
    }
}

/// Scan filter rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Hidden entry detection policy.
    #[serde(default)]
    pub hidden: HiddenPolicy,

    /// Rules for leaving files where they are.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, with or without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Default for ExcludeRules {
    fn default() -> Self {
        Self {
            filenames: vec!["Thumbs.db".to_string(), "desktop.ini".to_string()],
            patterns: Vec::new(),
            extensions: Vec::new(),
            regex: Vec::new(),
        }
    }
}

/// Parsed configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw `file_categories` value, merged over the defaults by [`RuleSet::build`].
    pub file_categories: Option<Value>,
    /// Scan filters.
    pub filters: FilterRules,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration, following the lookup order described in the
    /// module documentation.
    ///
    /// # Errors
    ///
    /// Returns an error only when `explicit_path` is given and cannot be read
    /// or parsed.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            return Self::load_from_file(path);
        }

        match default_config_path() {
            Some(path) => Ok(Self::load_or_seed(&path)),
            None => {
                warn!("no configuration directory available; using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reads a discovered config file, seeding it first if it does not exist.
    fn load_or_seed(path: &Path) -> Self {
        if !path.exists() {
            match create_default_config(path) {
                Ok(()) => info!(path = %path.display(), "created default configuration"),
                Err(e) => {
                    warn!(error = %e, "could not create default configuration");
                    return Self::default();
                }
            }
        }

        Self::load_from_file(path).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to built-in defaults");
            Self::default()
        })
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read, and `ConfigError::Invalid` if
    /// parsing fails.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(&content, is_toml(path)).map_err(|reason| {
            ConfigError::Invalid {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses configuration text. Unknown top-level keys are ignored.
    pub fn parse(content: &str, toml_format: bool) -> Result<Self, String> {
        let document: Value = if toml_format {
            toml::from_str(content).map_err(|e| e.to_string())?
        } else {
            serde_json::from_str(content).map_err(|e| e.to_string())?
        };

        let Value::Object(mut document) = document else {
            return Err("top level must be an object".to_string());
        };

        let filters = match document.remove("filters") {
            Some(value) => {
                serde_json::from_value(value).map_err(|e| format!("filters: {}", e))?
            }
            None => FilterRules::default(),
        };

        Ok(Self {
            file_categories: document.remove("file_categories"),
            filters,
            source: None,
        })
    }

    /// Builds the run's rule set from the defaults and this configuration.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::build(DEFAULT_CATEGORIES, self.file_categories.as_ref())
    }

    /// Compiles the scan filters.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }

    /// The canonical default document written to fresh config files.
    pub fn default_document() -> Value {
        let categories: Map<String, Value> = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, exts)| {
                let exts = exts.iter().map(|e| Value::String(format!(".{e}"))).collect();
                (name.to_string(), Value::Array(exts))
            })
            .collect();
        let defaults = ExcludeRules::default();

        json!({
            "file_categories": categories,
            "filters": {
                "hidden": HiddenPolicy::default().as_str(),
                "exclude": {
                    "filenames": defaults.filenames,
                    "patterns": defaults.patterns,
                    "extensions": defaults.extensions,
                    "regex": defaults.regex,
                }
            }
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Returns the discovered config file path: `$ORGDIR_CONFIG` if set,
/// otherwise `<config dir>/orgdir/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("orgdir").join("config.json"))
}

/// Writes the default configuration to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let document = Config::default_document();
    let text = if is_toml(path) {
        toml::to_string_pretty(&document).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    } else {
        serde_json::to_string_pretty(&document).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    };

    fs::write(path, text).map_err(io_err)
}

/// Compiled scan filters.
#[derive(Debug)]
pub struct CompiledFilters {
    hidden: HiddenPolicy,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            hidden: rules.hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// The active hidden entry policy.
    pub fn hidden_policy(&self) -> HiddenPolicy {
        self.hidden
    }

    /// Returns true if an exclusion rule matches the file name.
    ///
    /// Checks run in order: exact filename, extension, glob, regex.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        if self.exclude_filenames.contains(file_name) {
            return true;
        }

        if let (_, Some(ext)) = crate::file_category::split_extension(file_name)
            && self.exclude_extensions.contains(&ext.to_lowercase())
        {
            return true;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            hidden: HiddenPolicy::default(),
            exclude_filenames: ExcludeRules::default().filenames.into_iter().collect(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}
