//! orgdir - sort a directory's files into category folders
//!
//! This library provides extension-based categorization, conflict-free
//! destination naming, read-only organization planning, and plan execution
//! with dry-run support. Rules come from built-in defaults merged with a
//! user-editable JSON or TOML configuration file.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod planner;

pub use config::{CompiledFilters, Config, ConfigError, HiddenPolicy};
pub use conflict::resolve_name;
pub use file_category::{Category, RuleSet, classify};
pub use file_organizer::{
    ExecutionResult, ExecutionSummary, FileOrganizer, MoveStatus, OrganizeError, execute,
};
pub use planner::{DirectoryEntry, LeftInPlace, OrganizePlan, PlannedMove, plan};

pub use cli::{Args, RunOutcome, run};
