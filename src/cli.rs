//! Command-line interface module for orgdir.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading
//! - Confirmation before real runs
//! - Organization orchestration and reporting

use crate::config::{self, Config, ConfigError};
use crate::file_organizer::{
    ExecutionSummary, FsMover, OrganizeError, execute_with,
};
use crate::output::{OutputFormatter, display_name};
use crate::planner;
use clap::{ArgAction, Parser};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Command-line arguments.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "orgdir",
    version,
    about = "Organize your digital mess.",
    long_about = "Sorts the files of a directory into category subfolders by extension."
)]
pub struct Args {
    /// The directory to organize (defaults to the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Path to a custom configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Show the configuration file path and exit
    #[arg(long)]
    pub config_path: bool,

    /// Preview changes without moving any files
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error("cannot determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error("cannot read confirmation: {0}")]
    Prompt(#[source] io::Error),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The plan was executed (or previewed).
    Completed(ExecutionSummary),
    /// No eligible files were found.
    NothingToDo,
    /// The user declined the confirmation prompt.
    Cancelled,
    /// `--config-path` was requested.
    ConfigPathShown,
}

/// Runs the CLI with parsed arguments, reading confirmation from stdin.
///
/// ```no_run
/// use clap::Parser;
/// use orgdir::cli::{Args, run};
///
/// let args = Args::parse_from(["orgdir", "--path", "/tmp/Downloads", "--dry-run"]);
/// match run(&args) {
///     Ok(outcome) => println!("{:?}", outcome),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run(args: &Args) -> Result<RunOutcome, AppError> {
    let stdin = io::stdin();
    run_with_input(args, &mut stdin.lock())
}

/// Runs the CLI, reading the confirmation answer from `input`.
pub fn run_with_input(args: &Args, input: &mut dyn BufRead) -> Result<RunOutcome, AppError> {
    if args.config_path {
        show_config_path(args.config.as_deref());
        return Ok(RunOutcome::ConfigPathShown);
    }

    let target = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().map_err(AppError::CurrentDir)?,
    };
    planner::validate_target(&target)?;

    let config = Config::load(args.config.as_deref())?;
    if let Some(source) = &config.source {
        info!(path = %source.display(), "using configuration");
    }
    let rules = config.rule_set();
    let filters = config.compile_filters()?;

    let plan = planner::plan(&target, &rules, &filters)?;
    if plan.is_empty() {
        OutputFormatter::left_in_place(&plan.left_in_place);
        OutputFormatter::info(&format!(
            "Nothing to organize in '{}'.",
            display_name(&target)
        ));
        return Ok(RunOutcome::NothingToDo);
    }

    if !args.dry_run && !args.yes && !confirm(&target, input)? {
        OutputFormatter::plain("Operation cancelled.");
        return Ok(RunOutcome::Cancelled);
    }

    OutputFormatter::run_header(&target, args.dry_run);

    let results = if args.dry_run {
        execute_with(&plan.moves, true, &FsMover, |_| {})
    } else {
        let pb = OutputFormatter::create_progress_bar(plan.moves.len() as u64);
        let results = execute_with(&plan.moves, false, &FsMover, |result| {
            pb.set_message(result.planned.source_name());
            pb.inc(1);
        });
        pb.finish_and_clear();
        results
    };

    OutputFormatter::results(&results);
    let summary = ExecutionSummary::from_results(&results);
    OutputFormatter::summary(&summary, &plan.left_in_place, args.dry_run);

    if !summary.is_complete_success() {
        OutputFormatter::warning("Some files could not be organized. Please review the report above.");
    }

    Ok(RunOutcome::Completed(summary))
}

fn confirm(target: &Path, input: &mut dyn BufRead) -> Result<bool, AppError> {
    print!("Organize directory '{}'? (y/N): ", display_name(target));
    io::stdout().flush().map_err(AppError::Prompt)?;

    let mut answer = String::new();
    input.read_line(&mut answer).map_err(AppError::Prompt)?;
    Ok(is_confirmation(&answer))
}

/// Accepts `y` or `yes` in any case.
pub fn is_confirmation(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

fn show_config_path(explicit: Option<&Path>) {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(config::default_config_path);

    match path {
        Some(path) => {
            OutputFormatter::plain(&format!("Configuration file: {}", path.display()));
            if path.exists() {
                OutputFormatter::success("Config file exists");
            } else {
                OutputFormatter::warning("Config file does not exist, will be created on first run");
            }
        }
        None => OutputFormatter::warning("No configuration directory available"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn args_for(dir: &Path, config: &Path) -> Args {
        Args {
            path: Some(dir.to_path_buf()),
            config: Some(config.to_path_buf()),
            ..Default::default()
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let config = temp_dir.path().join("config.json");
        fs::write(&config, "{}").unwrap();
        (temp_dir, target, config)
    }

    #[test]
    fn test_is_confirmation() {
        assert!(is_confirmation("y\n"));
        assert!(is_confirmation("Yes"));
        assert!(is_confirmation("  YES "));
        assert!(!is_confirmation(""));
        assert!(!is_confirmation("n"));
        assert!(!is_confirmation("yep"));
    }

    #[test]
    fn test_declined_prompt_moves_nothing() {
        let (_temp, target, config) = setup();
        fs::write(target.join("a.pdf"), "pdf").unwrap();

        let outcome = run_with_input(&args_for(&target, &config), &mut Cursor::new("n\n")).unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(target.join("a.pdf").exists());
    }

    #[test]
    fn test_accepted_prompt_organizes() {
        let (_temp, target, config) = setup();
        fs::write(target.join("a.pdf"), "pdf").unwrap();

        let outcome = run_with_input(&args_for(&target, &config), &mut Cursor::new("y\n")).unwrap();
        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run, got {:?}", outcome);
        };
        assert_eq!(summary.moved, 1);
        assert!(target.join("Documents").join("a.pdf").exists());
    }

    #[test]
    fn test_empty_directory_is_nothing_to_do() {
        let (_temp, target, config) = setup();
        let args = Args {
            yes: true,
            ..args_for(&target, &config)
        };
        let outcome = run_with_input(&args, &mut Cursor::new("")).unwrap();
        assert_eq!(outcome, RunOutcome::NothingToDo);
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let (temp, _target, config) = setup();
        let args = args_for(&temp.path().join("missing"), &config);
        let result = run_with_input(&args, &mut Cursor::new(""));
        assert!(matches!(
            result,
            Err(AppError::Organize(OrganizeError::TargetNotFound { .. }))
        ));
    }

    #[test]
    fn test_unparsable_explicit_config_is_fatal() {
        let (_temp, target, config) = setup();
        fs::write(&config, "{broken").unwrap();
        fs::write(target.join("a.pdf"), "pdf").unwrap();

        let args = Args {
            dry_run: true,
            ..args_for(&target, &config)
        };
        let result = run_with_input(&args, &mut Cursor::new(""));
        assert!(matches!(result, Err(AppError::Config(ConfigError::Invalid { .. }))));
        assert!(target.join("a.pdf").exists());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["orgdir", "-p", "/tmp/x", "--dry-run", "-vv"]);
        assert_eq!(args.path, Some(PathBuf::from("/tmp/x")));
        assert!(args.dry_run);
        assert_eq!(args.verbose, 2);
        assert!(!args.yes);
    }
}
