//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the per-folder move report.

use crate::file_organizer::{ExecutionResult, ExecutionSummary, MoveStatus};
use crate::planner::LeftInPlace;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Width of the separator line under headers.
const SEPARATOR_LENGTH: usize = 40;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the run banner for `target`.
    pub fn run_header(target: &Path, dry_run: bool) {
        let name = display_name(target);
        if dry_run {
            Self::header(&format!("Dry Run - Preview for: {}", name));
        } else {
            Self::header(&format!("Organizing: {}", name));
        }
        println!("{}", "-".repeat(SEPARATOR_LENGTH));
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use orgdir::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints every result, grouped by category in plan order.
    pub fn results(results: &[ExecutionResult]) {
        let mut by_category: BTreeMap<&str, Vec<&ExecutionResult>> = BTreeMap::new();
        for result in results {
            by_category
                .entry(result.planned.category.as_str())
                .or_default()
                .push(result);
        }

        for (category, entries) in by_category {
            let file_word = if entries.len() == 1 { "file" } else { "files" };
            println!(
                "\n{} ({} {})",
                format!("{}/", category).bold(),
                entries.len(),
                file_word
            );
            for result in entries {
                Self::result_line(result);
            }
        }
    }

    fn result_line(result: &ExecutionResult) {
        let planned = &result.planned;
        let name = planned.source_name();
        let renamed = if planned.is_renamed() {
            format!(" → {}", planned.destination_name)
        } else {
            String::new()
        };

        match &result.status {
            MoveStatus::Moved => println!("   {} {}{}", "✓".green(), name, renamed),
            MoveStatus::WouldMove => println!("   {} {}{}", "➤".cyan(), name, renamed),
            MoveStatus::Skipped(reason) => {
                println!("   {} {} ({})", "⚠".yellow(), name, reason)
            }
            MoveStatus::Failed(reason) => {
                println!("   {} {}: {}", "✗".red(), name, reason.red())
            }
        }
    }

    /// Lists the files planning left where they are, if any.
    pub fn left_in_place(entries: &[LeftInPlace]) {
        if entries.is_empty() {
            return;
        }
        println!(
            "\n{} Left in place ({}):",
            "⚠".yellow(),
            entries.len()
        );
        for entry in entries {
            println!("   - {} ({})", entry.name, entry.reason.describe());
        }
    }

    /// Prints the closing summary.
    pub fn summary(summary: &ExecutionSummary, left_in_place: &[LeftInPlace], dry_run: bool) {
        Self::left_in_place(left_in_place);
        Self::header("SUMMARY");
        if dry_run {
            println!(
                "Would organize {} {}",
                summary.would_move.to_string().green().bold(),
                files(summary.would_move)
            );
            Self::dry_run_notice("No files were modified.");
            return;
        }

        println!(
            "Organized {} {}",
            summary.moved.to_string().green().bold(),
            files(summary.moved)
        );
        if summary.skipped > 0 {
            println!("   Skipped: {}", summary.skipped.to_string().yellow());
        }
        if summary.failed > 0 {
            println!("   Failed: {}", summary.failed.to_string().red());
        }
    }
}

fn files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// The directory's own name, or its full display form when it has none (`.`).
pub fn display_name(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_display_name_uses_last_component() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Downloads");
        std::fs::create_dir(&dir).unwrap();
        assert_eq!(display_name(&dir), "Downloads");
    }

    #[test]
    fn test_display_name_root() {
        assert_eq!(display_name(Path::new("/")), "/");
    }
}
