//! CLI output formatting for export commands.
//!
//! # Output Format
//!
//! ## Save All
//!
//! ```text
//! Saving 3 images to Saved/ as tga
//! 001 beach.png → beach.tga (1024x768)
//! 002 dawn.jpg → dawn.tga (800x450, resampled)
//! 003 broken.png
//!     Failed: Backend error: Failed to decode broken.png: ...
//! Saved 2 of 3 images, 1 failed
//! ```
//!
//! ## Overwrite Prompt
//!
//! ```text
//! Overwrite files?
//!     beach.tga
//!     dawn.tga
//!     And 3 more.
//! In folder
//!     /photos/Saved
//! ```
//!
//! ## Check
//!
//! ```text
//! 2 files would be overwritten in Saved/
//! 001 beach.tga
//! 002 dawn.tga
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::export::{BatchReport, ExportStatus, SingleSave};
use crate::overwrite::OverwriteSummary;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as a zero-padded 3-digit string.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `path` relative to `base` with a trailing slash, or the full path when it
/// lies outside `base`. `base` itself shows as `./`.
fn display_dir(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => "./".to_string(),
        Ok(rel) => format!("{}/", rel.display()),
        Err(_) => path.display().to_string(),
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Save all
// ============================================================================

pub fn format_batch_report(report: &BatchReport, images_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Saving {} to {} as {}",
        plural(report.outcomes.len(), "image"),
        display_dir(&report.dest_dir, images_dir),
        report.format
    )];

    for (i, outcome) in report.outcomes.iter().enumerate() {
        let source = file_name(&outcome.source);
        match &outcome.status {
            ExportStatus::Written {
                width,
                height,
                resampled,
            } => {
                let detail = if *resampled {
                    format!("{width}x{height}, resampled")
                } else {
                    format!("{width}x{height}")
                };
                lines.push(format!(
                    "{} {} → {} ({})",
                    format_index(i + 1),
                    source,
                    file_name(&outcome.output),
                    detail
                ));
            }
            ExportStatus::Failed { reason } => {
                lines.push(format!("{} {}", format_index(i + 1), source));
                lines.push(format!("{}Failed: {}", indent(1), reason));
            }
        }
    }

    let failed = report.failed_count();
    let mut summary = format!(
        "Saved {} of {}",
        report.written_count(),
        plural(report.outcomes.len(), "image")
    );
    if failed > 0 {
        summary.push_str(&format!(", {failed} failed"));
    }
    lines.push(summary);

    if report.reconciled.as_ref().is_some_and(|r| r.reselect_missed) {
        lines.push(
            "Previously current image was not found; kept the current selection \
             (the first image if there was none)"
                .to_string(),
        );
    }
    lines
}

pub fn print_batch_report(report: &BatchReport, images_dir: &Path) {
    for line in format_batch_report(report, images_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Save as
// ============================================================================

pub fn format_single_save(source: &Path, single: &SingleSave) -> Vec<String> {
    let saved = &single.saved;
    let mut lines = vec![format!(
        "{} → {}",
        file_name(source),
        single.output.display()
    )];
    lines.push(format!(
        "{}{}x{} → {}x{}{}",
        indent(1),
        saved.source.width,
        saved.source.height,
        saved.written.width,
        saved.written.height,
        if saved.resampled { " (resampled)" } else { "" }
    ));
    if !single.reconciled.inserted.is_empty() || !single.reconciled.refreshed.is_empty() {
        lines.push(format!("{}Added to the current folder", indent(1)));
    }
    lines
}

pub fn print_single_save(source: &Path, single: &SingleSave) {
    for line in format_single_save(source, single) {
        println!("{}", line);
    }
}

// ============================================================================
// Overwrite prompts
// ============================================================================

/// Lines shown before asking to overwrite several files.
pub fn format_overwrite_prompt(summary: &OverwriteSummary) -> Vec<String> {
    let mut lines = vec!["Overwrite files?".to_string()];
    for name in &summary.shown {
        lines.push(format!("{}{}", indent(1), name));
    }
    if summary.remaining > 0 {
        lines.push(format!("{}And {} more.", indent(1), summary.remaining));
    }
    lines.push("In folder".to_string());
    lines.push(format!("{}{}", indent(1), summary.folder.display()));
    lines
}

/// Lines shown before asking to overwrite one file.
pub fn format_overwrite_file_prompt(out_file: &Path) -> Vec<String> {
    let folder = out_file.parent().map(Path::to_path_buf).unwrap_or_default();
    vec![
        "Overwrite file".to_string(),
        format!("{}{}", indent(1), file_name(out_file)),
        "In folder".to_string(),
        format!("{}{}", indent(1), folder.display()),
    ]
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(existing: &[PathBuf], dest_dir: &Path, images_dir: &Path) -> Vec<String> {
    let dir = display_dir(dest_dir, images_dir);
    if existing.is_empty() {
        return vec![format!("Nothing would be overwritten in {dir}")];
    }
    let mut lines = vec![format!(
        "{} would be overwritten in {dir}",
        plural(existing.len(), "file")
    )];
    for (i, path) in existing.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), file_name(path)));
    }
    lines
}

pub fn print_check_output(existing: &[PathBuf], dest_dir: &Path, images_dir: &Path) {
    for line in format_check_output(existing, dest_dir, images_dir) {
        println!("{}", line);
    }
}
