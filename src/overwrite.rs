//! Detect destination files an export would clobber.
//!
//! The scan is computed fresh right before a destructive write and never
//! cached: the filesystem may change between prompts.

use crate::export::output_path;
use crate::imaging::SaveFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Most file names listed before the summary collapses to a count.
pub const MAX_LISTED: usize = 6;

/// Existing destination files, in source order, without duplicates.
///
/// Two sources with the same stem map to the same output; it is listed once.
pub fn files_needing_overwrite<'a>(
    sources: impl IntoIterator<Item = &'a Path>,
    dest_dir: &Path,
    format: SaveFormat,
) -> Vec<PathBuf> {
    let mut existing: Vec<PathBuf> = Vec::new();
    for source in sources {
        let out = output_path(dest_dir, source, format);
        if out.exists() && !existing.contains(&out) {
            existing.push(out);
        }
    }
    existing
}

/// Whether the caller has to ask before writing.
pub fn needs_confirmation(confirm_overwrites: bool, existing: &[PathBuf]) -> bool {
    confirm_overwrites && !existing.is_empty()
}

/// Condensed view of an overwrite list for a confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverwriteSummary {
    /// File names (no directory), at most [`MAX_LISTED`].
    pub shown: Vec<String>,
    /// Files not listed in `shown`.
    pub remaining: usize,
    /// Folder of the first file.
    pub folder: PathBuf,
}

impl OverwriteSummary {
    /// `None` when nothing would be overwritten.
    pub fn new(existing: &[PathBuf]) -> Option<Self> {
        let first = existing.first()?;
        let shown: Vec<String> = existing
            .iter()
            .take(MAX_LISTED)
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        Some(Self {
            remaining: existing.len() - shown.len(),
            shown,
            folder: first.parent().map(Path::to_path_buf).unwrap_or_default(),
        })
    }
}
