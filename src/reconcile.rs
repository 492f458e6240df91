//! Bring the catalog back in line with files an export just wrote.
//!
//! A written file only matters to the catalog when it lands in the viewed
//! directory. If the catalog already holds an image at that exact path, its
//! in-memory state is stale: it is force-unloaded, its dirty flag cleared, its
//! thumbnail marked stale and its file metadata re-read. Otherwise a new
//! unloaded image is appended. One pass handles any number of files, then
//! re-sorts and re-selects.
//!
//! Directory comparison is case-sensitive on Linux and case-insensitive on
//! every other target, decided at compile time.

use crate::catalog::{Catalog, Image};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether `file` sits directly inside `dir`.
#[cfg(target_os = "linux")]
pub fn same_directory(file: &Path, dir: &Path) -> bool {
    file.parent().is_some_and(|parent| parent == dir)
}

/// Whether `file` sits directly inside `dir`, ignoring case.
#[cfg(not(target_os = "linux"))]
pub fn same_directory(file: &Path, dir: &Path) -> bool {
    let Some(parent) = file.parent() else {
        return false;
    };
    let lower = |p: &Path| -> Vec<String> {
        p.components()
            .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
            .collect()
    };
    lower(parent) == lower(dir)
}

/// What the reconcile pass does for one written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// The catalog image at this index is stale.
    Refresh(usize),
    /// The file is new to the catalog.
    Insert(PathBuf),
}

/// Decide the action for each written file, without touching the catalog.
///
/// Files outside the viewed directory are skipped. Repeated paths produce
/// one action.
pub fn plan_reconcile(catalog: &Catalog, written: &[PathBuf]) -> Vec<ReconcileAction> {
    let mut seen = HashSet::new();
    let mut actions = Vec::new();
    for path in written {
        if !seen.insert(path.as_path()) {
            continue;
        }
        if !same_directory(path, catalog.images_dir()) {
            debug!(path = %path.display(), "written file outside viewed directory");
            continue;
        }
        match catalog.find_image(path) {
            Some(index) => actions.push(ReconcileAction::Refresh(index)),
            None => actions.push(ReconcileAction::Insert(path.clone())),
        }
    }
    actions
}

/// Summary of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub refreshed: Vec<PathBuf>,
    pub inserted: Vec<PathBuf>,
    /// Current image after the pass.
    pub current: Option<PathBuf>,
    /// The requested selection was not in the catalog.
    pub reselect_missed: bool,
}

/// Apply planned actions. Indices must come from [`plan_reconcile`] on the
/// same, unmodified catalog.
pub fn apply_reconcile(catalog: &mut Catalog, actions: Vec<ReconcileAction>) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    for action in actions {
        match action {
            ReconcileAction::Refresh(index) => {
                let Some(image) = catalog.image_mut(index) else {
                    continue;
                };
                image.unload(true);
                image.clear_dirty();
                image.request_invalidate_thumbnail();
                image.refresh_file_info();
                debug!(path = %image.path().display(), "refreshed catalog image");
                outcome.refreshed.push(image.path().to_path_buf());
            }
            ReconcileAction::Insert(path) => {
                debug!(path = %path.display(), "added catalog image");
                catalog.push_image(Image::new(&path));
                outcome.inserted.push(path);
            }
        }
    }
    outcome
}

/// Reconcile, re-sort, then select `reselect` (or keep the current image if
/// none is given).
pub fn reconcile(
    catalog: &mut Catalog,
    written: &[PathBuf],
    reselect: Option<&Path>,
) -> ReconcileOutcome {
    let actions = plan_reconcile(catalog, written);
    let mut outcome = apply_reconcile(catalog, actions);
    catalog.sort_images();
    if let Some(path) = reselect {
        outcome.reselect_missed = !catalog.set_current_image(path);
    }
    outcome.current = catalog.current_path().map(Path::to_path_buf);
    outcome
}
