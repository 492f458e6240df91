//! In-memory image list for the viewed directory.
//!
//! The [`Catalog`] owns every [`Image`] the viewer knows about, in two orders:
//! the primary list (sorted by the active [`SortKey`]) and the load-order list
//! (paths in the order they were discovered or added). Export operations borrow
//! one `&mut Image` at a time; only the reconcile pass mutates the list itself.
//!
//! An image is either *loaded* (decoded frames held in memory) or *unloaded*
//! (path and file metadata only). Unloading a dirty image is refused unless
//! forced, so unsaved edits survive casual memory trimming.

use crate::imaging::{BackendError, ImageBackend, Picture, is_supported_input};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One file in the viewed directory.
#[derive(Debug, Clone)]
pub struct Image {
    path: PathBuf,
    frames: Vec<Picture>,
    loaded: bool,
    current_frame: usize,
    alt_picture: Option<Picture>,
    dirty: bool,
    thumbnail_stale: bool,
    file_size: u64,
    modified: Option<SystemTime>,
}

impl Image {
    /// An unloaded image. File metadata is read now; a missing file is not an
    /// error, it just sorts as empty and oldest.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut image = Self {
            path: path.into(),
            frames: Vec::new(),
            loaded: false,
            current_frame: 0,
            alt_picture: None,
            dirty: false,
            thumbnail_stale: false,
            file_size: 0,
            modified: None,
        };
        image.refresh_file_info();
        image
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Decode the file if it is not already in memory. On error the image
    /// stays unloaded.
    pub fn load(&mut self, backend: &impl ImageBackend) -> Result<(), BackendError> {
        if self.loaded {
            return Ok(());
        }
        let frames = backend.decode(&self.path)?;
        debug!(path = %self.path.display(), frames = frames.len(), "loaded image");
        self.frames = frames;
        if self.current_frame >= self.frames.len() {
            self.current_frame = 0;
        }
        self.loaded = true;
        Ok(())
    }

    /// Drop decoded frames and the alternate-resolution cache.
    ///
    /// Returns `false` and keeps everything when the image is dirty and
    /// `force` is not set.
    pub fn unload(&mut self, force: bool) -> bool {
        if self.dirty && !force {
            debug!(path = %self.path.display(), "refusing to unload dirty image");
            return false;
        }
        if self.loaded {
            debug!(path = %self.path.display(), force, "unloaded image");
        }
        self.frames = Vec::new();
        self.alt_picture = None;
        self.loaded = false;
        true
    }

    /// The picture the viewer is showing, if the image is loaded and has one.
    pub fn current_picture(&self) -> Option<&Picture> {
        if !self.loaded {
            return None;
        }
        self.frames.get(self.current_frame)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Select a frame. Out-of-range indices are ignored.
    pub fn set_current_frame(&mut self, index: usize) -> bool {
        if index < self.frames.len() {
            self.current_frame = index;
            true
        } else {
            false
        }
    }

    pub fn alt_picture(&self) -> Option<&Picture> {
        self.alt_picture.as_ref()
    }

    /// Cache a picture at another resolution (e.g. a fitted preview).
    pub fn set_alt_picture(&mut self, picture: Picture) {
        self.alt_picture = Some(picture);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn request_invalidate_thumbnail(&mut self) {
        self.thumbnail_stale = true;
    }

    pub fn thumbnail_stale(&self) -> bool {
        self.thumbnail_stale
    }

    /// Called once a fresh thumbnail has been produced.
    pub fn clear_thumbnail_stale(&mut self) {
        self.thumbnail_stale = false;
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Re-read size and modification time from disk.
    pub fn refresh_file_info(&mut self) {
        match std::fs::metadata(&self.path) {
            Ok(meta) => {
                self.file_size = meta.len();
                self.modified = meta.modified().ok();
            }
            Err(_) => {
                self.file_size = 0;
                self.modified = None;
            }
        }
    }
}

/// Sort key for the primary image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    FileName,
    ModTime,
    FileSize,
    FileType,
}

impl SortKey {
    pub fn name(self) -> &'static str {
        match self {
            SortKey::FileName => "file-name",
            SortKey::ModTime => "mod-time",
            SortKey::FileSize => "file-size",
            SortKey::FileType => "file-type",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "file-name" | "name" => Ok(SortKey::FileName),
            "mod-time" | "modtime" | "time" => Ok(SortKey::ModTime),
            "file-size" | "size" => Ok(SortKey::FileSize),
            "file-type" | "type" => Ok(SortKey::FileType),
            _ => Err(format!("unknown sort key '{s}'")),
        }
    }
}

fn name_key(image: &Image) -> String {
    image.file_name().to_lowercase()
}

fn type_key(image: &Image) -> String {
    image
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn compare(key: SortKey, a: &Image, b: &Image) -> Ordering {
    let primary = match key {
        SortKey::FileName => Ordering::Equal,
        SortKey::ModTime => a.modified.cmp(&b.modified),
        SortKey::FileSize => a.file_size.cmp(&b.file_size),
        SortKey::FileType => type_key(a).cmp(&type_key(b)),
    };
    primary
        .then_with(|| name_key(a).cmp(&name_key(b)))
        .then_with(|| a.path.cmp(&b.path))
}

/// All images in the viewed directory, plus the current selection.
#[derive(Debug)]
pub struct Catalog {
    images_dir: PathBuf,
    images: Vec<Image>,
    load_order: Vec<PathBuf>,
    current: Option<usize>,
    sort_key: SortKey,
    sort_ascending: bool,
}

impl Catalog {
    /// An empty catalog for `images_dir`.
    pub fn new(images_dir: impl Into<PathBuf>, sort_key: SortKey, sort_ascending: bool) -> Self {
        Self {
            images_dir: images_dir.into(),
            images: Vec::new(),
            load_order: Vec::new(),
            current: None,
            sort_key,
            sort_ascending,
        }
    }

    /// Read every supported image file directly inside `dir` (no recursion),
    /// sort, and select the first image.
    pub fn populate(
        dir: &Path,
        sort_key: SortKey,
        sort_ascending: bool,
    ) -> Result<Self, CatalogError> {
        let read_err = |source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && is_supported_input(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut catalog = Self::new(dir, sort_key, sort_ascending);
        for path in paths {
            catalog.push_image(Image::new(path));
        }
        catalog.sort_images();
        if !catalog.images.is_empty() {
            catalog.current = Some(0);
        }
        debug!(dir = %dir.display(), count = catalog.len(), "populated catalog");
        Ok(catalog)
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn image(&self, index: usize) -> Option<&Image> {
        self.images.get(index)
    }

    pub fn image_mut(&mut self, index: usize) -> Option<&mut Image> {
        self.images.get_mut(index)
    }

    /// Paths in the order they entered the catalog.
    pub fn load_order(&self) -> &[PathBuf] {
        &self.load_order
    }

    /// Index of the image with exactly this path.
    pub fn find_image(&self, path: &Path) -> Option<usize> {
        self.images.iter().position(|img| img.path == path)
    }

    /// Append to both the primary and load-order lists. Call
    /// [`sort_images`](Self::sort_images) afterwards to restore ordering.
    pub fn push_image(&mut self, image: Image) -> usize {
        self.load_order.push(image.path.clone());
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_ascending
    }

    pub fn set_sort(&mut self, key: SortKey, ascending: bool) {
        self.sort_key = key;
        self.sort_ascending = ascending;
        self.sort_images();
    }

    /// Re-sort the primary list. The current selection follows its path.
    pub fn sort_images(&mut self) {
        let current_path = self.current_path().map(Path::to_path_buf);
        let key = self.sort_key;
        if self.sort_ascending {
            self.images.sort_by(|a, b| compare(key, a, b));
        } else {
            self.images.sort_by(|a, b| compare(key, b, a));
        }
        self.current = current_path.and_then(|p| self.find_image(&p));
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_image(&self) -> Option<&Image> {
        self.current.and_then(|i| self.images.get(i))
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_image().map(Image::path)
    }

    /// Select by index. Out-of-range indices are ignored.
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index < self.images.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Select the image with this path.
    ///
    /// On a miss the selection is kept; if nothing was selected the first
    /// image is picked. Returns whether `path` was found.
    pub fn set_current_image(&mut self, path: &Path) -> bool {
        match self.find_image(path) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => {
                if self.current.is_none() && !self.images.is_empty() {
                    self.current = Some(0);
                }
                false
            }
        }
    }
}
