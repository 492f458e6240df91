//! Single-image and batch export.
//!
//! ```text
//! ExportConfig ──► ExportRequest ──► prepare_dest_dir
//!                                        │
//!                 ┌──────────────────────┴───────────────┐
//!                 ▼                                      ▼
//!        save_as (one image)                  save_all_images (snapshot loop)
//!                 │                                      │
//!                 └────────► save_image_as ◄─────────────┘
//!                                  │  load-if-needed, copy, restore,
//!                                  │  resample-if-needed, encode
//!                                  ▼
//!                             reconcile (once)
//! ```
//!
//! Batch export is at-least-effort: a file that fails to decode or encode is
//! recorded in the [`BatchReport`] and the loop moves on. Only a failure to
//! create the destination directory aborts, and it does so before any write.
//!
//! The catalog is not mutated while the loop runs. Every written path is
//! collected and handed to [`reconcile`] in a single pass at the end.

use crate::catalog::{Catalog, Image};
use crate::config::ExportConfig;
use crate::imaging::{
    BackendError, Dimensions, EncodeOptions, EncodeParams, ImageBackend, Quality, ResampleFilter,
    SaveFormat, SizeSpec, needs_resample,
};
use crate::reconcile::{ReconcileOutcome, reconcile, same_directory};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create destination {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} has no picture to save", .0.display())]
    NoPicture(PathBuf),
    #[error("No image at catalog index {0}")]
    NoSuchImage(usize),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Destination directory for exports from `images_dir`. An empty sub-folder
/// means "save next to the sources".
pub fn dest_dir(images_dir: &Path, sub_folder: &str) -> PathBuf {
    let sub_folder = sub_folder.trim();
    if sub_folder.is_empty() {
        images_dir.to_path_buf()
    } else {
        images_dir.join(sub_folder)
    }
}

/// `dest_dir/<source stem><format extension>`. No collision renaming.
pub fn output_path(dest_dir: &Path, source: &Path, format: SaveFormat) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(format.extension());
    dest_dir.join(name)
}

/// Create `dir` and any missing parents.
pub fn prepare_dest_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Whether a single save to `path` would clobber an existing file.
pub fn destination_exists(path: &Path) -> bool {
    path.exists()
}

/// Everything a batch export needs, resolved from config and overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub dest_dir: PathBuf,
    pub format: SaveFormat,
    pub size: SizeSpec,
    pub filter: ResampleFilter,
    pub options: EncodeOptions,
}

impl ExportRequest {
    pub fn from_config(config: &ExportConfig, images_dir: &Path) -> Self {
        Self {
            dest_dir: dest_dir(images_dir, &config.save.sub_folder),
            format: config.save.file_type,
            size: SizeSpec {
                mode: config.resize.size_mode,
                percent: config.resize.percent,
                width: config.resize.width,
                height: config.resize.height,
            },
            filter: config.resize.filter,
            options: EncodeOptions {
                targa_rle: config.save.targa_rle,
                jpeg_quality: Quality::new(config.save.jpeg_quality),
            },
        }
    }

    pub fn output_path(&self, source: &Path) -> PathBuf {
        output_path(&self.dest_dir, source, self.format)
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            format: self.format,
            options: self.options,
        }
    }
}

/// Result of one successful [`save_image_as`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub source: Dimensions,
    pub written: Dimensions,
    pub resampled: bool,
}

/// Export the current picture of `image` to `out_file`.
///
/// If the image was not loaded it is loaded for the duration of the call and
/// unloaded again before returning, whether or not the save succeeds. The
/// image's own pixels are never modified: resampling works on a copy.
pub fn save_image_as(
    backend: &impl ImageBackend,
    image: &mut Image,
    out_file: &Path,
    size: &SizeSpec,
    filter: ResampleFilter,
    params: &EncodeParams,
) -> Result<SavedImage, ExportError> {
    let result = copy_and_write(backend, image, out_file, size, filter, params);
    match &result {
        Ok(saved) => info!(
            source = %image.path().display(),
            output = %out_file.display(),
            width = saved.written.width,
            height = saved.written.height,
            "saved image"
        ),
        Err(e) => warn!(
            source = %image.path().display(),
            output = %out_file.display(),
            error = %e,
            "failed to save image"
        ),
    }
    result
}

fn copy_and_write(
    backend: &impl ImageBackend,
    image: &mut Image,
    out_file: &Path,
    size: &SizeSpec,
    filter: ResampleFilter,
    params: &EncodeParams,
) -> Result<SavedImage, ExportError> {
    let was_loaded = image.is_loaded();
    if !was_loaded {
        image.load(backend)?;
    }

    let picture = image.current_picture().cloned();
    if !was_loaded {
        image.unload(true);
    }
    let mut picture = picture.ok_or_else(|| ExportError::NoPicture(image.path().to_path_buf()))?;

    let source = picture.dimensions();
    let target = size.resolve(source);
    let resampled = needs_resample(source, target);
    if resampled {
        debug!(
            from = ?(source.width, source.height),
            to = ?(target.width, target.height),
            %filter,
            "resampling"
        );
        picture = backend.resample(&picture, target, filter)?;
    }

    backend.encode(&picture, out_file, params)?;
    Ok(SavedImage {
        source,
        written: target,
        resampled,
    })
}

/// Result of a single "save as" including the catalog update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleSave {
    pub output: PathBuf,
    pub saved: SavedImage,
    pub reconciled: ReconcileOutcome,
}

/// Save catalog image `index` to `out_file` at exactly `size`.
///
/// The destination directory is created if needed. When the file lands in
/// the viewed directory it becomes the current image.
pub fn save_as(
    backend: &impl ImageBackend,
    catalog: &mut Catalog,
    index: usize,
    out_file: &Path,
    size: Dimensions,
    filter: ResampleFilter,
    params: &EncodeParams,
) -> Result<SingleSave, ExportError> {
    if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        prepare_dest_dir(parent)?;
    }
    let image = catalog
        .image_mut(index)
        .ok_or(ExportError::NoSuchImage(index))?;
    let saved = save_image_as(
        backend,
        image,
        out_file,
        &SizeSpec::exact(size),
        filter,
        params,
    )?;

    let reselect = same_directory(out_file, catalog.images_dir()).then_some(out_file);
    let reconciled = reconcile(catalog, &[out_file.to_path_buf()], reselect);
    Ok(SingleSave {
        output: out_file.to_path_buf(),
        saved,
        reconciled,
    })
}

/// Per-file result inside a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ExportStatus {
    Written {
        width: u32,
        height: u32,
        resampled: bool,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: ExportStatus,
}

/// Everything a batch export did, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub dest_dir: PathBuf,
    pub format: SaveFormat,
    pub outcomes: Vec<ExportOutcome>,
    /// Present when at least one file was written.
    pub reconciled: Option<ReconcileOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ExportStatus::Written { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ExportStatus::Failed { .. }))
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn any_written(&self) -> bool {
        self.written().next().is_some()
    }

    /// There was work to do and none of it succeeded.
    pub fn is_total_failure(&self) -> bool {
        !self.outcomes.is_empty() && !self.any_written()
    }
}

/// Export every catalog image with the settings in `request`.
///
/// Works on a snapshot of `(index, path)` taken up front. Each image is sized
/// from its own dimensions. After the loop, if anything was written, one
/// reconcile pass runs and the previously current image is selected again.
pub fn save_all_images(
    backend: &impl ImageBackend,
    catalog: &mut Catalog,
    request: &ExportRequest,
) -> Result<BatchReport, ExportError> {
    prepare_dest_dir(&request.dest_dir)?;

    let previous = catalog.current_path().map(Path::to_path_buf);
    let snapshot: Vec<(usize, PathBuf)> = catalog
        .images()
        .iter()
        .enumerate()
        .map(|(i, img)| (i, img.path().to_path_buf()))
        .collect();
    let params = request.encode_params();

    let mut outcomes = Vec::with_capacity(snapshot.len());
    for (index, source) in snapshot {
        let output = request.output_path(&source);
        let result = match catalog.image_mut(index) {
            Some(image) => save_image_as(
                backend,
                image,
                &output,
                &request.size,
                request.filter,
                &params,
            ),
            None => Err(ExportError::NoSuchImage(index)),
        };
        let status = match result {
            Ok(saved) => ExportStatus::Written {
                width: saved.written.width,
                height: saved.written.height,
                resampled: saved.resampled,
            },
            Err(e) => ExportStatus::Failed {
                reason: e.to_string(),
            },
        };
        outcomes.push(ExportOutcome {
            source,
            output,
            status,
        });
    }

    let written: Vec<PathBuf> = outcomes
        .iter()
        .filter(|o| matches!(o.status, ExportStatus::Written { .. }))
        .map(|o| o.output.clone())
        .collect();
    let reconciled =
        (!written.is_empty()).then(|| reconcile(catalog, &written, previous.as_deref()));

    Ok(BatchReport {
        dest_dir: request.dest_dir.clone(),
        format: request.format,
        outcomes,
        reconciled,
    })
}
