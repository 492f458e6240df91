//! # viewer-export
//!
//! Batch image export for an image viewer. Takes the images in a folder,
//! resamples each one to a target size, writes it out as TGA, PNG, BMP, JPEG
//! or GIF, and keeps the viewer's in-memory image list in step with what
//! landed on disk.
//!
//! # Flow
//!
//! ```text
//! config.toml + flags ─► ExportRequest
//!                            │
//!   Catalog::populate ──► files_needing_overwrite ─► (confirm)
//!                            │
//!                       save_all_images / save_as
//!                            │  per image: load-if-needed → copy →
//!                            │  restore unloaded → resample → encode
//!                            ▼
//!                        reconcile (one pass) ─► re-sort ─► re-select
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Size math, format/filter tables, and the [`ImageBackend`](imaging::ImageBackend) trait with its `image` + `fast_image_resize` implementation |
//! | [`catalog`] | The viewed folder's images: load/unload state, dirty flag, sorting, current selection |
//! | [`export`] | Single-image save, batch save, destination paths, the batch report |
//! | [`overwrite`] | Which destination files already exist, and the prompt summary |
//! | [`reconcile`] | Fold written files back into the catalog |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Snapshot, Then Mutate
//!
//! The batch loop walks a snapshot of `(index, path)` pairs and only borrows
//! one image at a time. Written paths are collected and the catalog is
//! changed once, after the loop. A save that lands in the viewed folder can
//! therefore never shift the indices the loop is still using.
//!
//! ## At-Least-Effort Batches
//!
//! A file that fails to decode or encode is recorded and skipped. Only a
//! destination directory that cannot be created stops the batch, and it
//! stops it before anything is written. The report distinguishes "some
//! failed" from "nothing was written".
//!
//! ## Memory State Is Restored
//!
//! Exporting an image that was not loaded decodes it, copies the current
//! picture, and unloads it again straight away. Exporting a whole folder
//! never holds more than one decoded source at a time.
//!
//! ## Platform-Dependent Folder Matching
//!
//! Whether a written file belongs to the viewed folder is decided by a
//! case-sensitive comparison on Linux and a case-insensitive one elsewhere,
//! matching how each platform's filesystems usually behave.

pub mod catalog;
pub mod config;
pub mod export;
pub mod imaging;
pub mod output;
pub mod overwrite;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod test_helpers;
