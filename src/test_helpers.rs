//! Shared test utilities for the viewer-export test suite.
//!
//! Writes small synthetic images to disk so catalog and export tests can run
//! against real files without shipping fixtures.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = images_dir(&[("a.png", 40, 30), ("b.jpg", 64, 64)]);
//! let catalog = Catalog::populate(tmp.path(), SortKey::FileName, true).unwrap();
//! assert_eq!(catalog.len(), 2);
//! ```

use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid JPEG file with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid opaque PNG file with the given dimensions.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height).save(path).unwrap();
}

/// Write a PNG whose left half is fully transparent.
pub fn write_translucent_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, _| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        Rgba([200, 40, 40, alpha])
    })
    .save(path)
    .unwrap();
}

/// Create a temp directory holding one image per `(name, width, height)`.
///
/// The encoder is picked from the extension; `.jpg`/`.jpeg` get JPEG and
/// everything else goes through `image::save`.
pub fn images_dir(files: &[(&str, u32, u32)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, width, height) in files {
        let path = tmp.path().join(name);
        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if is_jpeg {
            write_test_jpeg(&path, *width, *height);
        } else {
            gradient(*width, *height).save(&path).unwrap();
        }
    }
    tmp
}
