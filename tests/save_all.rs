//! End-to-end export tests against real files and the real backend.
//!
//! Each test builds a throwaway folder of synthetic images, runs the public
//! API the way the CLI does, and checks what landed on disk and in the
//! catalog.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use viewer_export::catalog::{Catalog, SortKey};
use viewer_export::config::{ExportConfig, load_config};
use viewer_export::export::{ExportRequest, ExportStatus, save_all_images, save_as};
use viewer_export::imaging::{
    Dimensions, EncodeOptions, EncodeParams, ResampleFilter, RustBackend, SaveFormat, SizeMode,
};
use viewer_export::overwrite::files_needing_overwrite;

fn write_rgb(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 5) as u8, 90]))
        .save(path)
        .unwrap();
}

fn folder(files: &[(&str, u32, u32)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, w, h) in files {
        write_rgb(&tmp.path().join(name), *w, *h);
    }
    tmp
}

fn catalog(dir: &Path) -> Catalog {
    Catalog::populate(dir, SortKey::FileName, true).unwrap()
}

fn dims(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[test]
fn batch_with_one_corrupt_source_writes_the_rest() {
    let tmp = folder(&[("a.png", 40, 30), ("b.jpg", 64, 48)]);
    fs::write(tmp.path().join("c.png"), b"not really a png").unwrap();
    let mut catalog = catalog(tmp.path());

    let mut config = ExportConfig::default();
    config.resize.percent = 50.0;
    let request = ExportRequest::from_config(&config, tmp.path());

    let report = save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.written_count(), 2);
    assert_eq!(report.failed_count(), 1);

    let saved = tmp.path().join("Saved");
    assert_eq!(dims(&saved.join("a.tga")), (20, 15));
    assert_eq!(dims(&saved.join("b.tga")), (32, 24));
    assert!(!saved.join("c.tga").exists());

    // Sub-folder output leaves the viewed catalog unchanged
    assert_eq!(catalog.len(), 3);
    assert!(catalog.images().iter().all(|img| !img.is_loaded()));
}

#[test]
fn percent_100_copies_at_source_size() {
    let tmp = folder(&[("a.png", 33, 17)]);
    let mut catalog = catalog(tmp.path());
    let mut config = ExportConfig::default();
    config.save.file_type = SaveFormat::Bmp;
    let request = ExportRequest::from_config(&config, tmp.path());

    let report = save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    assert_eq!(
        report.outcomes[0].status,
        ExportStatus::Written {
            width: 33,
            height: 17,
            resampled: false
        }
    );
    assert_eq!(dims(&tmp.path().join("Saved/a.bmp")), (33, 17));
}

#[test]
fn width_retain_aspect_follows_each_source() {
    let tmp = folder(&[("wide.png", 160, 90), ("square.png", 50, 50)]);
    let mut catalog = catalog(tmp.path());
    let mut config = ExportConfig::default();
    config.save.file_type = SaveFormat::Jpg;
    config.save.jpeg_quality = 80;
    config.resize.size_mode = SizeMode::SetWidthRetainAspect;
    config.resize.width = 80;
    let request = ExportRequest::from_config(&config, tmp.path());

    save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    let saved = tmp.path().join("Saved");
    assert_eq!(dims(&saved.join("wide.jpg")), (80, 45));
    assert_eq!(dims(&saved.join("square.jpg")), (80, 80));
}

#[test]
fn batch_into_viewed_folder_grows_catalog_and_keeps_selection() {
    let tmp = folder(&[("a.png", 20, 20), ("b.png", 20, 20)]);
    let mut catalog = catalog(tmp.path());
    catalog.set_current_image(&tmp.path().join("b.png"));

    let mut config = ExportConfig::default();
    config.save.sub_folder = String::new();
    let request = ExportRequest::from_config(&config, tmp.path());

    save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    let names: Vec<String> = catalog.images().iter().map(|img| img.file_name()).collect();
    assert_eq!(names, vec!["a.png", "a.tga", "b.png", "b.tga"]);
    assert_eq!(
        catalog.current_path(),
        Some(tmp.path().join("b.png").as_path())
    );
    let new_entry = &catalog.images()[1];
    assert!(new_entry.file_size() > 0);
}

#[test]
fn overwrite_scan_sees_previous_export() {
    let tmp = folder(&[("a.png", 10, 10), ("b.png", 10, 10)]);
    let mut catalog = catalog(tmp.path());
    let request = ExportRequest::from_config(&ExportConfig::default(), tmp.path());

    let sources: Vec<PathBuf> = catalog
        .images()
        .iter()
        .map(|img| img.path().to_path_buf())
        .collect();
    let before = files_needing_overwrite(
        sources.iter().map(PathBuf::as_path),
        &request.dest_dir,
        request.format,
    );
    assert!(before.is_empty());

    save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    let after = files_needing_overwrite(
        sources.iter().map(PathBuf::as_path),
        &request.dest_dir,
        request.format,
    );
    assert_eq!(
        after,
        vec![
            request.dest_dir.join("a.tga"),
            request.dest_dir.join("b.tga")
        ]
    );
}

#[test]
fn save_as_translucent_png_keeps_alpha_and_selects_output() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("sprite.png");
    RgbaImage::from_fn(64, 32, |x, _| {
        Rgba([255, 128, 0, if x < 32 { 0 } else { 255 }])
    })
    .save(&source)
    .unwrap();
    let mut catalog = catalog(tmp.path());
    let out = tmp.path().join("sprite_half.png");

    let single = save_as(
        &RustBackend::new(),
        &mut catalog,
        0,
        &out,
        Dimensions {
            width: 32,
            height: 16,
        },
        ResampleFilter::Bicubic,
        &EncodeParams {
            format: SaveFormat::Png,
            options: EncodeOptions::default(),
        },
    )
    .unwrap();

    assert!(single.saved.resampled);
    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (32, 16));
    assert!(written.color().has_alpha());
    assert_eq!(catalog.current_path(), Some(out.as_path()));
    assert_eq!(catalog.len(), 2);
}

#[test]
fn config_file_drives_the_request() {
    let tmp = folder(&[("a.png", 24, 12)]);
    fs::write(
        tmp.path().join("config.toml"),
        r#"
[save]
sub_folder = "out/small"
file_type = "gif"

[resize]
size_mode = "set-height-retain-aspect"
height = 6
filter = "nearest-neighbour"
"#,
    )
    .unwrap();

    let config = load_config(tmp.path()).unwrap();
    let request = ExportRequest::from_config(&config, tmp.path());
    let mut catalog = catalog(tmp.path());

    let report = save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    assert_eq!(report.written_count(), 1);
    assert_eq!(dims(&tmp.path().join("out/small/a.gif")), (12, 6));
}

#[test]
fn oversized_percent_is_a_per_file_failure() {
    let tmp = folder(&[("a.png", 10, 10)]);
    fs::create_dir(tmp.path().join("Saved")).unwrap();
    fs::write(tmp.path().join("Saved/a.tga"), b"earlier export").unwrap();
    let mut catalog = catalog(tmp.path());

    let mut config = ExportConfig::default();
    config.resize.percent = 1.0e12;
    config.validate().unwrap();
    let request = ExportRequest::from_config(&config, tmp.path());

    let report = save_all_images(&RustBackend::new(), &mut catalog, &request).unwrap();

    assert_eq!(report.failed_count(), 1);
    assert!(report.is_total_failure());
    assert_eq!(
        fs::read(tmp.path().join("Saved/a.tga")).unwrap(),
        b"earlier export"
    );
    assert!(!catalog.images()[0].is_loaded());
}
