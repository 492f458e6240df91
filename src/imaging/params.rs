//! Parameter types for export operations.
//!
//! These types describe *what* to produce, not *how*. They are the interface
//! between the export layer (which decides sizes and destinations) and the
//! [`backend`](super::backend) (which does the pixel and codec work). The
//! split lets tests swap in a recording mock without touching export logic.
//!
//! ## Types
//!
//! - [`SaveFormat`]: Output container (tga/png/bmp/jpg/gif) with its trait table.
//! - [`ResampleFilter`]: The six named resample kernels.
//! - [`SizeMode`] / [`SizeSpec`]: How target dimensions are derived.
//! - [`Quality`]: JPEG quality, clamped to what the encoder accepts.
//! - [`EncodeOptions`] / [`EncodeParams`]: Format-specific encoder settings.
//! - [`ColourFormat`]: Whether the alpha channel is written.

use super::backend::Dimensions;
use super::calculations::compute_output_size;
use super::picture::Picture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Tga,
    Png,
    Bmp,
    Jpg,
    /// Kept for settings written by older viewer builds.
    Gif,
}

/// Static traits of a [`SaveFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub format: SaveFormat,
    pub name: &'static str,
    /// Extension including the leading dot.
    pub extension: &'static str,
    pub supports_alpha: bool,
    pub supports_quality: bool,
}

/// Format table, in selector-index order.
pub static SAVE_FORMATS: [FormatInfo; 5] = [
    FormatInfo {
        format: SaveFormat::Tga,
        name: "tga",
        extension: ".tga",
        supports_alpha: true,
        supports_quality: false,
    },
    FormatInfo {
        format: SaveFormat::Png,
        name: "png",
        extension: ".png",
        supports_alpha: true,
        supports_quality: false,
    },
    FormatInfo {
        format: SaveFormat::Bmp,
        name: "bmp",
        extension: ".bmp",
        supports_alpha: true,
        supports_quality: false,
    },
    FormatInfo {
        format: SaveFormat::Jpg,
        name: "jpg",
        extension: ".jpg",
        supports_alpha: false,
        supports_quality: true,
    },
    FormatInfo {
        format: SaveFormat::Gif,
        name: "gif",
        extension: ".gif",
        supports_alpha: true,
        supports_quality: false,
    },
];

impl SaveFormat {
    /// Map a persisted selector index to a format. Out-of-range indices clamp
    /// to the nearest valid entry.
    pub fn from_index(index: i32) -> Self {
        let clamped = index.clamp(0, SAVE_FORMATS.len() as i32 - 1) as usize;
        SAVE_FORMATS[clamped].format
    }

    pub fn index(self) -> usize {
        match self {
            SaveFormat::Tga => 0,
            SaveFormat::Png => 1,
            SaveFormat::Bmp => 2,
            SaveFormat::Jpg => 3,
            SaveFormat::Gif => 4,
        }
    }

    pub fn info(self) -> &'static FormatInfo {
        &SAVE_FORMATS[self.index()]
    }

    pub fn extension(self) -> &'static str {
        self.info().extension
    }

    pub fn supports_alpha(self) -> bool {
        self.info().supports_alpha
    }

    pub fn supports_quality(self) -> bool {
        self.info().supports_quality
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

impl FromStr for SaveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim_start_matches('.').to_ascii_lowercase();
        let wanted = if wanted == "jpeg" { "jpg".to_string() } else { wanted };
        SAVE_FORMATS
            .iter()
            .find(|info| info.name == wanted)
            .map(|info| info.format)
            .ok_or_else(|| format!("unknown file type '{s}' (expected tga, png, bmp, jpg or gif)"))
    }
}

/// Resample kernel used when the output size differs from the source.
///
/// Names are passed through to the resampler unchanged; see
/// [`RustBackend`](super::rust_backend::RustBackend) for the kernel mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    NearestNeighbour,
    Box,
    #[default]
    Bilinear,
    Bicubic,
    Quadratic,
    Hamming,
}

impl ResampleFilter {
    pub const ALL: [ResampleFilter; 6] = [
        ResampleFilter::NearestNeighbour,
        ResampleFilter::Box,
        ResampleFilter::Bilinear,
        ResampleFilter::Bicubic,
        ResampleFilter::Quadratic,
        ResampleFilter::Hamming,
    ];

    /// Map a persisted selector index to a filter, clamping to `0..=5`.
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.clamp(0, Self::ALL.len() as i32 - 1) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            ResampleFilter::NearestNeighbour => "nearest-neighbour",
            ResampleFilter::Box => "box",
            ResampleFilter::Bilinear => "bilinear",
            ResampleFilter::Bicubic => "bicubic",
            ResampleFilter::Quadratic => "quadratic",
            ResampleFilter::Hamming => "hamming",
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResampleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        let wanted = match wanted.as_str() {
            "nearest" | "nearestneighbour" | "nearest-neighbor" => "nearest-neighbour",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| format!("unknown resample filter '{s}'"))
    }
}

/// How target dimensions are derived from each source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMode {
    /// Scale both dimensions by a percentage of the original.
    #[default]
    Percent,
    /// Exact width and height; aspect ratio is not preserved.
    SetWidthAndHeight,
    /// Fixed width; height follows the source aspect ratio.
    SetWidthRetainAspect,
    /// Fixed height; width follows the source aspect ratio.
    SetHeightRetainAspect,
}

impl SizeMode {
    pub fn name(self) -> &'static str {
        match self {
            SizeMode::Percent => "percent",
            SizeMode::SetWidthAndHeight => "set-width-and-height",
            SizeMode::SetWidthRetainAspect => "set-width-retain-aspect",
            SizeMode::SetHeightRetainAspect => "set-height-retain-aspect",
        }
    }
}

impl fmt::Display for SizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "percent" => Ok(SizeMode::Percent),
            "set-width-and-height" | "width-and-height" => Ok(SizeMode::SetWidthAndHeight),
            "set-width-retain-aspect" | "width" => Ok(SizeMode::SetWidthRetainAspect),
            "set-height-retain-aspect" | "height" => Ok(SizeMode::SetHeightRetainAspect),
            _ => Err(format!("unknown size mode '{s}'")),
        }
    }
}

/// A sizing mode together with the values it reads.
///
/// Only the values the mode names are authoritative; the rest are carried
/// along untouched so a UI can switch modes without losing input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeSpec {
    pub mode: SizeMode,
    pub percent: f32,
    pub width: u32,
    pub height: u32,
}

impl SizeSpec {
    /// Exact output size, as used by the single-image save path.
    pub fn exact(dims: Dimensions) -> Self {
        Self {
            mode: SizeMode::SetWidthAndHeight,
            percent: 100.0,
            width: dims.width,
            height: dims.height,
        }
    }

    /// Target dimensions for a source of the given size.
    pub fn resolve(&self, source: Dimensions) -> Dimensions {
        compute_output_size(source, self.mode, self.percent, self.width, self.height)
    }
}

/// JPEG quality setting (1-100).
///
/// The persisted range is 0–100; the encoder's floor is 1, so 0 maps to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Whether the written file carries an alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColourFormat {
    Colour,
    ColourAndAlpha,
}

/// Format-specific encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Run-length encode TGA output. Ignored by other formats.
    pub targa_rle: bool,
    /// Used by JPEG only.
    pub jpeg_quality: Quality,
}

/// Everything the encoder needs besides the pixels and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: SaveFormat,
    pub options: EncodeOptions,
}

impl EncodeParams {
    /// Opaque pictures are written colour-only; translucent ones keep alpha
    /// when the container can store it.
    pub fn colour_format(&self, picture: &Picture) -> ColourFormat {
        if picture.is_opaque() || !self.format.supports_alpha() {
            ColourFormat::Colour
        } else {
            ColourFormat::ColourAndAlpha
        }
    }
}
