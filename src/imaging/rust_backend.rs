//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, TGA) | `image::ImageReader` |
//! | Decode (GIF, all frames) | `image::codecs::gif::GifDecoder` |
//! | Resample | `fast_image_resize::Resizer` on premultiplied RGBA8 |
//! | Encode → TGA | `image::codecs::tga::TgaEncoder` (RLE optional) |
//! | Encode → PNG / BMP | `PngEncoder` / `BmpEncoder` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → GIF | `DynamicImage::write_to` with `ImageFormat::Gif` |
//!
//! Encoders write into memory; the output file is only created or replaced
//! once encoding has succeeded.
//!
//! ## Filter mapping
//!
//! | [`ResampleFilter`] | `fast_image_resize` algorithm |
//! |---|---|
//! | `NearestNeighbour` | `ResizeAlg::Nearest` |
//! | `Box` | `Convolution(Box)` |
//! | `Bilinear` | `Convolution(Bilinear)` |
//! | `Bicubic` | `Convolution(CatmullRom)` |
//! | `Quadratic` | `Convolution(Mitchell)` |
//! | `Hamming` | `Convolution(Hamming)` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{EncodeParams, ResampleFilter, SaveFormat};
use super::picture::Picture;
use fast_image_resize::{self as fir, MulDiv, PixelType, ResizeOptions};
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{AnimationDecoder, ImageFormat, ImageReader, RgbaImage};
use std::fs::File;
use std::io::{BufReader, Cursor, Write};
use std::path::Path;

/// Largest resample target, in RGBA8 bytes (a 16384x16384 picture).
const MAX_TARGET_BYTES: u64 = 1 << 30;

/// Extensions whose decoders are compiled in.
const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tga", "gif"];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    INPUT_EXTENSIONS
}

/// True when `path` has an extension listed in [`supported_input_extensions`].
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| INPUT_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// Pure Rust backend using the `image` and `fast_image_resize` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Decode every frame of a GIF.
fn decode_gif_frames(path: &Path) -> Result<Vec<Picture>, BackendError> {
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader).map_err(|e| decode_error(path, e))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| decode_error(path, e))?;
    Ok(frames
        .into_iter()
        .map(|frame| Picture::new(frame.into_buffer()))
        .collect())
}

fn fir_algorithm(filter: ResampleFilter) -> fir::ResizeAlg {
    use fir::{FilterType, ResizeAlg};
    match filter {
        ResampleFilter::NearestNeighbour => ResizeAlg::Nearest,
        ResampleFilter::Box => ResizeAlg::Convolution(FilterType::Box),
        ResampleFilter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
        ResampleFilter::Bicubic => ResizeAlg::Convolution(FilterType::CatmullRom),
        ResampleFilter::Quadratic => ResizeAlg::Convolution(FilterType::Mitchell),
        ResampleFilter::Hamming => ResizeAlg::Convolution(FilterType::Hamming),
    }
}

/// Resample straight RGBA8 through premultiplied alpha so transparent
/// neighbours do not bleed their colour into the result.
fn resample_rgba(
    source: &RgbaImage,
    target: Dimensions,
    filter: ResampleFilter,
) -> Result<RgbaImage, BackendError> {
    let mut src = fir::images::Image::from_vec_u8(
        source.width(),
        source.height(),
        source.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| resample_err("source buffer", &e))?;
    let mut dst = fir::images::Image::new(target.width, target.height, PixelType::U8x4);

    let mul_div = MulDiv::default();
    mul_div
        .multiply_alpha_inplace(&mut src)
        .map_err(|e| resample_err("premultiply alpha", &e))?;

    let options = ResizeOptions::new().resize_alg(fir_algorithm(filter));
    fir::Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| resample_err("resize", &e))?;

    mul_div
        .divide_alpha_inplace(&mut dst)
        .map_err(|e| resample_err("unpremultiply alpha", &e))?;

    RgbaImage::from_raw(target.width, target.height, dst.into_vec())
        .ok_or_else(|| BackendError::Resample("resized buffer has the wrong length".into()))
}

fn resample_err(what: &str, e: &impl std::fmt::Debug) -> BackendError {
    BackendError::Resample(format!("{what}: {e:?}"))
}

fn encode_error(e: image::ImageError) -> BackendError {
    BackendError::Encode(e.to_string())
}

/// Write `picture` into `writer` in the requested container.
fn encode_into<W: Write + std::io::Seek>(
    picture: &Picture,
    writer: &mut W,
    params: &EncodeParams,
) -> Result<(), BackendError> {
    let colour = params.colour_format(picture);
    let image = picture.to_dynamic(colour);

    match params.format {
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(writer);
            let encoder = if params.options.targa_rle {
                encoder
            } else {
                encoder.disable_rle()
            };
            image.write_with_encoder(encoder).map_err(encode_error)
        }
        SaveFormat::Png => image
            .write_with_encoder(PngEncoder::new(writer))
            .map_err(encode_error),
        SaveFormat::Bmp => image
            .write_with_encoder(BmpEncoder::new(writer))
            .map_err(encode_error),
        SaveFormat::Jpg => {
            let quality = params.options.jpeg_quality.value() as u8;
            image
                .write_with_encoder(JpegEncoder::new_with_quality(writer, quality))
                .map_err(encode_error)
        }
        SaveFormat::Gif => image.write_to(writer, ImageFormat::Gif).map_err(encode_error),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<Vec<Picture>, BackendError> {
        if is_gif(path) {
            return decode_gif_frames(path);
        }
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))?;
        Ok(vec![Picture::from_dynamic(image)])
    }

    fn resample(
        &self,
        picture: &Picture,
        target: Dimensions,
        filter: ResampleFilter,
    ) -> Result<Picture, BackendError> {
        if target.width == 0 || target.height == 0 {
            return Err(BackendError::Resample(format!(
                "target {}x{} has a zero dimension",
                target.width, target.height
            )));
        }
        let bytes = u64::from(target.width)
            .checked_mul(u64::from(target.height))
            .and_then(|pixels| pixels.checked_mul(4));
        if bytes.is_none_or(|b| b > MAX_TARGET_BYTES) {
            return Err(BackendError::Resample(format!(
                "target {}x{} is too large",
                target.width, target.height
            )));
        }
        resample_rgba(picture.as_rgba(), target, filter).map(Picture::new)
    }

    fn encode(
        &self,
        picture: &Picture,
        output: &Path,
        params: &EncodeParams,
    ) -> Result<(), BackendError> {
        let mut buffer = Cursor::new(Vec::new());
        encode_into(picture, &mut buffer, params)?;
        std::fs::write(output, buffer.into_inner())?;
        Ok(())
    }
}
