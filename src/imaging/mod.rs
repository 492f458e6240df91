//! Image processing: pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode** | `image::ImageReader`, `GifDecoder` for frames |
//! | **Resample** | `fast_image_resize` with six named kernels |
//! | **Encode** | TGA / PNG / BMP / JPEG / GIF encoders from `image` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing export settings
//! - **Picture**: One decoded frame held in memory
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
mod picture;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    MIN_DIMENSION, Pow2Snap, SaveAsSize, compute_output_size, needs_resample,
    next_higher_power_of_two, next_lower_power_of_two,
};
pub use params::{
    ColourFormat, EncodeOptions, EncodeParams, FormatInfo, Quality, ResampleFilter, SAVE_FORMATS,
    SaveFormat, SizeMode, SizeSpec,
};
pub use picture::Picture;
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
