//! In-memory pixel data for one frame.

use super::backend::Dimensions;
use super::params::ColourFormat;
use image::{DynamicImage, Rgba, RgbaImage};

/// One decoded frame, stored as straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pixels: RgbaImage,
}

impl Picture {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.into_rgba8())
    }

    /// A single-colour picture. Mostly useful for tests and placeholders.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// True when every pixel has full alpha.
    pub fn is_opaque(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == u8::MAX)
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copy into the layout the encoder should see.
    pub fn to_dynamic(&self, colour: ColourFormat) -> DynamicImage {
        let rgba = DynamicImage::ImageRgba8(self.pixels.clone());
        match colour {
            ColourFormat::Colour => DynamicImage::ImageRgb8(rgba.to_rgb8()),
            ColourFormat::ColourAndAlpha => rgba,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_picture_is_opaque_at_full_alpha() {
        assert!(Picture::filled(3, 2, [1, 2, 3, 255]).is_opaque());
        assert!(!Picture::filled(3, 2, [1, 2, 3, 254]).is_opaque());
    }

    #[test]
    fn single_translucent_pixel_breaks_opacity() {
        let mut pixels = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        pixels.put_pixel(3, 3, Rgba([0, 0, 0, 10]));
        assert!(!Picture::new(pixels).is_opaque());
    }

    #[test]
    fn to_dynamic_drops_alpha_for_colour() {
        let pic = Picture::filled(2, 2, [9, 8, 7, 100]);
        assert!(!pic.to_dynamic(ColourFormat::Colour).color().has_alpha());
        assert!(pic.to_dynamic(ColourFormat::ColourAndAlpha).color().has_alpha());
    }

    #[test]
    fn dimensions_match_buffer() {
        let pic = Picture::filled(7, 5, [0, 0, 0, 255]);
        assert_eq!(
            pic.dimensions(),
            Dimensions {
                width: 7,
                height: 5
            }
        );
    }
}
