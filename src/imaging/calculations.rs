//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::SizeMode;
use std::fmt;
use std::str::FromStr;

/// Smallest width or height ever written.
pub const MIN_DIMENSION: u32 = 4;

/// Scale factors this close to 1.0 are treated as "no resize".
const UNIT_SCALE_TOLERANCE: f64 = 0.01;

/// Width over height, or 1.0 for a degenerate source.
fn aspect_ratio(source: Dimensions) -> f64 {
    if source.width == 0 || source.height == 0 {
        return 1.0;
    }
    source.width as f64 / source.height as f64
}

/// Round to the nearest pixel. Negative and NaN inputs saturate to 0.
fn round_px(value: f64) -> u32 {
    value.round() as u32
}

/// Compute the output size for one source image.
///
/// # Arguments
/// * `source` - Source dimensions
/// * `mode` - Which of `percent`, `width`, `height` are authoritative
/// * `percent` - Scale in percent (`Percent` mode)
/// * `width` / `height` - Requested pixel sizes (the other modes)
///
/// # Returns
/// * Target dimensions, never smaller than [`MIN_DIMENSION`] on either axis
///
/// # Examples
/// ```
/// # use viewer_export::imaging::{Dimensions, SizeMode, compute_output_size};
/// let src = Dimensions { width: 1600, height: 900 };
/// let out = compute_output_size(src, SizeMode::SetWidthRetainAspect, 100.0, 800, 0);
/// assert_eq!((out.width, out.height), (800, 450));
/// ```
pub fn compute_output_size(
    source: Dimensions,
    mode: SizeMode,
    percent: f32,
    width: u32,
    height: u32,
) -> Dimensions {
    let aspect = aspect_ratio(source);

    let (out_w, out_h) = match mode {
        SizeMode::Percent => {
            let scale = percent as f64 / 100.0;
            if (scale - 1.0).abs() < UNIT_SCALE_TOLERANCE {
                (source.width, source.height)
            } else {
                (
                    round_px(source.width as f64 * scale),
                    round_px(source.height as f64 * scale),
                )
            }
        }
        SizeMode::SetWidthAndHeight => (width, height),
        SizeMode::SetWidthRetainAspect => (width, round_px(width as f64 / aspect)),
        SizeMode::SetHeightRetainAspect => (round_px(height as f64 * aspect), height),
    };

    Dimensions {
        width: out_w.max(MIN_DIMENSION),
        height: out_h.max(MIN_DIMENSION),
    }
}

/// Resampling happens only when the size actually changes (exact comparison).
pub fn needs_resample(source: Dimensions, target: Dimensions) -> bool {
    source != target
}

/// Largest power of two strictly below `value` (1 for `value <= 2`).
pub fn next_lower_power_of_two(value: u32) -> u32 {
    if value <= 2 {
        return 1;
    }
    1 << (31 - (value - 1).leading_zeros())
}

/// Smallest power of two strictly above `value`, saturating at `2^31`.
pub fn next_higher_power_of_two(value: u32) -> u32 {
    value
        .checked_add(1)
        .and_then(u32::checked_next_power_of_two)
        .unwrap_or(1 << 31)
}

/// Direction for power-of-two snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pow2Snap {
    Lower,
    Higher,
}

impl FromStr for Pow2Snap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower" | "down" => Ok(Pow2Snap::Lower),
            "higher" | "up" => Ok(Pow2Snap::Higher),
            _ => Err(format!("unknown snap direction '{s}' (expected lower or higher)")),
        }
    }
}

impl fmt::Display for Pow2Snap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pow2Snap::Lower => f.write_str("lower"),
            Pow2Snap::Higher => f.write_str("higher"),
        }
    }
}

fn snap(value: u32, direction: Pow2Snap) -> u32 {
    match direction {
        Pow2Snap::Lower => next_lower_power_of_two(value).max(MIN_DIMENSION),
        Pow2Snap::Higher => next_higher_power_of_two(value),
    }
}

/// Interactive size editor for saving a single image.
///
/// With the aspect lock on, editing one side derives the other from the
/// source ratio. Derived sides truncate rather than round, and both sides
/// stay at or above [`MIN_DIMENSION`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaveAsSize {
    source: Dimensions,
    width: u32,
    height: u32,
    lock_aspect: bool,
}

impl SaveAsSize {
    /// Starts at the source size with the aspect lock on.
    pub fn new(source: Dimensions) -> Self {
        let mut size = Self {
            source,
            width: source.width,
            height: source.height,
            lock_aspect: true,
        };
        size.clamp();
        size
    }

    fn clamp(&mut self) {
        self.width = self.width.max(MIN_DIMENSION);
        self.height = self.height.max(MIN_DIMENSION);
    }

    pub fn lock_aspect(&self) -> bool {
        self.lock_aspect
    }

    /// Turning the lock on snaps back to the source size.
    pub fn set_lock_aspect(&mut self, lock: bool) {
        if lock && !self.lock_aspect {
            self.reset();
        }
        self.lock_aspect = lock;
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width;
        if self.lock_aspect {
            self.height = (width as f64 / aspect_ratio(self.source)) as u32;
        }
        self.clamp();
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        if self.lock_aspect {
            self.width = (height as f64 * aspect_ratio(self.source)) as u32;
        }
        self.clamp();
    }

    pub fn snap_width(&mut self, direction: Pow2Snap) {
        self.set_width(snap(self.width, direction));
    }

    pub fn snap_height(&mut self, direction: Pow2Snap) {
        self.set_height(snap(self.height, direction));
    }

    pub fn reset(&mut self) {
        self.width = self.source.width;
        self.height = self.source.height;
        self.clamp();
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn out(src: (u32, u32), mode: SizeMode, percent: f32, w: u32, h: u32) -> (u32, u32) {
        let d = compute_output_size(dims(src.0, src.1), mode, percent, w, h);
        (d.width, d.height)
    }

    // =========================================================================
    // compute_output_size
    // =========================================================================

    #[test]
    fn percent_100_keeps_source_size() {
        for src in [(1, 1), (4, 4), (640, 480), (1601, 899), (3, 7000)] {
            let expected = (src.0.max(4), src.1.max(4));
            assert_eq!(out(src, SizeMode::Percent, 100.0, 0, 0), expected);
        }
    }

    #[test]
    fn percent_within_tolerance_keeps_source_size() {
        assert_eq!(out((1000, 500), SizeMode::Percent, 100.9, 0, 0), (1000, 500));
        assert_eq!(out((1000, 500), SizeMode::Percent, 99.1, 0, 0), (1000, 500));
    }

    #[test]
    fn percent_outside_tolerance_scales() {
        assert_eq!(out((1000, 500), SizeMode::Percent, 150.0, 0, 0), (1500, 750));
        assert_eq!(out((1000, 500), SizeMode::Percent, 50.0, 0, 0), (500, 250));
        assert_eq!(out((1000, 500), SizeMode::Percent, 200.0, 0, 0), (2000, 1000));
    }

    #[test]
    fn percent_rounds_to_nearest() {
        // 333 * 0.5 = 166.5 → 167
        assert_eq!(out((333, 101), SizeMode::Percent, 50.0, 0, 0), (167, 51));
    }

    #[test]
    fn percent_ignores_width_and_height() {
        assert_eq!(out((800, 600), SizeMode::Percent, 50.0, 10, 10), (400, 300));
    }

    #[test]
    fn width_and_height_distorts() {
        assert_eq!(out((1600, 900), SizeMode::SetWidthAndHeight, 100.0, 300, 300), (300, 300));
    }

    #[test]
    fn width_retain_aspect() {
        assert_eq!(
            out((1600, 900), SizeMode::SetWidthRetainAspect, 100.0, 800, 0),
            (800, 450)
        );
    }

    #[test]
    fn height_retain_aspect() {
        assert_eq!(
            out((1600, 900), SizeMode::SetHeightRetainAspect, 100.0, 0, 450),
            (800, 450)
        );
        // 1000/3 aspect, height 100 → 33333.33 → 33333
        assert_eq!(
            out((1000, 3), SizeMode::SetHeightRetainAspect, 100.0, 0, 100),
            (33333, 100)
        );
    }

    #[test]
    fn tiny_request_clamps_to_minimum() {
        assert_eq!(out((100, 100), SizeMode::SetWidthRetainAspect, 100.0, 1, 0), (4, 4));
        assert_eq!(out((100, 100), SizeMode::SetWidthAndHeight, 100.0, 0, 2), (4, 4));
        assert_eq!(out((100, 100), SizeMode::Percent, 1.0, 0, 0), (4, 4));
    }

    #[test]
    fn clamp_applies_per_axis() {
        // Very wide source: height derives below the minimum
        assert_eq!(
            out((4000, 10), SizeMode::SetWidthRetainAspect, 100.0, 400, 0),
            (400, 4)
        );
    }

    #[test]
    fn negative_percent_clamps_instead_of_failing() {
        assert_eq!(out((100, 100), SizeMode::Percent, -50.0, 0, 0), (4, 4));
    }

    #[test]
    fn degenerate_source_does_not_blow_up() {
        assert_eq!(out((0, 0), SizeMode::SetHeightRetainAspect, 100.0, 0, 64), (64, 64));
    }

    #[test]
    fn resample_only_on_exact_change() {
        assert!(!needs_resample(dims(640, 480), dims(640, 480)));
        assert!(needs_resample(dims(640, 480), dims(640, 481)));
    }

    // =========================================================================
    // Power-of-two helpers
    // =========================================================================

    #[test]
    fn lower_power_of_two_is_strict() {
        assert_eq!(next_lower_power_of_two(512), 256);
        assert_eq!(next_lower_power_of_two(513), 512);
        assert_eq!(next_lower_power_of_two(300), 256);
        assert_eq!(next_lower_power_of_two(3), 2);
        assert_eq!(next_lower_power_of_two(2), 1);
        assert_eq!(next_lower_power_of_two(0), 1);
    }

    #[test]
    fn higher_power_of_two_is_strict() {
        assert_eq!(next_higher_power_of_two(512), 1024);
        assert_eq!(next_higher_power_of_two(511), 512);
        assert_eq!(next_higher_power_of_two(0), 1);
        assert_eq!(next_higher_power_of_two(u32::MAX), 1 << 31);
    }

    // =========================================================================
    // SaveAsSize
    // =========================================================================

    #[test]
    fn save_as_starts_at_source() {
        let size = SaveAsSize::new(dims(1920, 1080));
        assert_eq!(size.dimensions(), dims(1920, 1080));
        assert!(size.lock_aspect());
    }

    #[test]
    fn locked_width_truncates_height() {
        let mut size = SaveAsSize::new(dims(800, 400));
        size.set_width(500);
        assert_eq!(size.dimensions(), dims(500, 250));
        // 333 / 2 = 166.5 → 166 (truncated, not rounded)
        size.set_width(333);
        assert_eq!(size.dimensions(), dims(333, 166));
    }

    #[test]
    fn locked_height_truncates_width() {
        let mut size = SaveAsSize::new(dims(800, 400));
        size.set_height(101);
        assert_eq!(size.dimensions(), dims(202, 101));
    }

    #[test]
    fn unlocked_edits_are_independent() {
        let mut size = SaveAsSize::new(dims(800, 600));
        size.set_lock_aspect(false);
        size.set_width(100);
        assert_eq!(size.dimensions(), dims(100, 600));
    }

    #[test]
    fn relocking_resets_to_source() {
        let mut size = SaveAsSize::new(dims(800, 600));
        size.set_lock_aspect(false);
        size.set_width(100);
        size.set_lock_aspect(true);
        assert_eq!(size.dimensions(), dims(800, 600));
    }

    #[test]
    fn save_as_clamps_to_minimum() {
        let mut size = SaveAsSize::new(dims(1000, 10));
        size.set_width(100);
        assert_eq!(size.dimensions(), dims(100, 4));
        size.set_height(0);
        assert_eq!(size.dimensions(), dims(4, 4));
    }

    #[test]
    fn snap_width_to_powers_of_two() {
        let mut size = SaveAsSize::new(dims(600, 300));
        size.snap_width(Pow2Snap::Lower);
        assert_eq!(size.dimensions(), dims(512, 256));
        size.snap_width(Pow2Snap::Higher);
        assert_eq!(size.dimensions(), dims(1024, 512));
    }

    #[test]
    fn snap_lower_never_goes_below_minimum() {
        let mut size = SaveAsSize::new(dims(4, 4));
        size.snap_height(Pow2Snap::Lower);
        assert_eq!(size.dimensions(), dims(4, 4));
    }

    #[test]
    fn parse_snap_direction() {
        assert_eq!("lower".parse::<Pow2Snap>().unwrap(), Pow2Snap::Lower);
        assert_eq!("UP".parse::<Pow2Snap>().unwrap(), Pow2Snap::Higher);
        assert!("sideways".parse::<Pow2Snap>().is_err());
    }
}
