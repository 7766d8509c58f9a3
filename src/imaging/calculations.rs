//! Pure calculation functions for relative resize boxes.
//!
//! All functions here are pure and testable without any I/O or images.
//! Fractional results are rounded half away from zero, and every function
//! expects a non-empty input box.

use crate::types::ImageSize;

fn scaled(size: ImageSize, ratio: f64) -> ImageSize {
    ImageSize {
        width: (size.width as f64 * ratio).round() as u32,
        height: (size.height as f64 * ratio).round() as u32,
    }
}

/// Scale so the width becomes `width`, preserving aspect ratio.
///
/// ```
/// # use respimg::imaging::calculations::widen;
/// # use respimg::types::ImageSize;
/// assert_eq!(widen(ImageSize::new(1600, 900), 800), ImageSize::new(800, 450));
/// ```
pub fn widen(size: ImageSize, width: u32) -> ImageSize {
    let ratio = width as f64 / size.width as f64;
    ImageSize {
        width,
        height: (size.height as f64 * ratio).round() as u32,
    }
}

/// Scale so the height becomes `height`, preserving aspect ratio.
pub fn heighten(size: ImageSize, height: u32) -> ImageSize {
    let ratio = height as f64 / size.height as f64;
    ImageSize {
        width: (size.width as f64 * ratio).round() as u32,
        height,
    }
}

/// Grow the larger edge by `px` pixels, preserving aspect ratio.
///
/// Square images grow on both edges by `px`. `None` when the grown edge
/// does not fit in a `u32`.
pub fn increase(size: ImageSize, px: u32) -> Option<ImageSize> {
    if size.width >= size.height {
        Some(widen(size, size.width.checked_add(px)?))
    } else {
        Some(heighten(size, size.height.checked_add(px)?))
    }
}

/// Multiply both edges by `factor`.
pub fn scale(size: ImageSize, factor: f64) -> ImageSize {
    scaled(size, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // widen / heighten
    // =========================================================================

    #[test]
    fn widen_landscape() {
        // 2000x1500 widened to 1000 → 1000x750
        assert_eq!(
            widen(ImageSize::new(2000, 1500), 1000),
            ImageSize::new(1000, 750)
        );
    }

    #[test]
    fn widen_upscales() {
        assert_eq!(widen(ImageSize::new(100, 50), 400), ImageSize::new(400, 200));
    }

    #[test]
    fn widen_rounds_height() {
        // 800x600 → 333 wide: 600 * 333/800 = 249.75 → 250
        assert_eq!(widen(ImageSize::new(800, 600), 333), ImageSize::new(333, 250));
    }

    #[test]
    fn heighten_portrait() {
        // 1500x2000 heightened to 1000 → 750x1000
        assert_eq!(
            heighten(ImageSize::new(1500, 2000), 1000),
            ImageSize::new(750, 1000)
        );
    }

    // =========================================================================
    // increase
    // =========================================================================

    #[test]
    fn increase_landscape_grows_width() {
        assert_eq!(
            increase(ImageSize::new(100, 50), 100),
            Some(ImageSize::new(200, 100))
        );
    }

    #[test]
    fn increase_portrait_grows_height() {
        assert_eq!(
            increase(ImageSize::new(300, 600), 300),
            Some(ImageSize::new(450, 900))
        );
    }

    #[test]
    fn increase_square_grows_both() {
        assert_eq!(
            increase(ImageSize::new(200, 200), 50),
            Some(ImageSize::new(250, 250))
        );
    }

    #[test]
    fn increase_past_u32_is_none() {
        assert_eq!(increase(ImageSize::new(100, 50), u32::MAX), None);
        assert_eq!(increase(ImageSize::new(50, u32::MAX), 1), None);
    }

    // =========================================================================
    // scale
    // =========================================================================

    #[test]
    fn scale_doubles() {
        assert_eq!(scale(ImageSize::new(100, 50), 2.0), ImageSize::new(200, 100));
    }

    #[test]
    fn scale_down_rounds() {
        // 101x51 * 0.5 = 50.5x25.5 → 51x26
        assert_eq!(scale(ImageSize::new(101, 51), 0.5), ImageSize::new(51, 26));
    }
}
