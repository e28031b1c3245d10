//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered region of `source` with the aspect ratio of `target`.
///
/// Cropping first and resizing second keeps degenerate inputs (1xN, Nx1)
/// from being blown up to enormous intermediates before the crop.
///
/// # Examples
/// ```
/// # use thumbrelay::imaging::calculations::{centered_crop, CropBox};
/// // 4000x3000 → 16:9 keeps full width, trims top and bottom
/// assert_eq!(
///     centered_crop((4000, 3000), (320, 180)),
///     CropBox { x: 0, y: 375, width: 4000, height: 2250 }
/// );
/// ```
pub fn centered_crop(source: (u32, u32), target: (u32, u32)) -> CropBox {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    // Compare aspects by cross-multiplication to avoid float ties.
    let src_cross = src_w as u64 * tgt_h as u64;
    let tgt_cross = tgt_w as u64 * src_h as u64;

    let (width, height) = if src_cross == tgt_cross {
        (src_w, src_h)
    } else if src_cross > tgt_cross {
        // Source is wider: keep height, trim width
        let w = (src_h as f64 * tgt_w as f64 / tgt_h as f64).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller: keep width, trim height
        let h = (src_w as f64 * tgt_h as f64 / tgt_w as f64).round() as u32;
        (src_w, h.clamp(1, src_h))
    };

    CropBox {
        x: (src_w - width) / 2,
        y: (src_h - height) / 2,
        width,
        height,
    }
}

/// Dimensions of `source` scaled down to fit inside `bound`, preserving
/// aspect ratio. Never upscales: a source already inside the bound is
/// returned unchanged.
///
/// The rounded side is picked between floor and ceil by whichever keeps the
/// aspect ratio closest, and is never less than one pixel.
pub fn fit_within(source: (u32, u32), bound: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let x = bound.0.min(src_w);
    let y = bound.1.min(src_h);

    if x == src_w && y == src_h {
        return source;
    }

    let aspect = src_w as f64 / src_h as f64;
    if x as f64 / y as f64 >= aspect {
        // Height is the constraint
        let w = closest_side(y as f64 * aspect, |n| (aspect - n / y as f64).abs());
        (w, y)
    } else {
        // Width is the constraint
        let h = closest_side(x as f64 / aspect, |n| (aspect - x as f64 / n).abs());
        (x, h)
    }
}

/// Floor or ceil of `value`, whichever scores lower, clamped to at least 1.
fn closest_side(value: f64, score: impl Fn(f64) -> f64) -> u32 {
    let lo = value.floor().max(1.0);
    let hi = value.ceil().max(1.0);
    let pick = if score(lo) <= score(hi) { lo } else { hi };
    pick as u32
}

/// Top-left offset that centers `inner` on `canvas`.
pub fn center_offset(canvas: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        canvas.0.saturating_sub(inner.0) / 2,
        canvas.1.saturating_sub(inner.1) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // centered_crop tests
    // =========================================================================

    #[test]
    fn crop_landscape_photo_to_wide() {
        // 4:3 → 16:9 trims rows
        let c = centered_crop((4000, 3000), (320, 180));
        assert_eq!((c.width, c.height), (4000, 2250));
        assert_eq!((c.x, c.y), (0, 375));
    }

    #[test]
    fn crop_portrait_to_square() {
        let c = centered_crop((600, 800), (320, 320));
        assert_eq!(
            c,
            CropBox {
                x: 0,
                y: 100,
                width: 600,
                height: 600
            }
        );
    }

    #[test]
    fn crop_panorama_to_wide_trims_columns() {
        let c = centered_crop((3200, 900), (320, 180));
        assert_eq!((c.width, c.height), (1600, 900));
        assert_eq!((c.x, c.y), (800, 0));
    }

    #[test]
    fn crop_same_aspect_is_identity() {
        let c = centered_crop((1920, 1080), (320, 180));
        assert_eq!(
            c,
            CropBox {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn crop_one_pixel_wide_column() {
        // 1x1000 to 16:9 → keep the single column, one row tall at most
        let c = centered_crop((1, 1000), (320, 180));
        assert_eq!(c.width, 1);
        assert_eq!(c.height, 1);
        assert_eq!(c.y, 499);
    }

    #[test]
    fn crop_one_pixel_tall_row() {
        let c = centered_crop((1000, 1), (320, 320));
        assert_eq!((c.width, c.height), (1, 1));
        assert_eq!(c.x, 499);
    }

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn fit_landscape_into_square_bound() {
        assert_eq!(fit_within((4000, 3000), (320, 320)), (320, 240));
    }

    #[test]
    fn fit_portrait_into_square_bound() {
        assert_eq!(fit_within((3000, 4000), (320, 320)), (240, 320));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_within((100, 100), (320, 180)), (100, 100));
        assert_eq!(fit_within((200, 50), (320, 320)), (200, 50));
    }

    #[test]
    fn fit_square_into_wide_bound() {
        assert_eq!(fit_within((1000, 1000), (320, 180)), (180, 180));
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within((10_000, 2), (320, 320)), (320, 1));
        assert_eq!(fit_within((2, 10_000), (320, 320)), (1, 320));
    }

    #[test]
    fn fit_partially_oversized() {
        // Only height exceeds the wide bound
        assert_eq!(fit_within((200, 400), (320, 180)), (90, 180));
    }

    // =========================================================================
    // center_offset tests
    // =========================================================================

    #[test]
    fn offset_centers_smaller_inner() {
        assert_eq!(center_offset((320, 180), (100, 100)), (110, 40));
    }

    #[test]
    fn offset_for_exact_fit_is_zero() {
        assert_eq!(center_offset((320, 180), (320, 180)), (0, 0));
    }

    #[test]
    fn offset_rounds_down_odd_margins() {
        assert_eq!(center_offset((320, 180), (319, 179)), (0, 0));
        assert_eq!(center_offset((320, 180), (317, 177)), (1, 1));
    }
}
