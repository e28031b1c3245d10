//! The four framing strategies.
//!
//! | Style | Canvas | Crops? | Upscales? |
//! |---|---|---|---|
//! | `cover` | exactly 320x180 | center, longer axis | yes |
//! | `fit` | exactly 320x180, blurred cover backdrop | no | no (foreground) |
//! | `square` | exactly 320x320 | center, longer axis | yes |
//! | `auto` | varies, longer side ≤ 320 | no | no |
//!
//! Every resize uses Lanczos3, and every output gets an [`UnsharpMask`] pass
//! to win back the detail the resample softens.

use super::calculations::{center_offset, centered_crop, fit_within};
use super::params::{BACKDROP_BLUR_SIGMA, Footprint, UnsharpMask};
use super::style::Style;
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Run the compositor selected by `style`.
pub fn compose(style: Style, raster: &RgbImage) -> RgbImage {
    match style {
        Style::Cover => cover(raster),
        Style::Fit => fit(raster),
        Style::Square => square(raster),
        Style::Auto => auto_fit(raster),
    }
}

/// Crop-and-scale to exactly 320x180.
pub fn cover(raster: &RgbImage) -> RgbImage {
    unsharp_mask(&fill(raster, Footprint::WIDE), UnsharpMask::crisp())
}

/// Crop-and-scale to exactly 320x320.
pub fn square(raster: &RgbImage) -> RgbImage {
    unsharp_mask(&fill(raster, Footprint::SQUARE), UnsharpMask::crisp())
}

/// Scale down so the longer side is at most 320; never upscales.
pub fn auto_fit(raster: &RgbImage) -> RgbImage {
    unsharp_mask(&shrink(raster, Footprint::SQUARE), UnsharpMask::crisp())
}

/// 320x180 canvas: the whole image, shrunk to fit and centered, over a
/// blurred cover-fill of itself.
pub fn fit(raster: &RgbImage) -> RgbImage {
    let footprint = Footprint::WIDE;
    let mut canvas = imageops::blur(&fill(raster, footprint), BACKDROP_BLUR_SIGMA);

    let foreground = shrink(raster, footprint);
    let (x, y) = center_offset(footprint.as_tuple(), foreground.dimensions());
    imageops::replace(&mut canvas, &foreground, x as i64, y as i64);

    unsharp_mask(&canvas, UnsharpMask::soft())
}

/// Center-crop to the footprint's aspect, then resize to it exactly.
fn fill(raster: &RgbImage, footprint: Footprint) -> RgbImage {
    let crop = centered_crop(raster.dimensions(), footprint.as_tuple());
    let region = imageops::crop_imm(raster, crop.x, crop.y, crop.width, crop.height).to_image();
    imageops::resize(
        &region,
        footprint.width,
        footprint.height,
        FilterType::Lanczos3,
    )
}

/// Aspect-preserving downscale into the footprint.
fn shrink(raster: &RgbImage, footprint: Footprint) -> RgbImage {
    let (w, h) = fit_within(raster.dimensions(), footprint.as_tuple());
    if (w, h) == raster.dimensions() {
        return raster.clone();
    }
    imageops::resize(raster, w, h, FilterType::Lanczos3)
}

/// Unsharp mask with a percentage amount.
///
/// `imageops::unsharpen` only adds the difference back at 100%, so the blur
/// comes from `imageops::blur` and the blend is done here.
pub fn unsharp_mask(raster: &RgbImage, mask: UnsharpMask) -> RgbImage {
    let blurred = imageops::blur(raster, mask.radius);
    let threshold = mask.threshold as i32;
    let amount = mask.amount as i32;

    let mut out = raster.clone();
    for (dst, src) in out.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let orig = dst[c] as i32;
            let diff = orig - src[c] as i32;
            if diff.abs() >= threshold {
                dst[c] = (orig + diff * amount / 100).clamp(0, 255) as u8;
            }
        }
    }
    out
}
