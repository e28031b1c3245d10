//! Fixed parameters of the thumbnail pipeline.
//!
//! Everything here is a compile-time constant: the footprints and the byte
//! budget come from Telegram's thumbnail rules (JPEG, at most 200 KiB, no side
//! above 320 px) and are not user-configurable.
//!
//! ## Types
//!
//! - [`Footprint`]: Target width x height for a compositor.
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`UnsharpMask`]: Radius/amount/threshold of the post-resample sharpening.

/// Maximum encoded size of an attached thumbnail.
pub const THUMBNAIL_BUDGET_BYTES: usize = 200 * 1024;

/// Maximum accepted size of a poster image, in MiB. The poster is stored
/// unmodified; this only gates intake.
pub const POSTER_DEFAULT_MAX_MB: u64 = 5;

/// Qualities tried by the size-constrained encoder, highest first.
pub const QUALITY_LADDER: [u8; 15] = [90, 85, 80, 75, 70, 65, 60, 55, 50, 45, 40, 35, 30, 25, 20];

/// Gaussian radius of the `fit` backdrop.
pub const BACKDROP_BLUR_SIGMA: f32 = 12.0;

/// Target dimensions for a compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    /// 16:9 cap used by `cover` and `fit`.
    pub const WIDE: Footprint = Footprint {
        width: 320,
        height: 180,
    };

    /// Square cap used by `square`, and the bounding box for `auto`.
    pub const SQUARE: Footprint = Footprint {
        width: 320,
        height: 320,
    };

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(QUALITY_LADDER[0])
    }
}

/// Unsharp-mask parameters.
///
/// - `radius`: Gaussian sigma of the blurred copy
/// - `amount`: Percentage of the (original - blurred) difference added back
/// - `threshold`: Minimum per-channel difference before a pixel is sharpened
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpMask {
    pub radius: f32,
    pub amount: u32,
    pub threshold: u8,
}

impl UnsharpMask {
    /// Sharpening for `cover`, `square` and `auto` output.
    pub fn crisp() -> Self {
        Self {
            radius: 1.1,
            amount: 115,
            threshold: 3,
        }
    }

    /// Slightly softer pass for the composited `fit` canvas, whose backdrop
    /// is already blurred.
    pub fn soft() -> Self {
        Self {
            radius: 1.0,
            amount: 110,
            threshold: 3,
        }
    }
}
