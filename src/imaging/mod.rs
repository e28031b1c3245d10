//! Thumbnail pipeline: pure Rust apart from the mozjpeg encoder.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Load** | `image` decoders, EXIF orientation, first frame; AVIF via `avif-parse` + `rav1d` |
//! | **Compose** | `crop_imm` + Lanczos3 `resize`, `blur`, unsharp mask |
//! | **Encode** | `mozjpeg` (progressive, optimized, 4:2:0) down a fixed quality ladder |
//!
//! The module is split into:
//! - **Parameters**: Footprints, budgets, ladder, sharpening constants
//! - **Calculations**: Pure functions for crop/fit geometry (unit testable)
//! - **Loader / HEIF**: Bytes → canonical RGB raster
//! - **Compositors**: The four framing strategies
//! - **Encoder**: [`JpegCodec`] trait + [`MozJpeg`] + budget search
//! - **Operations**: [`prepare_thumbnail`], the one entry point callers need

pub mod calculations;
pub mod compositors;
pub mod encoder;
mod error;
pub mod heif;
pub mod loader;
pub mod operations;
mod params;
mod style;

pub use encoder::{EncodedThumbnail, JpegCodec, MozJpeg, encode_under_budget};
pub use error::{DecodeError, ThumbnailError};
pub use operations::{prepare_thumbnail, prepare_thumbnail_bytes, prepare_thumbnail_with};
pub use params::{
    BACKDROP_BLUR_SIGMA, Footprint, POSTER_DEFAULT_MAX_MB, QUALITY_LADDER, Quality,
    THUMBNAIL_BUDGET_BYTES, UnsharpMask,
};
pub use style::{STYLE_TOKENS, Style};
