//! High-level thumbnail operation.
//!
//! Wires loader → compositor → encoder:
//!
//! ```text
//! bytes ──load──▶ RgbImage ──compose(style)──▶ RgbImage ──encode──▶ EncodedThumbnail
//! ```
//!
//! Stateless and synchronous: concurrent calls share nothing and need no
//! coordination. A caller wanting a deadline wraps the call itself.

use super::compositors::compose;
use super::encoder::{EncodedThumbnail, JpegCodec, MozJpeg, encode_under_budget};
use super::error::ThumbnailError;
use super::loader::load;
use super::params::THUMBNAIL_BUDGET_BYTES;
use super::style::Style;

/// Result type for thumbnail operations.
pub type Result<T> = std::result::Result<T, ThumbnailError>;

/// Build a Telegram-ready thumbnail from raw image bytes.
///
/// `style` is normalized with [`Style::from_token`], so unknown tokens
/// produce an `auto` thumbnail rather than an error. Fails only with
/// [`ThumbnailError::Decode`] for unreadable input (or `Encode` if the codec
/// itself breaks).
pub fn prepare_thumbnail(bytes: &[u8], style: &str) -> Result<EncodedThumbnail> {
    prepare_thumbnail_with(&MozJpeg, bytes, Style::from_token(style))
}

/// [`prepare_thumbnail`] returning only the JPEG buffer.
pub fn prepare_thumbnail_bytes(bytes: &[u8], style: &str) -> Result<Vec<u8>> {
    prepare_thumbnail(bytes, style).map(|thumb| thumb.bytes)
}

/// Pipeline with an explicit codec and an already-normalized style.
pub fn prepare_thumbnail_with(
    codec: &impl JpegCodec,
    bytes: &[u8],
    style: Style,
) -> Result<EncodedThumbnail> {
    let raster = load(bytes)?;
    let framed = compose(style, &raster);
    drop(raster);
    encode_under_budget(codec, &framed, THUMBNAIL_BUDGET_BYTES)
}
