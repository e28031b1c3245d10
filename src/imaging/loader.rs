//! Image loader: arbitrary container bytes → canonical RGB raster.
//!
//! | Step | How |
//! |---|---|
//! | Format detection | HEIF `ftyp` sniff, then `ImageReader::with_guessed_format` |
//! | Decode (JPEG, PNG, GIF, WebP, TIFF, BMP) | `image` crate decoders |
//! | Decode (AVIF / HEIC) | [`heif`](super::heif) |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Animated sources | first frame only (what `DynamicImage::from_decoder` reads) |
//! | Colour | `to_rgb8`, alpha discarded |
//! | Truncation | JPEG must carry an EOI marker after its first scan |
//!
//! The JPEG decoder pads a stream that ends mid-scan with grey rows instead
//! of failing, so completeness is checked on the bytes before decoding.

use super::error::DecodeError;
use super::heif;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;

/// Decode `bytes` into an orientation-corrected, single-frame RGB raster.
///
/// Input bytes are only borrowed; nothing is retained.
pub fn load(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    if let Some(kind) = heif::sniff(bytes) {
        return heif::decode(kind, bytes);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::malformed("image", e))?;
    let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
    let name = format_name(format);
    if format == ImageFormat::Jpeg && !jpeg_is_complete(bytes) {
        return Err(DecodeError::malformed(name, "image file is truncated"));
    }

    let mut decoder = reader.into_decoder().map_err(|e| classify(name, e))?;
    // Orientation is read before decoding consumes the decoder. Formats
    // without orientation metadata report no transform.
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| classify(name, e))?;
    img.apply_orientation(orientation);

    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::malformed(name, "image has no pixels"));
    }

    log::debug!(
        "decoded {name} {}x{} ({:?})",
        img.width(),
        img.height(),
        orientation
    );
    Ok(img.to_rgb8())
}

/// True when an end-of-image marker follows the first start-of-scan.
///
/// Header segments are skipped by length, so an EOI inside an embedded EXIF
/// thumbnail does not count. Entropy-coded data escapes `FF` as `FF 00`, so
/// the first `FF D9` after SOS is the real end of image. Bytes after it
/// (padding, MPF trailers) are ignored.
fn jpeg_is_complete(bytes: &[u8]) -> bool {
    let mut i = 2;
    while i + 1 < bytes.len() {
        if bytes[i] != 0xFF {
            return false;
        }
        let marker = bytes[i + 1];
        match marker {
            // Fill byte before a marker
            0xFF => i += 1,
            0xD9 => return true,
            0xDA => return bytes[i + 2..].windows(2).any(|w| w == [0xFF, 0xD9]),
            0x01 | 0xD0..=0xD7 => i += 2,
            _ => {
                let Some(len) = bytes.get(i + 2..i + 4) else {
                    return false;
                };
                i += 2 + u16::from_be_bytes([len[0], len[1]]) as usize;
            }
        }
    }
    false
}

fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("image")
}

fn classify(name: &str, err: image::ImageError) -> DecodeError {
    match err {
        image::ImageError::Unsupported(e) => match e.kind() {
            image::error::UnsupportedErrorKind::Format(_) => DecodeError::CodecUnavailable {
                format: name.to_uppercase(),
            },
            _ => DecodeError::malformed(name, e),
        },
        other => DecodeError::malformed(name, other),
    }
}
