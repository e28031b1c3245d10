//! Shared test utilities: synthetic rasters and encoded image fixtures.
//!
//! Everything is generated in memory so tests need no fixture files.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let src = with_exif_orientation(&jpeg_bytes(40, 20), 6);
//! let raster = load(&src).unwrap();
//! assert_eq!(raster.dimensions(), (20, 40));
//! ```

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Rasters
// =========================================================================

/// Smooth colour ramp; compresses well.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Black/white checkerboard with square cells of `cell` pixels.
/// The top-left cell is black.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Per-pixel xorshift noise; resists JPEG compression.
pub fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    RgbImage::from_fn(width, height, |_, _| {
        let v = next().to_le_bytes();
        Rgb([v[0], v[1], v[2]])
    })
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Baseline JPEG of a [`gradient`].
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_jpeg(&gradient(width, height))
}

pub fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(img)
        .unwrap();
    buf
}

/// PNG with a varying alpha channel.
pub fn png_rgba_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, 64, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Two-frame GIF: solid red, then solid blue.
pub fn animated_gif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255])]
            .into_iter()
            .map(|px| {
                Frame::from_parts(
                    RgbaImage::from_pixel(width, height, px),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                )
            });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

/// Insert an EXIF APP1 segment carrying `orientation` right after SOI.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");

    // Big-endian TIFF: header, one-entry IFD0, no next IFD.
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// An ISO-BMFF header with HEIC brands and no decodable payload.
pub fn heic_stub_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&24u32.to_be_bytes());
    out.extend_from_slice(b"ftypheic");
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(b"mif1heic");
    out.extend_from_slice(&8u32.to_be_bytes());
    out.extend_from_slice(b"meta");
    out
}

/// AVIF of a [`gradient`], encoded with the image crate's rav1e encoder.
#[cfg(feature = "avif")]
pub fn avif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 10, 80);
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    buf
}
