//! Size-constrained JPEG encoding.
//!
//! [`encode_under_budget`] walks [`QUALITY_LADDER`] from the top and keeps
//! the first encoding that fits the byte limit. If none fits, the last
//! (lowest quality) attempt is returned anyway with
//! [`EncodedThumbnail::within_budget`] cleared: a large thumbnail is better
//! than no thumbnail, and the caller decides what to do with the overage.
//!
//! The ladder is walked linearly on purpose. A bisection would finish in
//! fewer attempts but could settle on a different quality when two adjacent
//! levels straddle the limit.

use super::error::ThumbnailError;
use super::params::{QUALITY_LADDER, Quality};
use image::RgbImage;

/// A JPEG codec the encoder can drive at a given quality.
///
/// The production implementation is [`MozJpeg`]. Tests substitute a
/// scripted codec to pin exact byte sizes per quality.
pub trait JpegCodec: Sync {
    fn encode(&self, raster: &RgbImage, quality: Quality) -> Result<Vec<u8>, ThumbnailError>;
}

/// mozjpeg with progressive scans, optimized Huffman tables and 4:2:0
/// chroma subsampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct MozJpeg;

impl JpegCodec for MozJpeg {
    fn encode(&self, raster: &RgbImage, quality: Quality) -> Result<Vec<u8>, ThumbnailError> {
        let (width, height) = raster.dimensions();
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality.value() as f32);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let encode_err = |e: std::io::Error| ThumbnailError::Encode(e.to_string());
        let mut started = comp
            .start_compress(Vec::with_capacity(64 * 1024))
            .map_err(encode_err)?;
        started
            .write_scanlines(raster.as_raw())
            .map_err(encode_err)?;
        started.finish().map_err(encode_err)
    }
}

/// An encoded thumbnail and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedThumbnail {
    pub bytes: Vec<u8>,
    /// Ladder quality that produced `bytes`.
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
    /// False when even the lowest quality exceeded the limit.
    pub within_budget: bool,
}

impl EncodedThumbnail {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode `raster` at the highest ladder quality whose output is at most
/// `limit` bytes.
///
/// A missed budget is not an error; only a codec failure is.
pub fn encode_under_budget(
    codec: &impl JpegCodec,
    raster: &RgbImage,
    limit: usize,
) -> Result<EncodedThumbnail, ThumbnailError> {
    let (width, height) = raster.dimensions();
    let mut last = None;

    for q in QUALITY_LADDER {
        let quality = Quality::new(q);
        let bytes = codec.encode(raster, quality)?;
        log::debug!("q{q}: {} bytes (limit {limit})", bytes.len());

        if bytes.len() <= limit {
            return Ok(EncodedThumbnail {
                bytes,
                quality,
                width,
                height,
                within_budget: true,
            });
        }
        last = Some((bytes, quality));
    }

    let (bytes, quality) =
        last.ok_or_else(|| ThumbnailError::Encode("empty quality ladder".into()))?;
    log::warn!(
        "{width}x{height} thumbnail is {} bytes at q{}, over the {limit} byte budget",
        bytes.len(),
        quality.value()
    );
    Ok(EncodedThumbnail {
        bytes,
        quality,
        width,
        height,
        within_budget: false,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_helpers::{gradient, noise};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Codec that returns a buffer of a scripted length per quality and
    /// records every quality it was asked for.
    /// Uses Mutex (not RefCell) so it satisfies the `Sync` bound.
    pub struct ScriptedCodec {
        sizes: HashMap<u8, usize>,
        pub attempts: Mutex<Vec<u8>>,
    }

    impl ScriptedCodec {
        pub fn new(sizes: impl IntoIterator<Item = (u8, usize)>) -> Self {
            Self {
                sizes: sizes.into_iter().collect(),
                attempts: Mutex::new(Vec::new()),
            }
        }

        /// Size shrinks by 10 KiB per ladder step, starting at `top` for q90.
        pub fn linear(top: usize) -> Self {
            Self::new(
                QUALITY_LADDER
                    .iter()
                    .enumerate()
                    .map(|(i, &q)| (q, top.saturating_sub(i * 10 * 1024).max(1))),
            )
        }

        pub fn attempts(&self) -> Vec<u8> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl JpegCodec for ScriptedCodec {
        fn encode(&self, _raster: &RgbImage, quality: Quality) -> Result<Vec<u8>, ThumbnailError> {
            self.attempts.lock().unwrap().push(quality.value());
            let len = self.sizes.get(&quality.value()).copied().unwrap_or(1);
            Ok(vec![quality.value(); len])
        }
    }

    struct FailingCodec;

    impl JpegCodec for FailingCodec {
        fn encode(&self, _: &RgbImage, _: Quality) -> Result<Vec<u8>, ThumbnailError> {
            Err(ThumbnailError::Encode("scripted failure".into()))
        }
    }

    #[test]
    fn first_fit_takes_quality_90_when_it_fits() {
        let codec = ScriptedCodec::linear(50 * 1024);
        let out = encode_under_budget(&codec, &gradient(8, 8), 200 * 1024).unwrap();
        assert_eq!(out.quality.value(), 90);
        assert!(out.within_budget);
        assert_eq!(codec.attempts(), vec![90]);
    }

    #[test]
    fn first_fit_stops_at_first_quality_under_limit() {
        // q90 = 300K, q85 = 290K, ... q70 = 260K → limit 260K picks q70
        let codec = ScriptedCodec::linear(300 * 1024);
        let out = encode_under_budget(&codec, &gradient(8, 8), 260 * 1024).unwrap();
        assert_eq!(out.quality.value(), 70);
        assert_eq!(out.len(), 260 * 1024);
        assert_eq!(codec.attempts(), vec![90, 85, 80, 75, 70]);
    }

    #[test]
    fn limit_is_inclusive() {
        let codec = ScriptedCodec::new([(90, 1000)]);
        let out = encode_under_budget(&codec, &gradient(8, 8), 1000).unwrap();
        assert!(out.within_budget);
        assert_eq!(out.quality.value(), 90);
    }

    #[test]
    fn over_budget_returns_last_attempt() {
        let codec = ScriptedCodec::linear(900 * 1024);
        let out = encode_under_budget(&codec, &gradient(8, 8), 1024).unwrap();
        assert!(!out.within_budget);
        assert_eq!(out.quality.value(), 20);
        assert!(!out.is_empty());
        assert_eq!(codec.attempts(), QUALITY_LADDER.to_vec());
    }

    #[test]
    fn last_attempt_wins_even_if_not_smallest() {
        // The ladder is trusted, not checked for monotonic sizes
        let mut sizes: Vec<(u8, usize)> = QUALITY_LADDER.iter().map(|&q| (q, 5000)).collect();
        sizes[0].1 = 3000;
        let codec = ScriptedCodec::new(sizes);
        let out = encode_under_budget(&codec, &gradient(8, 8), 100).unwrap();
        assert_eq!(out.quality.value(), 20);
        assert_eq!(out.len(), 5000);
    }

    #[test]
    fn codec_failure_propagates() {
        let err = encode_under_budget(&FailingCodec, &gradient(8, 8), 1000).unwrap_err();
        assert!(matches!(err, ThumbnailError::Encode(_)));
    }

    #[test]
    fn mozjpeg_output_is_progressive_jpeg() {
        let bytes = MozJpeg.encode(&gradient(64, 48), Quality::new(85)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        // SOF2 marks a progressive DCT frame
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xC2]));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn mozjpeg_is_deterministic() {
        let img = gradient(120, 90);
        let a = MozJpeg.encode(&img, Quality::new(70)).unwrap();
        let b = MozJpeg.encode(&img, Quality::new(70)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mozjpeg_noise_cannot_meet_tiny_budget() {
        let out = encode_under_budget(&MozJpeg, &noise(320, 320, 7), 2048).unwrap();
        assert!(!out.within_budget);
        assert_eq!(out.quality.value(), 20);
        assert!(out.len() > 2048);
        assert_eq!((out.width, out.height), (320, 320));
    }
}
