//! HEIF-family containers (AVIF, HEIC).
//!
//! The `image` crate cannot read either: its `"avif"` feature only brings the
//! rav1e *encoder*. AVIF is decoded here with `avif-parse` (container) and
//! `rav1d` (pure Rust AV1 decoder) when the `avif` cargo feature is enabled.
//! HEIC carries an HEVC payload for which no codec is compiled in; it is
//! recognized so callers get [`DecodeError::CodecUnavailable`] instead of a
//! generic "unknown format".

use super::error::DecodeError;
use image::RgbImage;

/// Brands that identify an AV1 payload.
const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];

/// Brands that identify an HEVC (or generic HEIF) payload.
const HEIC_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// Which HEIF flavour a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeifKind {
    Avif,
    Heic,
}

impl HeifKind {
    pub fn name(self) -> &'static str {
        match self {
            HeifKind::Avif => "AVIF",
            HeifKind::Heic => "HEIC",
        }
    }
}

/// Inspect the leading `ftyp` box and classify the container.
///
/// Returns `None` for anything that is not an ISO-BMFF file with a HEIF
/// brand (including MP4/MOV video, which share the box layout).
pub fn sniff(bytes: &[u8]) -> Option<HeifKind> {
    if bytes.len() < 16 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    let declared = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = declared.clamp(16, bytes.len());

    // Major brand at 8..12, minor version at 12..16, compatible brands after.
    let brands: Vec<&[u8]> = std::iter::once(&bytes[8..12])
        .chain(bytes[16..end].chunks_exact(4))
        .collect();

    let has = |set: &[&[u8; 4]]| brands.iter().any(|b| set.iter().any(|s| &s[..] == *b));
    if has(AVIF_BRANDS) {
        Some(HeifKind::Avif)
    } else if has(HEIC_BRANDS) {
        Some(HeifKind::Heic)
    } else {
        None
    }
}

/// Decode a HEIF-family buffer that [`sniff`] already classified.
pub fn decode(kind: HeifKind, bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    match kind {
        HeifKind::Avif => decode_avif(bytes),
        HeifKind::Heic => Err(DecodeError::CodecUnavailable {
            format: kind.name().to_string(),
        }),
    }
}

#[cfg(not(feature = "avif"))]
fn decode_avif(_bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    Err(DecodeError::CodecUnavailable {
        format: HeifKind::Avif.name().to_string(),
    })
}

/// Decode an AVIF buffer: avif-parse pulls the primary item out of the
/// container, rav1d decodes the AV1 frame, and the YUV planes are converted
/// to RGB8.
#[cfg(feature = "avif")]
fn decode_avif(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib as dav1d;
    use std::ptr::NonNull;

    let fail = |reason: String| DecodeError::malformed("AVIF", reason);

    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(bytes))
        .map_err(|e| fail(format!("container: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;
    if av1_bytes.is_empty() {
        return Err(fail("empty primary item".into()));
    }

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe { dav1d::dav1d_default_settings(NonNull::from(&mut settings).cast()) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(fail(format!("rav1d open failed ({})", rc.0)));
    }

    let run = || -> Result<RgbImage, DecodeError> {
        let mut data = Dav1dData::default();
        let buf = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
        if buf.is_null() {
            return Err(fail("rav1d data_create failed".into()));
        }
        unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf, av1_bytes.len()) };

        let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut data)) };
        if rc.0 != 0 {
            unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut data)) };
            return Err(fail(format!("rav1d send_data failed ({})", rc.0)));
        }

        let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
        let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
        if rc.0 != 0 {
            return Err(fail(format!("rav1d get_picture failed ({})", rc.0)));
        }

        let layout = pic.p.layout;
        let subsampling = match layout {
            DAV1D_PIXEL_LAYOUT_I400 => Some((false, false)),
            DAV1D_PIXEL_LAYOUT_I420 => Some((true, true)),
            DAV1D_PIXEL_LAYOUT_I422 => Some((true, false)),
            DAV1D_PIXEL_LAYOUT_I444 => Some((false, false)),
            _ => None,
        };
        let monochrome = layout == DAV1D_PIXEL_LAYOUT_I400;
        let planes = (pic.data[0], pic.data[1], pic.data[2]);

        let frame = match (subsampling, planes) {
            (Some((ss_x, ss_y)), (Some(y), u, v)) if monochrome || (u.is_some() && v.is_some()) => {
                let y_ptr = y.as_ptr() as *const u8;
                Some(YuvFrame {
                    y: y_ptr,
                    u: u.map_or(y_ptr, |p| p.as_ptr() as *const u8),
                    v: v.map_or(y_ptr, |p| p.as_ptr() as *const u8),
                    y_stride: pic.stride[0],
                    uv_stride: if monochrome { 0 } else { pic.stride[1] },
                    width: pic.p.w as u32,
                    height: pic.p.h as u32,
                    bpc: pic.p.bpc as u32,
                    ss_x,
                    ss_y,
                    monochrome,
                })
            }
            _ => None,
        };

        let result = match frame {
            Some(frame) => {
                let rgb = unsafe { frame.to_rgb() };
                RgbImage::from_raw(frame.width, frame.height, rgb)
                    .ok_or_else(|| fail("decoded buffer size mismatch".into()))
            }
            None => Err(fail(format!("unsupported pixel layout {layout}"))),
        };

        unsafe { dav1d::dav1d_picture_unref(NonNull::new(&mut pic)) };
        result
    };

    let result = run();
    unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };
    result
}

/// Borrowed YUV planes of a decoded AV1 frame.
#[cfg(feature = "avif")]
struct YuvFrame {
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling, horizontal and vertical (I420 = true, true)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

#[cfg(feature = "avif")]
impl YuvFrame {
    /// Interleaved RGB8 using BT.601 coefficients.
    ///
    /// # Safety
    /// The plane pointers must be valid for `height` rows of their strides,
    /// i.e. the picture they came from must still be referenced.
    unsafe fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in 0..self.height {
            let c_row = if self.ss_y { row / 2 } else { row };
            for col in 0..self.width {
                let luma = unsafe { sample(self.y, self.y_stride, col, row, self.bpc) };
                if self.monochrome {
                    let v = (luma * scale).clamp(0.0, 255.0) as u8;
                    rgb.extend_from_slice(&[v, v, v]);
                    continue;
                }
                let c_col = if self.ss_x { col / 2 } else { col };
                let cb = unsafe { sample(self.u, self.uv_stride, c_col, c_row, self.bpc) } - center;
                let cr = unsafe { sample(self.v, self.uv_stride, c_col, c_row, self.bpc) } - center;

                let r = (luma + 1.402 * cr) * scale;
                let g = (luma - 0.344136 * cb - 0.714136 * cr) * scale;
                let b = (luma + 1.772 * cb) * scale;
                rgb.extend_from_slice(&[
                    r.clamp(0.0, 255.0) as u8,
                    g.clamp(0.0, 255.0) as u8,
                    b.clamp(0.0, 255.0) as u8,
                ]);
            }
        }
        rgb
    }
}

/// One plane sample; high bit depths are stored as native-endian u16.
#[cfg(feature = "avif")]
#[inline]
unsafe fn sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(offset) as *const u16).read_unaligned() }) as f32
    }
}
