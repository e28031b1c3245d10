//! Offline thumbnail generation for local files.
//!
//! Backs the `thumb` CLI command: each input file goes through the same
//! pipeline the relay uses and lands next to it (or in `--out-dir`) as
//! `<stem>-thumb.jpg`.
//!
//! ```text
//! photos/
//! ├── dawn.heic        → dawn-thumb.jpg       (fails: HEIC codec unavailable)
//! ├── dawn.jpg         → dawn-thumb.jpg
//! └── poster.png       → poster-thumb.jpg
//! ```
//!
//! Files are processed in parallel with [rayon](https://docs.rs/rayon). One
//! failing file does not stop the batch; every input gets its own result, in
//! input order.

use crate::imaging::{JpegCodec, Style, ThumbnailError, prepare_thumbnail_with};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Thumbnail {
        path: PathBuf,
        source: ThumbnailError,
    },
}

impl BatchError {
    pub fn path(&self) -> &Path {
        match self {
            BatchError::Io { path, .. } | BatchError::Thumbnail { path, .. } => path,
        }
    }
}

/// What was written for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub style: Style,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub bytes: usize,
    pub within_budget: bool,
}

/// `photos/dawn.jpg` → `<out_dir or photos>/dawn-thumb.jpg`
pub fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("{stem}-thumb.jpg"))
}

/// Generate a thumbnail for every input. Results keep input order.
pub fn thumb_files(
    codec: &impl JpegCodec,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    style: Style,
) -> Vec<Result<ThumbReport, BatchError>> {
    inputs
        .par_iter()
        .map(|input| thumb_file(codec, input, out_dir, style))
        .collect()
}

fn thumb_file(
    codec: &impl JpegCodec,
    input: &Path,
    out_dir: Option<&Path>,
    style: Style,
) -> Result<ThumbReport, BatchError> {
    let bytes = std::fs::read(input).map_err(io_err(input))?;
    let thumb =
        prepare_thumbnail_with(codec, &bytes, style).map_err(|source| BatchError::Thumbnail {
            path: input.to_path_buf(),
            source,
        })?;

    let output = output_path(input, out_dir);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    std::fs::write(&output, &thumb.bytes).map_err(io_err(&output))?;
    log::debug!(
        "{} -> {} ({} bytes, q{})",
        input.display(),
        output.display(),
        thumb.len(),
        thumb.quality.value()
    );

    Ok(ThumbReport {
        input: input.to_path_buf(),
        output,
        style,
        width: thumb.width,
        height: thumb.height,
        quality: thumb.quality.value(),
        bytes: thumb.len(),
        within_budget: thumb.within_budget,
    })
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BatchError {
    let path = path.to_path_buf();
    move |source| BatchError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{DecodeError, MozJpeg, THUMBNAIL_BUDGET_BYTES};
    use crate::test_helpers::{heic_stub_bytes, jpeg_bytes, png_rgba_bytes};
    use tempfile::TempDir;

    #[test]
    fn output_path_next_to_input() {
        assert_eq!(
            output_path(Path::new("photos/dawn.jpg"), None),
            PathBuf::from("photos/dawn-thumb.jpg")
        );
        assert_eq!(
            output_path(Path::new("dawn.jpg"), None),
            PathBuf::from("dawn-thumb.jpg")
        );
    }

    #[test]
    fn output_path_in_out_dir() {
        assert_eq!(
            output_path(Path::new("photos/dawn.jpg"), Some(Path::new("thumbs"))),
            PathBuf::from("thumbs/dawn-thumb.jpg")
        );
    }

    #[test]
    fn batch_writes_thumbnails_and_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.jpg");
        let b = tmp.path().join("b.png");
        std::fs::write(&a, jpeg_bytes(640, 480)).unwrap();
        std::fs::write(&b, png_rgba_bytes(300, 600)).unwrap();
        let out_dir = tmp.path().join("out");

        let results = thumb_files(
            &MozJpeg,
            &[a.clone(), b.clone()],
            Some(&out_dir),
            Style::Square,
        );

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.input, a);
        assert_eq!(first.output, out_dir.join("a-thumb.jpg"));
        assert_eq!((first.width, first.height), (320, 320));
        assert!(first.bytes <= THUMBNAIL_BUDGET_BYTES);

        let written = std::fs::read(&first.output).unwrap();
        assert_eq!(written.len(), first.bytes);
        assert_eq!(&written[..2], &[0xFF, 0xD8]);

        assert_eq!(results[1].as_ref().unwrap().input, b);
    }

    #[test]
    fn failures_do_not_stop_batch() {
        let tmp = TempDir::new().unwrap();
        let heic = tmp.path().join("phone.heic");
        let missing = tmp.path().join("missing.jpg");
        let good = tmp.path().join("good.jpg");
        std::fs::write(&heic, heic_stub_bytes()).unwrap();
        std::fs::write(&good, jpeg_bytes(100, 100)).unwrap();

        let results = thumb_files(
            &MozJpeg,
            &[heic.clone(), missing.clone(), good],
            None,
            Style::Cover,
        );

        match &results[0] {
            Err(BatchError::Thumbnail {
                path,
                source: ThumbnailError::Decode(DecodeError::CodecUnavailable { .. }),
            }) => assert_eq!(path, &heic),
            other => panic!("expected codec unavailable, got {other:?}"),
        }
        match &results[1] {
            Err(err @ BatchError::Io { .. }) => assert_eq!(err.path(), missing),
            other => panic!("expected io error, got {other:?}"),
        }
        assert!(results[2].is_ok());
        assert!(tmp.path().join("good-thumb.jpg").exists());
    }
}
