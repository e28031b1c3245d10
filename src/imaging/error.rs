//! Error types for the thumbnail pipeline.
//!
//! Only decode failures are expected in practice. A missed byte budget is not
//! an error: it is reported through
//! [`EncodedThumbnail::within_budget`](super::encoder::EncodedThumbnail).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes are not a recognized image container.
    #[error("unrecognized image format")]
    UnknownFormat,
    /// The container was recognized but the stream is malformed or truncated.
    #[error("failed to decode {format} image: {reason}")]
    Malformed { format: String, reason: String },
    /// The container was recognized but its codec is not compiled in.
    #[error("{format} images are not supported by this build")]
    CodecUnavailable { format: String },
}

impl DecodeError {
    pub(crate) fn malformed(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the failure is a missing codec rather than bad input.
    pub fn is_codec_unavailable(&self) -> bool {
        matches!(self, Self::CodecUnavailable { .. })
    }
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The JPEG codec itself failed. A budget miss never lands here.
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}
