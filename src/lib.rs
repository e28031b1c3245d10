//! # thumbrelay
//!
//! Telegram-compatible thumbnails, and a relay that re-sends large videos and
//! documents with a custom thumbnail attached.
//!
//! Telegram only accepts a custom thumbnail if it is a JPEG of at most
//! 200 KiB whose sides are at most 320 px. Given any common image (JPEG,
//! PNG, WebP, GIF, BMP, TIFF, AVIF), [`imaging::prepare_thumbnail`] produces
//! exactly that:
//!
//! ```text
//! bytes ──load──▶ RGB raster ──compose(style)──▶ 320×180 / 320×320 / ≤320 ──encode──▶ JPEG ≤ 200 KiB
//!         EXIF orientation       cover / fit / square / auto            quality ladder 90 → 20
//!         first frame only
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode, frame, sharpen and encode a thumbnail under the byte budget |
//! | [`store`] | Per-user settings, poster and thumbnail behind the [`store::UserStore`] trait |
//! | [`relay`] | Chat commands, thumbnail intake and media relay by URL |
//! | [`batch`] | Parallel thumbnail generation for local files (`thumb` command) |
//! | [`config`] | `thumbrelay.toml` loading, merging over defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Crop Before Resize
//!
//! Cover and square framing crop the source to the target aspect first and
//! resize second. Resizing first ("scale to cover, then crop") needs an
//! intermediate proportional to the source's extreme side; for a 1×10000
//! strip that is a 320×3200000 raster. Cropping first keeps every
//! intermediate at most the source size.
//!
//! ## Budget Search, Not Bisection
//!
//! The encoder walks a fixed ladder (90, 85, … 20) and stops at the first
//! quality that fits. The ladder is short and typical inputs fit at the
//! first or second step, so the search is cheap and its result predictable.
//! An input that never fits still yields a thumbnail, flagged with
//! `within_budget = false`, and the relay declines to attach it.
//!
//! ## Media Never Touches This Process
//!
//! Videos and documents can be gigabytes. The relay re-sends them by their
//! Bot API file URL; only the (≤ 5 MB by default) poster image is ever
//! downloaded.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod relay;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
