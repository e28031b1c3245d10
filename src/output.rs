//! CLI output formatting.
//!
//! # Output Format
//!
//! ## thumb
//!
//! ```text
//! photos/dawn.jpg
//!     Thumbnail: photos/dawn-thumb.jpg
//!     320x180, q85, 41.2 KB
//! photos/noise.png
//!     Thumbnail: photos/noise-thumb.jpg
//!     320x320, q20, 233.0 KB (over 200 KB budget)
//! photos/phone.heic
//!     Failed: HEIC images are not supported by this build
//!
//! 2 thumbnails written, 1 failed
//! ```
//!
//! ## check-config
//!
//! ```text
//! Config: thumbrelay.toml
//!     Default style: yt
//!     Poster mode: off
//!     Poster limit: 5 MB
//!     Log level: info
//!     File API: https://api.telegram.org/file
//!     Threads: 8 (auto)
//! Config is valid
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::batch::{BatchError, ThumbReport};
use crate::config::{RelayConfig, effective_threads};
use crate::imaging::{THUMBNAIL_BUDGET_BYTES, ThumbnailError};
use serde_json::json;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `41234` → `40.3 KB`
fn format_kb(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

// ============================================================================
// thumb
// ============================================================================

pub fn format_thumb_result(result: &Result<ThumbReport, BatchError>) -> Vec<String> {
    match result {
        Ok(report) => {
            let mut detail = format!(
                "{}x{}, q{}, {}",
                report.width,
                report.height,
                report.quality,
                format_kb(report.bytes)
            );
            if !report.within_budget {
                detail.push_str(&format!(
                    " (over {} KB budget)",
                    THUMBNAIL_BUDGET_BYTES / 1024
                ));
            }
            vec![
                report.input.display().to_string(),
                format!("{}Thumbnail: {}", indent(1), report.output.display()),
                format!("{}{}", indent(1), detail),
            ]
        }
        Err(err) => vec![
            err.path().display().to_string(),
            format!("{}Failed: {}", indent(1), failure_reason(err)),
        ],
    }
}

/// The error without its path prefix.
fn failure_reason(err: &BatchError) -> String {
    match err {
        BatchError::Io { source, .. } => source.to_string(),
        BatchError::Thumbnail { source, .. } => source.to_string(),
    }
}

pub fn format_thumb_summary(results: &[Result<ThumbReport, BatchError>]) -> String {
    let failed = results.iter().filter(|r| r.is_err()).count();
    let written = results.len() - failed;
    let noun = if written == 1 { "thumbnail" } else { "thumbnails" };
    if failed == 0 {
        format!("{written} {noun} written")
    } else {
        format!("{written} {noun} written, {failed} failed")
    }
}

pub fn format_thumb_output(results: &[Result<ThumbReport, BatchError>]) -> Vec<String> {
    let mut lines: Vec<String> = results.iter().flat_map(format_thumb_result).collect();
    lines.push(String::new());
    lines.push(format_thumb_summary(results));
    lines
}

/// Machine-readable form of a batch, one object per input.
pub fn thumb_json(results: &[Result<ThumbReport, BatchError>]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = results
        .iter()
        .map(|result| match result {
            Ok(report) => json!({ "ok": true, "report": report }),
            Err(err) => json!({
                "ok": false,
                "input": err.path(),
                "kind": error_kind(err),
                "error": failure_reason(err),
            }),
        })
        .collect();
    serde_json::Value::Array(entries)
}

fn error_kind(err: &BatchError) -> &'static str {
    match err {
        BatchError::Io { .. } => "io",
        BatchError::Thumbnail {
            source: ThumbnailError::Decode(d),
            ..
        } if d.is_codec_unavailable() => "codec_unavailable",
        BatchError::Thumbnail {
            source: ThumbnailError::Decode(_),
            ..
        } => "decode",
        BatchError::Thumbnail {
            source: ThumbnailError::Encode(_),
            ..
        } => "encode",
    }
}

pub fn print_thumb_output(results: &[Result<ThumbReport, BatchError>]) {
    for line in format_thumb_output(results) {
        println!("{}", line);
    }
}

// ============================================================================
// check-config
// ============================================================================

pub fn format_config_check(path: &Path, config: &RelayConfig) -> Vec<String> {
    let threads = match config.processing.max_threads {
        Some(_) => effective_threads(&config.processing).to_string(),
        None => format!("{} (auto)", effective_threads(&config.processing)),
    };
    vec![
        format!("Config: {}", path.display()),
        format!("{}Default style: {}", indent(1), config.defaults.thumb_style),
        format!("{}Poster mode: {}", indent(1), on_off(config.defaults.poster_mode)),
        format!("{}Poster limit: {} MB", indent(1), config.limits.poster_max_mb),
        format!("{}Log level: {}", indent(1), config.logging.level),
        format!("{}File API: {}", indent(1), config.telegram.file_api_base),
        format!("{}Threads: {}", indent(1), threads),
        "Config is valid".to_string(),
    ]
}

pub fn print_config_check(path: &Path, config: &RelayConfig) {
    for line in format_config_check(path, config) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{DecodeError, Style};
    use std::path::PathBuf;

    fn report(bytes: usize, within_budget: bool) -> ThumbReport {
        ThumbReport {
            input: PathBuf::from("photos/dawn.jpg"),
            output: PathBuf::from("photos/dawn-thumb.jpg"),
            style: Style::Cover,
            width: 320,
            height: 180,
            quality: 85,
            bytes,
            within_budget,
        }
    }

    fn heic_failure() -> BatchError {
        BatchError::Thumbnail {
            path: PathBuf::from("photos/phone.heic"),
            source: ThumbnailError::Decode(DecodeError::CodecUnavailable {
                format: "HEIC".into(),
            }),
        }
    }

    #[test]
    fn format_kb_one_decimal() {
        assert_eq!(format_kb(1024), "1.0 KB");
        assert_eq!(format_kb(42_189), "41.2 KB");
    }

    #[test]
    fn success_lines() {
        let lines = format_thumb_result(&Ok(report(42_189, true)));
        assert_eq!(
            lines,
            vec![
                "photos/dawn.jpg",
                "    Thumbnail: photos/dawn-thumb.jpg",
                "    320x180, q85, 41.2 KB",
            ]
        );
    }

    #[test]
    fn over_budget_is_flagged() {
        let lines = format_thumb_result(&Ok(report(238_592, false)));
        assert_eq!(lines[2], "    320x180, q85, 233.0 KB (over 200 KB budget)");
    }

    #[test]
    fn failure_lines_omit_duplicate_path() {
        let lines = format_thumb_result(&Err(heic_failure()));
        assert_eq!(lines[0], "photos/phone.heic");
        assert!(lines[1].starts_with("    Failed: "));
        assert!(!lines[1].contains("phone.heic"));
    }

    #[test]
    fn summary_counts() {
        let results = vec![Ok(report(10, true)), Err(heic_failure())];
        assert_eq!(format_thumb_summary(&results), "1 thumbnail written, 1 failed");
        assert_eq!(
            format_thumb_summary(&[Ok(report(10, true)), Ok(report(10, true))]),
            "2 thumbnails written"
        );
    }

    #[test]
    fn output_ends_with_blank_then_summary() {
        let lines = format_thumb_output(&[Ok(report(10, true))]);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "1 thumbnail written");
    }

    #[test]
    fn json_entries() {
        let value = thumb_json(&[Ok(report(10, true)), Err(heic_failure())]);
        assert_eq!(value[0]["ok"], true);
        assert_eq!(value[0]["report"]["style"], "yt");
        assert_eq!(value[0]["report"]["bytes"], 10);
        assert_eq!(value[1]["ok"], false);
        assert_eq!(value[1]["kind"], "codec_unavailable");
        assert_eq!(value[1]["input"], "photos/phone.heic");
    }

    #[test]
    fn config_check_lines() {
        let config = RelayConfig::default();
        let lines = format_config_check(Path::new("thumbrelay.toml"), &config);
        assert_eq!(lines[0], "Config: thumbrelay.toml");
        assert_eq!(lines[1], "    Default style: yt");
        assert_eq!(lines[2], "    Poster mode: off");
        assert_eq!(lines[3], "    Poster limit: 5 MB");
        assert!(lines[6].ends_with("(auto)"));
        assert_eq!(lines.last().unwrap(), "Config is valid");
    }
}
