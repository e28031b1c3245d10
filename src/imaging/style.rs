//! Thumbnail style tokens.
//!
//! Users type these in chat, so matching is case-insensitive and aliases
//! collapse to one canonical value:
//!
//! | Token(s) | Style |
//! |---|---|
//! | `yt` (also `cover`) | [`Style::Cover`] |
//! | `yt_fit`, `ytfit`, `yt-fit` (also `fit`) | [`Style::Fit`] |
//! | `square` | [`Style::Square`] |
//! | `auto`, anything else | [`Style::Auto`] |
//!
//! [`Style::from_token`] is total: an unknown token is `Auto`, never an error.
//! The bare compositor names `cover` and `fit` are accepted there too.
//! [`Style::parse_strict`] is for callers (the `/style` command, config
//! validation) that want to reject typos instead; it knows only the chat
//! tokens listed in [`STYLE_TOKENS`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Style {
    /// 16:9 crop-and-fill.
    #[default]
    Cover,
    /// 16:9 letterbox over a blurred backdrop.
    Fit,
    /// 1:1 crop-and-fill.
    Square,
    /// Shrink to fit within 320x320.
    Auto,
}

/// Every token the strict parser accepts.
pub const STYLE_TOKENS: &[&str] = &["yt", "yt_fit", "ytfit", "yt-fit", "square", "auto"];

impl Style {
    /// Normalize a free-form token. Unknown tokens fall back to `Auto`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "cover" => Style::Cover,
            "fit" => Style::Fit,
            other => Self::parse_strict(other).unwrap_or(Style::Auto),
        }
    }

    /// Normalize a token, returning `None` for anything unrecognized.
    pub fn parse_strict(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "yt" => Some(Style::Cover),
            "yt_fit" | "ytfit" | "yt-fit" => Some(Style::Fit),
            "square" => Some(Style::Square),
            "auto" => Some(Style::Auto),
            _ => None,
        }
    }

    /// Canonical token, as stored in settings and shown to users.
    pub fn token(self) -> &'static str {
        match self {
            Style::Cover => "yt",
            Style::Fit => "yt_fit",
            Style::Square => "square",
            Style::Auto => "auto",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for Style {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Style::parse_strict(&token).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown thumbnail style '{token}', expected one of: {}",
                STYLE_TOKENS.join(", ")
            ))
        })
    }
}
