//! Chat glue around the thumbnail pipeline.
//!
//! [`Relay`] turns one incoming chat event into the messages the bot should
//! send back. It owns no transport: the caller delivers [`Incoming`] events
//! (from a webhook or a polling loop) and sends the returned [`Outgoing`]
//! messages. Large media is never downloaded; it is re-sent by URL and the
//! Bot API fetches it server-side. Only images offered as a new
//! thumbnail/poster are fetched, through the injected [`FileFetcher`].
//!
//! ## Commands
//!
//! | Command | Effect |
//! |---|---|
//! | `/start` | Help text with current style and poster mode |
//! | `/setthumb` | Next photo or image document becomes poster + thumbnail |
//! | `/showthumb` | Echo stored poster and thumbnail |
//! | `/clearthumb` | Drop stored poster and thumbnail |
//! | `/poster` | Toggle poster mode |
//! | `/style [token]` | Show or set the thumbnail style (strictly validated) |

use crate::config::RelayConfig;
use crate::imaging::{
    MozJpeg, STYLE_TOKENS, Style, THUMBNAIL_BUDGET_BYTES, ThumbnailError, prepare_thumbnail_with,
};
use crate::store::{UserId, UserRecord, UserStore};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("failed to fetch {path}: {reason}")]
pub struct FetchError {
    pub path: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
}

/// Downloads a file by its Bot API `file_path`.
pub trait FileFetcher: Send + Sync {
    fn fetch(&self, file_path: &str) -> Result<Vec<u8>, FetchError>;
}

/// A file attached to an incoming message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    /// Bot API `file_path`, used for both fetching and relaying by URL.
    pub file_path: String,
    /// Size declared by the Bot API, if any.
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
}

impl Attachment {
    fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }
}

/// One incoming chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    /// Largest size of a Telegram photo.
    Photo(Attachment),
    Video(Attachment),
    Document(Attachment),
}

/// A message the bot should send in reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    Photo {
        bytes: Vec<u8>,
        filename: &'static str,
        caption: Option<String>,
    },
    Video {
        url: String,
        caption: String,
        thumbnail: Option<Vec<u8>>,
        supports_streaming: bool,
    },
    Document {
        url: String,
        caption: String,
        thumbnail: Option<Vec<u8>>,
    },
}

/// Recognized bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    SetThumb,
    ShowThumb,
    ClearThumb,
    Poster,
    /// `/style` with its raw argument, if any.
    Style(Option<String>),
}

impl Command {
    /// Parse `/name[@bot] [args]`. Returns `None` for plain text and
    /// unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        match name.as_str() {
            "start" => Some(Command::Start),
            "setthumb" => Some(Command::SetThumb),
            "showthumb" => Some(Command::ShowThumb),
            "clearthumb" => Some(Command::ClearThumb),
            "poster" => Some(Command::Poster),
            "style" => Some(Command::Style(
                (!args.is_empty()).then(|| args.to_string()),
            )),
            _ => None,
        }
    }
}

/// Which kind of message carried a new thumbnail image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageSource {
    Photo,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Video,
    Document,
}

/// Build the Bot API download URL for a file.
pub fn file_url(api_base: &str, bot_token: &str, file_path: &str) -> String {
    format!(
        "{}/bot{}/{}",
        api_base.trim_end_matches('/'),
        bot_token,
        file_path.trim_start_matches('/')
    )
}

/// Transport-agnostic bot logic over an injected store and fetcher.
pub struct Relay<S, F> {
    store: S,
    fetcher: F,
    config: RelayConfig,
    bot_token: String,
}

impl<S: UserStore, F: FileFetcher> Relay<S, F> {
    pub fn new(store: S, fetcher: F, config: RelayConfig, bot_token: impl Into<String>) -> Self {
        Self {
            store,
            fetcher,
            config,
            bot_token: bot_token.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one event from `user`.
    pub fn handle(&self, user: UserId, incoming: Incoming) -> Result<Vec<Outgoing>, RelayError> {
        match incoming {
            Incoming::Text(text) => Ok(Command::parse(&text)
                .map(|cmd| self.command(user, cmd))
                .unwrap_or_default()),
            Incoming::Photo(photo) => {
                if self.record(user).awaiting_thumbnail {
                    self.take_thumbnail(user, &photo, ImageSource::Photo)
                } else {
                    Ok(Vec::new())
                }
            }
            Incoming::Document(doc) => {
                if doc.is_image() && self.record(user).awaiting_thumbnail {
                    self.take_thumbnail(user, &doc, ImageSource::Document)
                } else {
                    Ok(self.relay_media(user, doc, MediaKind::Document))
                }
            }
            Incoming::Video(video) => Ok(self.relay_media(user, video, MediaKind::Video)),
        }
    }

    /// Current record, or a fresh one with configured defaults.
    fn record(&self, user: UserId) -> UserRecord {
        self.store
            .get(user)
            .unwrap_or_else(|| UserRecord::with_settings(self.config.default_user_settings()))
    }

    fn poster_limit_mb(&self) -> u64 {
        self.config.limits.poster_max_mb
    }

    fn command(&self, user: UserId, command: Command) -> Vec<Outgoing> {
        let mut record = self.record(user);
        let reply = match command {
            Command::Start => {
                let s = record.settings;
                format!(
                    "Hi! I re-send your videos and documents with a custom thumbnail attached.\n\
                     Large files are copied server-side, never downloaded.\n\n\
                     Commands:\n\
                     /setthumb - set the thumbnail/poster (photo or image document)\n\
                     /showthumb - show the current thumbnail/poster\n\
                     /clearthumb - remove the thumbnail/poster\n\
                     /poster - toggle poster mode (full-size photo up to {} MB)\n\
                     /style yt | yt_fit | square | auto - choose the thumbnail style\n\n\
                     Current style: {} | Poster mode: {}\n\
                     Attached thumbnails are JPEG, at most 200 KB, sides at most 320 px.",
                    self.poster_limit_mb(),
                    s.thumb_style,
                    on_off(s.poster_mode),
                )
            }
            Command::SetThumb => {
                record.awaiting_thumbnail = true;
                let style = record.settings.thumb_style;
                self.store.set(user, record);
                format!(
                    "Send an image now:\n\
                     - as a photo (Telegram recompresses it), or\n\
                     - as a document (original quality, recommended)\n\n\
                     Poster limit: {} MB.\n\
                     Style: {style} (change with /style).",
                    self.poster_limit_mb()
                )
            }
            Command::ShowThumb => return self.show(record),
            Command::ClearThumb => {
                record.poster = None;
                record.thumbnail = None;
                self.store.set(user, record);
                "Thumbnail and poster cleared.".to_string()
            }
            Command::Poster => {
                record.settings.poster_mode = !record.settings.poster_mode;
                let state = on_off(record.settings.poster_mode);
                self.store.set(user, record);
                format!("Poster mode: {state}")
            }
            Command::Style(None) => format!(
                "Current style: {}\nAvailable: yt (default), yt_fit, square, auto\nUsage: /style yt",
                record.settings.thumb_style
            ),
            Command::Style(Some(token)) => match Style::parse_strict(&token) {
                Some(style) => {
                    record.settings.thumb_style = style;
                    self.store.set(user, record);
                    format!("Style set: {style}")
                }
                None => format!("Invalid style. Use: /style {}", canonical_tokens()),
            },
        };
        vec![Outgoing::Text(reply)]
    }

    fn show(&self, record: UserRecord) -> Vec<Outgoing> {
        let style = record.settings.thumb_style;
        let mut out = Vec::new();
        if let Some(poster) = record.poster {
            out.push(Outgoing::Photo {
                bytes: poster,
                filename: "poster.jpg",
                caption: Some(format!(
                    "Poster (original, up to {} MB)",
                    self.poster_limit_mb()
                )),
            });
        }
        if let Some(thumb) = record.thumbnail {
            out.push(Outgoing::Photo {
                bytes: thumb.bytes,
                filename: "thumb.jpg",
                caption: Some(format!(
                    "Compressed thumbnail ({}x{}, q{}), style: {style}. This is what gets attached.",
                    thumb.width,
                    thumb.height,
                    thumb.quality.value()
                )),
            });
        }
        if out.is_empty() {
            out.push(Outgoing::Text(
                "No thumbnail set yet. Use /setthumb.".to_string(),
            ));
        }
        out
    }

    fn take_thumbnail(
        &self,
        user: UserId,
        attachment: &Attachment,
        source: ImageSource,
    ) -> Result<Vec<Outgoing>, RelayError> {
        let mut record = self.record(user);
        let limit = self.config.poster_max_bytes();

        if attachment.file_size.is_some_and(|size| size > limit) {
            return Ok(vec![self.reject_oversized(user, record, source)]);
        }

        let bytes = self.fetcher.fetch(&attachment.file_path)?;
        if bytes.len() as u64 > limit {
            return Ok(vec![self.reject_oversized(user, record, source)]);
        }

        let thumb = match prepare_thumbnail_with(&MozJpeg, &bytes, record.settings.thumb_style) {
            Ok(thumb) => thumb,
            Err(ThumbnailError::Decode(err)) => {
                log::warn!("user {user}: rejected thumbnail image: {err}");
                return Ok(vec![Outgoing::Text(format!(
                    "Unsupported or corrupt image ({err}). Please send another image."
                ))]);
            }
            Err(err) => return Err(err.into()),
        };

        log::info!(
            "user {user}: stored {}-byte poster and {}x{} thumbnail ({} bytes, q{})",
            bytes.len(),
            thumb.width,
            thumb.height,
            thumb.len(),
            thumb.quality.value()
        );
        let over_budget = !thumb.within_budget;
        record.poster = Some(bytes);
        record.thumbnail = Some(thumb);
        record.awaiting_thumbnail = false;
        self.store.set(user, record);

        let mut reply = match source {
            ImageSource::Photo => "Thumbnail/poster set.".to_string(),
            ImageSource::Document => "Thumbnail/poster set (from document).".to_string(),
        };
        if over_budget {
            reply.push_str(&format!(
                "\nWarning: the thumbnail could not be brought under {} KB, so it will not be attached. \
                 Try a simpler image or another style.",
                THUMBNAIL_BUDGET_BYTES / 1024
            ));
        }
        Ok(vec![Outgoing::Text(reply)])
    }

    fn reject_oversized(&self, user: UserId, mut record: UserRecord, source: ImageSource) -> Outgoing {
        let mb = self.poster_limit_mb();
        match source {
            // A photo may be retried as a document, so keep waiting.
            ImageSource::Photo => Outgoing::Text(format!(
                "Image is too large. Please send an image up to {mb} MB (as a document)."
            )),
            ImageSource::Document => {
                record.awaiting_thumbnail = false;
                self.store.set(user, record);
                Outgoing::Text(format!(
                    "Image is too large. Please send an image up to {mb} MB."
                ))
            }
        }
    }

    fn relay_media(&self, user: UserId, media: Attachment, kind: MediaKind) -> Vec<Outgoing> {
        let record = self.record(user);
        let url = file_url(
            &self.config.telegram.file_api_base,
            &self.bot_token,
            &media.file_path,
        );
        let mut out = Vec::new();

        if record.settings.poster_mode {
            if let Some(poster) = record.poster {
                out.push(Outgoing::Photo {
                    bytes: poster,
                    filename: "poster.jpg",
                    caption: None,
                });
            }
        }

        let thumbnail = match record.thumbnail {
            Some(thumb) if thumb.within_budget => Some(thumb.bytes),
            Some(thumb) => {
                log::warn!(
                    "user {user}: stored thumbnail is {} bytes, over the {THUMBNAIL_BUDGET_BYTES} byte limit; relaying without it",
                    thumb.len()
                );
                None
            }
            None => None,
        };

        let caption = media.caption.unwrap_or_default();
        out.push(match kind {
            MediaKind::Video => Outgoing::Video {
                url,
                caption,
                thumbnail,
                supports_streaming: true,
            },
            MediaKind::Document => Outgoing::Document {
                url,
                caption,
                thumbnail,
            },
        });
        out.push(Outgoing::Text(
            "Done. Thumbnail updated (server-side).".to_string(),
        ));
        out
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

/// `yt | yt_fit | square | auto`
fn canonical_tokens() -> String {
    STYLE_TOKENS
        .iter()
        .filter(|t| Style::parse_strict(t).is_some_and(|s| s.token() == **t))
        .copied()
        .collect::<Vec<_>>()
        .join(" | ")
}
