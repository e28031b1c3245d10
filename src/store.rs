//! Per-user record store.
//!
//! The relay keeps one [`UserRecord`] per chat user: their settings, whether
//! they are mid-`/setthumb`, and the stored poster and thumbnail. The store
//! is injected as a [`UserStore`] so the backing can be swapped (an in-memory
//! map in production today, test doubles in tests) without touching relay
//! logic.
//!
//! Every write replaces a user's whole record. There are no partial-field
//! updates, so two handlers racing on the same user cannot interleave field
//! writes; the later `set` wins.

use crate::imaging::{EncodedThumbnail, Style};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Chat user identifier.
pub type UserId = i64;

/// User-selectable preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSettings {
    /// Send the full-size poster before each relayed media message.
    pub poster_mode: bool,
    pub thumb_style: Style,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            poster_mode: false,
            thumb_style: Style::Cover,
        }
    }
}

/// Everything stored for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub settings: UserSettings,
    /// Set by `/setthumb`; the next image becomes the poster/thumbnail.
    pub awaiting_thumbnail: bool,
    /// Original image bytes, unmodified.
    pub poster: Option<Vec<u8>>,
    /// Compressed thumbnail derived from the poster.
    pub thumbnail: Option<EncodedThumbnail>,
}

impl UserRecord {
    pub fn with_settings(settings: UserSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}

/// Key-value store of user records with whole-record replace semantics.
pub trait UserStore: Send + Sync {
    fn get(&self, user: UserId) -> Option<UserRecord>;

    /// Replace the user's record.
    fn set(&self, user: UserId, record: UserRecord);

    /// Remove and return the user's record.
    fn delete(&self, user: UserId) -> Option<UserRecord>;
}

/// Process-local store. Records are lost on restart.
///
/// Nothing evicts records: every user who ever stored a poster keeps it (up
/// to `limits.poster_max_mb`) in memory until `delete` or process exit. A
/// long-running deployment with many users should back [`UserStore`] with
/// something that can spill to disk or expire entries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<UserId, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written record
    // (writes are single inserts), so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, UserRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserStore for MemoryStore {
    fn get(&self, user: UserId) -> Option<UserRecord> {
        self.lock().get(&user).cloned()
    }

    fn set(&self, user: UserId, record: UserRecord) {
        self.lock().insert(user, record);
    }

    fn delete(&self, user: UserId) -> Option<UserRecord> {
        self.lock().remove(&user)
    }
}
