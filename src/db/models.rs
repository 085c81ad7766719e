//! Domain models for the feed store.
//!
//! These models are storage-agnostic. Every backend returns owned copies of
//! them, so mutating a returned record never touches persisted state until
//! it is written back through the [`Storage`](crate::db::Storage) contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier minted by the backend.
///
/// Callers must only compare identifiers for equality; the textual form is
/// whatever the backend chose to hand out.
pub type Id = String;

/// Timestamp carried by feeds and stories.
pub type Timestamp = DateTime<Utc>;

/// A reader account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    /// Stored verbatim; hashing happens before it reaches storage.
    pub password: String,
}

/// A subscribed feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: Id,
    pub title: String,
    pub url: String,
    pub last_update: Option<Timestamp>,
}

/// Everything needed to create a feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedContent {
    pub title: String,
    pub url: String,
    pub last_update: Option<Timestamp>,
}

impl Feed {
    /// Split a feed into its content, dropping the identifier.
    pub fn content(&self) -> FeedContent {
        FeedContent {
            title: self.title.clone(),
            url: self.url.clone(),
            last_update: self.last_update,
        }
    }
}

/// A single item of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: Id,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published: Option<Timestamp>,
    pub last_update: Option<Timestamp>,
    pub read: bool,
    pub feed_id: Id,
}

/// Everything needed to create or fully replace a story.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoryContent {
    pub title: String,
    pub url: String,
    pub description: String,
    pub published: Option<Timestamp>,
    pub last_update: Option<Timestamp>,
    /// New stories are unread unless the caller says otherwise.
    #[serde(default)]
    pub read: bool,
    pub feed_id: Id,
}

impl Story {
    /// Split a story into its content, dropping the identifier.
    pub fn content(&self) -> StoryContent {
        StoryContent {
            title: self.title.clone(),
            url: self.url.clone(),
            description: self.description.clone(),
            published: self.published,
            last_update: self.last_update,
            read: self.read,
            feed_id: self.feed_id.clone(),
        }
    }

    /// Project the story onto the fields listed by unread queries.
    pub fn summary(&self) -> StorySummary {
        StorySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            last_update: self.last_update,
        }
    }
}

/// Compact view of a story returned by [`Storage::get_feed_unread`].
///
/// [`Storage::get_feed_unread`]: crate::db::Storage::get_feed_unread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySummary {
    pub id: Id,
    pub title: String,
    pub url: String,
    pub last_update: Option<Timestamp>,
}

/// An application setting.
///
/// The value has no fixed schema. Decode it where it is used, e.g. with
/// `serde_json::from_value::<MyType>(setting.value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}
