//! The storage contract.
//!
//! Every backend implements [`Storage`] with identical observable
//! behavior. Callers never learn which engine is underneath.
//!
//! Conventions shared by all implementations:
//!
//! - Identifiers are opaque strings. An identifier that names nothing is
//!   simply not found, whatever its shape.
//! - Not-found is routine: lookups return `None`, listings return empty
//!   collections, removals of absent entities are no-ops.
//! - Each call is its own atomic unit and commits before returning.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::db::{
    DbResult,
    models::{Feed, FeedContent, Id, Story, StoryContent, StorySummary},
};

/// Persistence contract for users, feeds, stories and settings.
#[allow(async_fn_in_trait)]
pub trait Storage: Send + Sync {
    // --- settings ---

    /// Get a setting value.
    ///
    /// Returns an empty sequence (`Value::Array(vec![])`) when the key has
    /// never been set.
    async fn get_setting(&self, key: &str) -> DbResult<Value>;

    /// Create or overwrite a setting. At most one value is kept per key.
    async fn set_setting(&self, key: &str, value: &Value) -> DbResult<()>;

    /// Get every setting as a key to value map.
    async fn get_settings(&self) -> DbResult<BTreeMap<String, Value>>;

    // --- users ---

    /// Create a user. Fails with `AlreadyExists` if the username is taken.
    async fn add_user(&self, username: &str, password: &str) -> DbResult<()>;

    /// List usernames in creation order.
    async fn get_users(&self) -> DbResult<Vec<String>>;

    /// Delete a user. Absent users are ignored.
    async fn remove_user(&self, username: &str) -> DbResult<()>;

    /// Get the stored password for a user.
    async fn get_password(&self, username: &str) -> DbResult<Option<String>>;

    /// Replace the stored password. Absent users are ignored.
    async fn set_password(&self, username: &str, password: &str) -> DbResult<()>;

    // --- feeds ---

    /// Create a feed and return its new identifier.
    async fn add_feed(&self, content: &FeedContent) -> DbResult<Id>;

    /// List feeds in creation order.
    async fn get_feeds(&self) -> DbResult<Vec<Feed>>;

    /// Find a feed by exact title.
    async fn get_feed_by_title(&self, title: &str) -> DbResult<Option<Feed>>;

    /// Find a feed by identifier.
    async fn get_feed_by_id(&self, feed_id: &str) -> DbResult<Option<Feed>>;

    /// Delete a feed together with all of its stories.
    async fn remove_feed(&self, feed_id: &str) -> DbResult<()>;

    // --- stories ---

    /// Create a story and return its new identifier.
    ///
    /// The referenced feed must exist; otherwise this fails with
    /// `Constraint`.
    async fn add_story(&self, content: &StoryContent) -> DbResult<Id>;

    /// Delete a single story. Absent stories are ignored.
    async fn remove_story(&self, story_id: &str) -> DbResult<()>;

    /// List the stories of a feed in creation order.
    async fn get_stories(&self, feed_id: &str) -> DbResult<Vec<Story>>;

    /// Find a story by identifier.
    async fn get_story_by_id(&self, story_id: &str) -> DbResult<Option<Story>>;

    /// Replace every field of a story.
    ///
    /// Returns the stored record, or `None` if no such story exists.
    async fn update_story(&self, story_id: &str, content: &StoryContent)
    -> DbResult<Option<Story>>;

    /// List unread stories of a feed in creation order.
    async fn get_feed_unread(&self, feed_id: &str) -> DbResult<Vec<StorySummary>>;
}
