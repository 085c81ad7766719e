//! Configuration-selected storage.
//!
//! [`AnyStorage`] wraps whichever backend the configuration chose and
//! forwards every contract call to it, so application code can hold one
//! concrete type without caring which engine is underneath.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::db::{
    BackendKind, DbResult, EmbeddedStorage, Feed, FeedContent, Id, RelationalStorage,
    Storage, StorageConfig, Story, StoryContent, StorySummary,
};

/// One of the storage backends, chosen at construction time.
pub enum AnyStorage {
    Relational(RelationalStorage),
    Embedded(EmbeddedStorage),
}

impl AnyStorage {
    /// Open the backend described by `config`.
    pub async fn open(config: &StorageConfig) -> DbResult<Self> {
        match config {
            StorageConfig::Relational { uri } => {
                Ok(AnyStorage::Relational(RelationalStorage::open(uri).await?))
            }
            StorageConfig::Embedded { path } => {
                Ok(AnyStorage::Embedded(EmbeddedStorage::open(path)?))
            }
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            AnyStorage::Relational(_) => BackendKind::Relational,
            AnyStorage::Embedded(_) => BackendKind::Embedded,
        }
    }
}

impl From<RelationalStorage> for AnyStorage {
    fn from(storage: RelationalStorage) -> Self {
        AnyStorage::Relational(storage)
    }
}

impl From<EmbeddedStorage> for AnyStorage {
    fn from(storage: EmbeddedStorage) -> Self {
        AnyStorage::Embedded(storage)
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            AnyStorage::Relational(s) => s.$method($($arg),*).await,
            AnyStorage::Embedded(s) => s.$method($($arg),*).await,
        }
    };
}

impl Storage for AnyStorage {
    async fn get_setting(&self, key: &str) -> DbResult<Value> {
        delegate!(self, get_setting(key))
    }

    async fn set_setting(&self, key: &str, value: &Value) -> DbResult<()> {
        delegate!(self, set_setting(key, value))
    }

    async fn get_settings(&self) -> DbResult<BTreeMap<String, Value>> {
        delegate!(self, get_settings())
    }

    async fn add_user(&self, username: &str, password: &str) -> DbResult<()> {
        delegate!(self, add_user(username, password))
    }

    async fn get_users(&self) -> DbResult<Vec<String>> {
        delegate!(self, get_users())
    }

    async fn remove_user(&self, username: &str) -> DbResult<()> {
        delegate!(self, remove_user(username))
    }

    async fn get_password(&self, username: &str) -> DbResult<Option<String>> {
        delegate!(self, get_password(username))
    }

    async fn set_password(&self, username: &str, password: &str) -> DbResult<()> {
        delegate!(self, set_password(username, password))
    }

    async fn add_feed(&self, content: &FeedContent) -> DbResult<Id> {
        delegate!(self, add_feed(content))
    }

    async fn get_feeds(&self) -> DbResult<Vec<Feed>> {
        delegate!(self, get_feeds())
    }

    async fn get_feed_by_title(&self, title: &str) -> DbResult<Option<Feed>> {
        delegate!(self, get_feed_by_title(title))
    }

    async fn get_feed_by_id(&self, feed_id: &str) -> DbResult<Option<Feed>> {
        delegate!(self, get_feed_by_id(feed_id))
    }

    async fn remove_feed(&self, feed_id: &str) -> DbResult<()> {
        delegate!(self, remove_feed(feed_id))
    }

    async fn add_story(&self, content: &StoryContent) -> DbResult<Id> {
        delegate!(self, add_story(content))
    }

    async fn remove_story(&self, story_id: &str) -> DbResult<()> {
        delegate!(self, remove_story(story_id))
    }

    async fn get_stories(&self, feed_id: &str) -> DbResult<Vec<Story>> {
        delegate!(self, get_stories(feed_id))
    }

    async fn get_story_by_id(&self, story_id: &str) -> DbResult<Option<Story>> {
        delegate!(self, get_story_by_id(story_id))
    }

    async fn update_story(
        &self,
        story_id: &str,
        content: &StoryContent,
    ) -> DbResult<Option<Story>> {
        delegate!(self, update_story(story_id, content))
    }

    async fn get_feed_unread(&self, feed_id: &str) -> DbResult<Vec<StorySummary>> {
        delegate!(self, get_feed_unread(feed_id))
    }
}
