use tabled::Tabled;

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{format_timestamp, parse_timestamp, render, truncate_with_ellipsis};
use crate::db::{Feed, FeedContent, Storage};

#[derive(Tabled)]
pub(crate) struct FeedDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Title")]
    pub(crate) title: String,
    #[tabled(rename = "URL")]
    pub(crate) url: String,
    #[tabled(rename = "Last update")]
    pub(crate) last_update: String,
}

impl From<&Feed> for FeedDisplay {
    fn from(feed: &Feed) -> Self {
        Self {
            id: feed.id.clone(),
            title: truncate_with_ellipsis(&feed.title, 40),
            url: truncate_with_ellipsis(&feed.url, 60),
            last_update: format_timestamp(feed.last_update.as_ref()),
        }
    }
}

/// Subscribe to a feed
pub async fn add_feed<S: Storage>(
    storage: &S,
    title: &str,
    url: &str,
    last_update: Option<&str>,
) -> CliResult<String> {
    let content = FeedContent {
        title: title.to_string(),
        url: url.to_string(),
        last_update: parse_timestamp(last_update)?,
    };
    let id = storage.add_feed(&content).await?;
    Ok(format!("Added feed {} ({})", id, title))
}

/// List all feeds
pub async fn list_feeds<S: Storage>(storage: &S, format: &str) -> CliResult<String> {
    let feeds = storage.get_feeds().await?;
    render::<_, FeedDisplay>(&feeds, format, "No feeds found.")
}

/// Show one feed, looked up by id or by exact title
pub async fn show_feed<S: Storage>(
    storage: &S,
    id: Option<&str>,
    title: Option<&str>,
    format: &str,
) -> CliResult<String> {
    let (feed, key) = match (id, title) {
        (Some(id), _) => (storage.get_feed_by_id(id).await?, id),
        (None, Some(title)) => (storage.get_feed_by_title(title).await?, title),
        (None, None) => {
            return Err(CliError::InvalidInput {
                message: "pass a feed id or --title".to_string(),
            });
        }
    };

    let feed = feed.ok_or_else(|| CliError::NotFound {
        entity_type: "Feed".to_string(),
        id: key.to_string(),
    })?;
    render::<_, FeedDisplay>(&[feed], format, "")
}

/// Unsubscribe from a feed, dropping its stories
pub async fn remove_feed<S: Storage>(storage: &S, id: &str) -> CliResult<String> {
    let feed = storage
        .get_feed_by_id(id)
        .await?
        .ok_or_else(|| CliError::NotFound {
            entity_type: "Feed".to_string(),
            id: id.to_string(),
        })?;
    let stories = storage.get_stories(id).await?.len();

    storage.remove_feed(id).await?;
    Ok(format!(
        "Removed feed {} ({}) and {} stories",
        feed.id, feed.title, stories
    ))
}
