use tabled::Tabled;

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{format_timestamp, parse_timestamp, render, truncate_with_ellipsis};
use crate::db::{Storage, Story, StoryContent, StorySummary};

#[derive(Tabled)]
pub(crate) struct StoryDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Title")]
    pub(crate) title: String,
    #[tabled(rename = "Published")]
    pub(crate) published: String,
    #[tabled(rename = "Read")]
    pub(crate) read: String,
}

impl From<&Story> for StoryDisplay {
    fn from(story: &Story) -> Self {
        Self {
            id: story.id.clone(),
            title: truncate_with_ellipsis(&story.title, 50),
            published: format_timestamp(story.published.as_ref()),
            read: if story.read { "yes" } else { "no" }.to_string(),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct SummaryDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Title")]
    pub(crate) title: String,
    #[tabled(rename = "URL")]
    pub(crate) url: String,
}

impl From<&StorySummary> for SummaryDisplay {
    fn from(summary: &StorySummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: truncate_with_ellipsis(&summary.title, 50),
            url: truncate_with_ellipsis(&summary.url, 60),
        }
    }
}

/// Command-line fields for a new story
pub struct NewStory<'a> {
    pub feed_id: &'a str,
    pub title: &'a str,
    pub url: &'a str,
    pub description: Option<&'a str>,
    pub published: Option<&'a str>,
}

/// Add a story to a feed
pub async fn add_story<S: Storage>(storage: &S, story: NewStory<'_>) -> CliResult<String> {
    let published = parse_timestamp(story.published)?;
    let content = StoryContent {
        title: story.title.to_string(),
        url: story.url.to_string(),
        description: story.description.unwrap_or_default().to_string(),
        published,
        last_update: published,
        read: false,
        feed_id: story.feed_id.to_string(),
    };

    let id = storage.add_story(&content).await?;
    Ok(format!("Added story {} to feed {}", id, story.feed_id))
}

/// List every story of a feed
pub async fn list_stories<S: Storage>(storage: &S, feed_id: &str, format: &str) -> CliResult<String> {
    let stories = storage.get_stories(feed_id).await?;
    render::<_, StoryDisplay>(&stories, format, "No stories found.")
}

/// List the unread stories of a feed
pub async fn list_unread<S: Storage>(storage: &S, feed_id: &str, format: &str) -> CliResult<String> {
    let unread = storage.get_feed_unread(feed_id).await?;
    render::<_, SummaryDisplay>(&unread, format, "No unread stories.")
}

/// Show a single story
pub async fn show_story<S: Storage>(storage: &S, id: &str, format: &str) -> CliResult<String> {
    let story = find_story(storage, id).await?;
    if format == "json" {
        return Ok(serde_json::to_string_pretty(&story)?);
    }

    Ok(format!(
        "{}\n{}\nPublished: {}\nRead: {}\n\n{}",
        story.title,
        story.url,
        format_timestamp(story.published.as_ref()),
        if story.read { "yes" } else { "no" },
        story.description
    ))
}

/// Mark a story read or unread
pub async fn mark_read<S: Storage>(storage: &S, id: &str, read: bool) -> CliResult<String> {
    let mut content = find_story(storage, id).await?.content();
    content.read = read;

    storage
        .update_story(id, &content)
        .await?
        .ok_or_else(|| not_found(id))?;
    let state = if read { "read" } else { "unread" };
    Ok(format!("Marked story {} as {}", id, state))
}

/// Delete a single story
pub async fn remove_story<S: Storage>(storage: &S, id: &str) -> CliResult<String> {
    find_story(storage, id).await?;
    storage.remove_story(id).await?;
    Ok(format!("Removed story {}", id))
}

async fn find_story<S: Storage>(storage: &S, id: &str) -> CliResult<Story> {
    storage
        .get_story_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> CliError {
    CliError::NotFound {
        entity_type: "Story".to_string(),
        id: id.to_string(),
    }
}
