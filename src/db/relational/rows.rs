//! Row structs mapped by sqlx and their conversion into domain models.

use sqlx::FromRow;

use crate::db::utils::{decode_timestamp, format_row_id};
use crate::db::{DbError, Feed, Story, StorySummary, User};

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: format_row_id(row.id),
            username: row.username,
            password: row.password,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct FeedRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub last_update: Option<String>,
}

impl TryFrom<FeedRow> for Feed {
    type Error = DbError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        Ok(Feed {
            id: format_row_id(row.id),
            title: row.title,
            url: row.url,
            last_update: decode_timestamp(row.last_update)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StoryRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published: Option<String>,
    pub last_update: Option<String>,
    pub read: bool,
    pub feed_id: i64,
}

impl TryFrom<StoryRow> for Story {
    type Error = DbError;

    fn try_from(row: StoryRow) -> Result<Self, Self::Error> {
        Ok(Story {
            id: format_row_id(row.id),
            title: row.title,
            url: row.url,
            description: row.description,
            published: decode_timestamp(row.published)?,
            last_update: decode_timestamp(row.last_update)?,
            read: row.read,
            feed_id: format_row_id(row.feed_id),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StorySummaryRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub last_update: Option<String>,
}

impl TryFrom<StorySummaryRow> for StorySummary {
    type Error = DbError;

    fn try_from(row: StorySummaryRow) -> Result<Self, Self::Error> {
        Ok(StorySummary {
            id: format_row_id(row.id),
            title: row.title,
            url: row.url,
            last_update: decode_timestamp(row.last_update)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SettingRow {
    pub key: String,
    pub value: String,
}

/// Convert a batch of mapped rows, stopping at the first undecodable one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DbError>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}
