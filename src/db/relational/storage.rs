//! `Storage` implementation for the relational store.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::RelationalStorage;
use super::rows::{FeedRow, SettingRow, StoryRow, StorySummaryRow, UserRow, convert_all};
use crate::db::utils::{
    decode_value, empty_setting, encode_timestamp, encode_value, format_row_id, parse_row_id,
    validate_setting_key,
};
use crate::db::{
    DbError, DbResult, Feed, FeedContent, Id, Storage, Story, StoryContent, StorySummary, User,
};

const STORY_COLUMNS: &str =
    "s.id, s.title, s.url, s.description, s.published, s.last_update, s.read, s.feed_id";

fn db_error(e: sqlx::Error) -> DbError {
    DbError::Database {
        message: e.to_string(),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

impl Storage for RelationalStorage {
    async fn get_setting(&self, key: &str) -> DbResult<Value> {
        validate_setting_key(key)?;

        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match raw {
            Some(raw) => decode_value(key, &raw),
            None => Ok(empty_setting()),
        }
    }

    async fn set_setting(&self, key: &str, value: &Value) -> DbResult<()> {
        validate_setting_key(key)?;
        let raw = encode_value(value)?;

        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(&raw)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(key, "setting stored");
        Ok(())
    }

    async fn get_settings(&self) -> DbResult<BTreeMap<String, Value>> {
        let rows: Vec<SettingRow> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        rows.into_iter()
            .map(|row| {
                let value = decode_value(&row.key, &row.value)?;
                Ok((row.key, value))
            })
            .collect()
    }

    async fn add_user(&self, username: &str, password: &str) -> DbResult<()> {
        sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::AlreadyExists {
                        entity_type: "User".to_string(),
                        id: username.to_string(),
                    }
                } else {
                    db_error(e)
                }
            })?;

        debug!(username, "user added");
        Ok(())
    }

    async fn get_users(&self) -> DbResult<Vec<String>> {
        sqlx::query_scalar("SELECT username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn remove_user(&self, username: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            warn!(username, "remove_user: no such user");
        } else {
            debug!(username, "user removed");
        }
        Ok(())
    }

    async fn get_password(&self, username: &str) -> DbResult<Option<String>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(User::from).map(|user| user.password))
    }

    async fn set_password(&self, username: &str, password: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password = ? WHERE username = ?")
            .bind(password)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            warn!(username, "set_password: no such user");
        }
        Ok(())
    }

    async fn add_feed(&self, content: &FeedContent) -> DbResult<Id> {
        let result = sqlx::query("INSERT INTO feeds (title, url, last_update) VALUES (?, ?, ?)")
            .bind(&content.title)
            .bind(&content.url)
            .bind(encode_timestamp(content.last_update.as_ref()))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        let id = format_row_id(result.last_insert_rowid());
        debug!(feed_id = %id, title = %content.title, "feed added");
        Ok(id)
    }

    async fn get_feeds(&self) -> DbResult<Vec<Feed>> {
        let rows: Vec<FeedRow> =
            sqlx::query_as("SELECT id, title, url, last_update FROM feeds ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        convert_all(rows)
    }

    async fn get_feed_by_title(&self, title: &str) -> DbResult<Option<Feed>> {
        let row: Option<FeedRow> = sqlx::query_as(
            "SELECT id, title, url, last_update FROM feeds WHERE title = ? ORDER BY id LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Feed::try_from).transpose()
    }

    async fn get_feed_by_id(&self, feed_id: &str) -> DbResult<Option<Feed>> {
        let Some(row_id) = parse_row_id(feed_id) else {
            return Ok(None);
        };

        let row: Option<FeedRow> =
            sqlx::query_as("SELECT id, title, url, last_update FROM feeds WHERE id = ?")
                .bind(row_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(Feed::try_from).transpose()
    }

    async fn remove_feed(&self, feed_id: &str) -> DbResult<()> {
        let Some(row_id) = parse_row_id(feed_id) else {
            warn!(feed_id, "remove_feed: no such feed");
            return Ok(());
        };

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let stories = sqlx::query(
            "DELETE FROM stories WHERE id IN (
                 SELECT s.id FROM stories s JOIN feeds f ON s.feed_id = f.id WHERE f.id = ?
             )",
        )
        .bind(row_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let feeds = sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(row_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        if feeds.rows_affected() == 0 {
            warn!(feed_id, "remove_feed: no such feed");
        } else {
            debug!(
                feed_id,
                stories = stories.rows_affected(),
                "feed removed with its stories"
            );
        }
        Ok(())
    }

    async fn add_story(&self, content: &StoryContent) -> DbResult<Id> {
        let feed_row_id =
            parse_row_id(&content.feed_id).ok_or_else(|| DbError::missing_feed(&content.feed_id))?;

        let result = sqlx::query(
            "INSERT INTO stories (title, url, description, published, last_update, read, feed_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&content.title)
        .bind(&content.url)
        .bind(&content.description)
        .bind(encode_timestamp(content.published.as_ref()))
        .bind(encode_timestamp(content.last_update.as_ref()))
        .bind(content.read)
        .bind(feed_row_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::missing_feed(&content.feed_id)
            } else {
                db_error(e)
            }
        })?;

        let id = format_row_id(result.last_insert_rowid());
        debug!(story_id = %id, feed_id = %content.feed_id, "story added");
        Ok(id)
    }

    async fn remove_story(&self, story_id: &str) -> DbResult<()> {
        let Some(row_id) = parse_row_id(story_id) else {
            warn!(story_id, "remove_story: no such story");
            return Ok(());
        };

        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(row_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            warn!(story_id, "remove_story: no such story");
        } else {
            debug!(story_id, "story removed");
        }
        Ok(())
    }

    async fn get_stories(&self, feed_id: &str) -> DbResult<Vec<Story>> {
        let Some(row_id) = parse_row_id(feed_id) else {
            return Ok(vec![]);
        };

        let sql = format!(
            "SELECT {} FROM stories s JOIN feeds f ON s.feed_id = f.id WHERE f.id = ? ORDER BY s.id",
            STORY_COLUMNS
        );
        let rows: Vec<StoryRow> = sqlx::query_as(&sql)
            .bind(row_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        convert_all(rows)
    }

    async fn get_story_by_id(&self, story_id: &str) -> DbResult<Option<Story>> {
        let Some(row_id) = parse_row_id(story_id) else {
            return Ok(None);
        };

        let sql = format!("SELECT {} FROM stories s WHERE s.id = ?", STORY_COLUMNS);
        let row: Option<StoryRow> = sqlx::query_as(&sql)
            .bind(row_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Story::try_from).transpose()
    }

    async fn update_story(
        &self,
        story_id: &str,
        content: &StoryContent,
    ) -> DbResult<Option<Story>> {
        let Some(row_id) = parse_row_id(story_id) else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM stories WHERE id = ?")
            .bind(row_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        if exists.is_none() {
            return Ok(None);
        }

        let feed_row_id =
            parse_row_id(&content.feed_id).ok_or_else(|| DbError::missing_feed(&content.feed_id))?;

        sqlx::query(
            "UPDATE stories
             SET title = ?, url = ?, description = ?, published = ?, last_update = ?,
                 read = ?, feed_id = ?
             WHERE id = ?",
        )
        .bind(&content.title)
        .bind(&content.url)
        .bind(&content.description)
        .bind(encode_timestamp(content.published.as_ref()))
        .bind(encode_timestamp(content.last_update.as_ref()))
        .bind(content.read)
        .bind(feed_row_id)
        .bind(row_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::missing_feed(&content.feed_id)
            } else {
                db_error(e)
            }
        })?;

        let sql = format!("SELECT {} FROM stories s WHERE s.id = ?", STORY_COLUMNS);
        let row: StoryRow = sqlx::query_as(&sql)
            .bind(row_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        debug!(story_id, read = content.read, "story updated");
        Story::try_from(row).map(Some)
    }

    async fn get_feed_unread(&self, feed_id: &str) -> DbResult<Vec<StorySummary>> {
        let Some(row_id) = parse_row_id(feed_id) else {
            return Ok(vec![]);
        };

        let rows: Vec<StorySummaryRow> = sqlx::query_as(
            "SELECT s.id, s.title, s.url, s.last_update
             FROM stories s JOIN feeds f ON s.feed_id = f.id
             WHERE f.id = ? AND s.read = 0
             ORDER BY s.id",
        )
        .bind(row_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        convert_all(rows)
    }
}
