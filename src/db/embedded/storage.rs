//! `Storage` implementation for the embedded store.
//!
//! Every call runs synchronously while holding the connection lock; no
//! lock is ever held across an await point.

use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;
use tracing::{debug, warn};

use super::EmbeddedStorage;
use crate::db::utils::{
    decode_timestamp, decode_value, empty_setting, encode_timestamp, encode_value, format_row_id,
    parse_row_id, validate_setting_key,
};
use crate::db::{
    DbError, DbResult, Feed, FeedContent, Id, Storage, Story, StoryContent, StorySummary, User,
};

const FEED_COLUMNS: &str = "id, title, url, last_update";
const STORY_COLUMNS: &str = "id, title, url, description, published, last_update, read, feed_id";

fn sql_err(e: rusqlite::Error) -> DbError {
    DbError::Database {
        message: e.to_string(),
    }
}

fn constraint_code(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(err.extended_code)
        }
        _ => None,
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    constraint_code(e) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    constraint_code(e) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

/// A `feeds` row before its timestamp text is decoded.
struct FeedRecord {
    id: i64,
    title: String,
    url: String,
    last_update: Option<String>,
}

impl FeedRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            last_update: row.get(3)?,
        })
    }

    fn into_feed(self) -> DbResult<Feed> {
        Ok(Feed {
            id: format_row_id(self.id),
            title: self.title,
            url: self.url,
            last_update: decode_timestamp(self.last_update)?,
        })
    }
}

/// A `stories` row before its timestamp text is decoded.
struct StoryRecord {
    id: i64,
    title: String,
    url: String,
    description: String,
    published: Option<String>,
    last_update: Option<String>,
    read: bool,
    feed_id: i64,
}

impl StoryRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            description: row.get(3)?,
            published: row.get(4)?,
            last_update: row.get(5)?,
            read: row.get::<_, i64>(6)? != 0,
            feed_id: row.get(7)?,
        })
    }

    fn into_story(self) -> DbResult<Story> {
        Ok(Story {
            id: format_row_id(self.id),
            title: self.title,
            url: self.url,
            description: self.description,
            published: decode_timestamp(self.published)?,
            last_update: decode_timestamp(self.last_update)?,
            read: self.read,
            feed_id: format_row_id(self.feed_id),
        })
    }
}

fn query_feeds(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DbResult<Vec<Feed>> {
    let mut stmt = conn.prepare(sql).map_err(sql_err)?;
    let records = stmt
        .query_map(params, FeedRecord::from_row)
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    records.into_iter().map(FeedRecord::into_feed).collect()
}

fn query_stories(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DbResult<Vec<Story>> {
    let mut stmt = conn.prepare(sql).map_err(sql_err)?;
    let records = stmt
        .query_map(params, StoryRecord::from_row)
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    records.into_iter().map(StoryRecord::into_story).collect()
}

fn story_by_row_id(conn: &Connection, row_id: i64) -> DbResult<Option<Story>> {
    let sql = format!("SELECT {} FROM stories WHERE id = ?1", STORY_COLUMNS);
    conn.query_row(&sql, [row_id], StoryRecord::from_row)
        .optional()
        .map_err(sql_err)?
        .map(StoryRecord::into_story)
        .transpose()
}

fn feed_exists(conn: &Connection, row_id: i64) -> DbResult<bool> {
    conn.query_row("SELECT 1 FROM feeds WHERE id = ?1", [row_id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(sql_err)
}

/// Resolve a story's `feed_id` to the row id of an existing feed.
fn existing_feed_row_id(conn: &Connection, feed_id: &str) -> DbResult<i64> {
    match parse_row_id(feed_id) {
        Some(row_id) if feed_exists(conn, row_id)? => Ok(row_id),
        _ => Err(DbError::missing_feed(feed_id)),
    }
}

impl Storage for EmbeddedStorage {
    async fn get_setting(&self, key: &str) -> DbResult<Value> {
        validate_setting_key(key)?;

        self.with_conn_mut(|conn| {
            let raw: Option<String> = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(sql_err)?;

            match raw {
                Some(raw) => decode_value(key, &raw),
                None => Ok(empty_setting()),
            }
        })
    }

    async fn set_setting(&self, key: &str, value: &Value) -> DbResult<()> {
        validate_setting_key(key)?;
        let raw = encode_value(value)?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (id, key, value)
                 VALUES ((SELECT id FROM settings WHERE key = ?1), ?1, ?2)",
                params![key, raw],
            )
            .map_err(sql_err)?;
            debug!(key, "setting stored");
            Ok(())
        })
    }

    async fn get_settings(&self) -> DbResult<BTreeMap<String, Value>> {
        self.with_conn_mut(|conn| {
            let mut stmt = conn
                .prepare("SELECT key, value FROM settings ORDER BY key")
                .map_err(sql_err)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(sql_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err)?;

            let mut settings = BTreeMap::new();
            for (key, raw) in rows {
                let value = decode_value(&key, &raw)?;
                settings.insert(key, value);
            }
            Ok(settings)
        })
    }

    async fn add_user(&self, username: &str, password: &str) -> DbResult<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                params![username, password],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::AlreadyExists {
                        entity_type: "User".to_string(),
                        id: username.to_string(),
                    }
                } else {
                    sql_err(e)
                }
            })?;
            debug!(username, "user added");
            Ok(())
        })
    }

    async fn get_users(&self) -> DbResult<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT username FROM users ORDER BY id")?;
            let users = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(users)
        })
    }

    async fn remove_user(&self, username: &str) -> DbResult<()> {
        let removed = self.with_connection(|conn| {
            conn.execute("DELETE FROM users WHERE username = ?1", [username])
        })?;

        if removed == 0 {
            warn!(username, "remove_user: no such user");
        } else {
            debug!(username, "user removed");
        }
        Ok(())
    }

    async fn get_password(&self, username: &str) -> DbResult<Option<String>> {
        let user = self.with_connection(|conn| {
            conn.query_row(
                "SELECT id, username, password FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok(User {
                        id: format_row_id(row.get(0)?),
                        username: row.get(1)?,
                        password: row.get(2)?,
                    })
                },
            )
            .optional()
        })?;

        Ok(user.map(|user| user.password))
    }

    async fn set_password(&self, username: &str, password: &str) -> DbResult<()> {
        let updated = self.with_connection(|conn| {
            conn.execute(
                "UPDATE users SET password = ?1 WHERE username = ?2",
                params![password, username],
            )
        })?;

        if updated == 0 {
            warn!(username, "set_password: no such user");
        }
        Ok(())
    }

    async fn add_feed(&self, content: &FeedContent) -> DbResult<Id> {
        let row_id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO feeds (title, url, last_update) VALUES (?1, ?2, ?3)",
                params![
                    content.title,
                    content.url,
                    encode_timestamp(content.last_update.as_ref()),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        let id = format_row_id(row_id);
        debug!(feed_id = %id, title = %content.title, "feed added");
        Ok(id)
    }

    async fn get_feeds(&self) -> DbResult<Vec<Feed>> {
        let sql = format!("SELECT {} FROM feeds ORDER BY id", FEED_COLUMNS);
        self.with_conn_mut(|conn| query_feeds(conn, &sql, params![]))
    }

    async fn get_feed_by_title(&self, title: &str) -> DbResult<Option<Feed>> {
        let sql = format!(
            "SELECT {} FROM feeds WHERE title = ?1 ORDER BY id LIMIT 1",
            FEED_COLUMNS
        );
        let feeds = self.with_conn_mut(|conn| query_feeds(conn, &sql, [title]))?;
        Ok(feeds.into_iter().next())
    }

    async fn get_feed_by_id(&self, feed_id: &str) -> DbResult<Option<Feed>> {
        let Some(row_id) = parse_row_id(feed_id) else {
            return Ok(None);
        };

        let sql = format!("SELECT {} FROM feeds WHERE id = ?1", FEED_COLUMNS);
        let feeds = self.with_conn_mut(|conn| query_feeds(conn, &sql, [row_id]))?;
        Ok(feeds.into_iter().next())
    }

    async fn remove_feed(&self, feed_id: &str) -> DbResult<()> {
        let Some(row_id) = parse_row_id(feed_id) else {
            warn!(feed_id, "remove_feed: no such feed");
            return Ok(());
        };

        let (stories, feeds) = self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(sql_err)?;
            let stories = tx
                .execute("DELETE FROM stories WHERE feed_id = ?1", [row_id])
                .map_err(sql_err)?;
            let feeds = tx
                .execute("DELETE FROM feeds WHERE id = ?1", [row_id])
                .map_err(sql_err)?;
            tx.commit().map_err(sql_err)?;
            Ok((stories, feeds))
        })?;

        if feeds == 0 {
            warn!(feed_id, "remove_feed: no such feed");
        } else {
            debug!(feed_id, stories, "feed removed with its stories");
        }
        Ok(())
    }

    async fn add_story(&self, content: &StoryContent) -> DbResult<Id> {
        let row_id = self.with_conn_mut(|conn| {
            let feed_row_id = existing_feed_row_id(conn, &content.feed_id)?;
            conn.execute(
                "INSERT INTO stories (title, url, description, published, last_update, read, feed_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    content.title,
                    content.url,
                    content.description,
                    encode_timestamp(content.published.as_ref()),
                    encode_timestamp(content.last_update.as_ref()),
                    content.read,
                    feed_row_id,
                ],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DbError::missing_feed(&content.feed_id)
                } else {
                    sql_err(e)
                }
            })?;
            Ok(conn.last_insert_rowid())
        })?;

        let id = format_row_id(row_id);
        debug!(story_id = %id, feed_id = %content.feed_id, "story added");
        Ok(id)
    }

    async fn remove_story(&self, story_id: &str) -> DbResult<()> {
        let Some(row_id) = parse_row_id(story_id) else {
            warn!(story_id, "remove_story: no such story");
            return Ok(());
        };

        let removed = self.with_connection(|conn| {
            conn.execute("DELETE FROM stories WHERE id = ?1", [row_id])
        })?;

        if removed == 0 {
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
            "SELECT {} FROM stories WHERE feed_id = ?1 ORDER BY id",
            STORY_COLUMNS
        );
        self.with_conn_mut(|conn| query_stories(conn, &sql, [row_id]))
    }

    async fn get_story_by_id(&self, story_id: &str) -> DbResult<Option<Story>> {
        let Some(row_id) = parse_row_id(story_id) else {
            return Ok(None);
        };

        self.with_conn_mut(|conn| story_by_row_id(conn, row_id))
    }

    async fn update_story(
        &self,
        story_id: &str,
        content: &StoryContent,
    ) -> DbResult<Option<Story>> {
        let Some(row_id) = parse_row_id(story_id) else {
            return Ok(None);
        };

        let updated = self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(sql_err)?;

            if story_by_row_id(&tx, row_id)?.is_none() {
                return Ok(None);
            }
            let feed_row_id = existing_feed_row_id(&tx, &content.feed_id)?;

            tx.execute(
                "UPDATE stories
                 SET title = ?1, url = ?2, description = ?3, published = ?4, last_update = ?5,
                     read = ?6, feed_id = ?7
                 WHERE id = ?8",
                params![
                    content.title,
                    content.url,
                    content.description,
                    encode_timestamp(content.published.as_ref()),
                    encode_timestamp(content.last_update.as_ref()),
                    content.read,
                    feed_row_id,
                    row_id,
                ],
            )
            .map_err(sql_err)?;

            let story = story_by_row_id(&tx, row_id)?;
            tx.commit().map_err(sql_err)?;
            Ok(story)
        })?;

        if updated.is_some() {
            debug!(story_id, read = content.read, "story updated");
        }
        Ok(updated)
    }

    async fn get_feed_unread(&self, feed_id: &str) -> DbResult<Vec<StorySummary>> {
        let Some(row_id) = parse_row_id(feed_id) else {
            return Ok(vec![]);
        };

        self.with_conn_mut(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, url, last_update FROM stories
                     WHERE feed_id = ?1 AND read = 0
                     ORDER BY id",
                )
                .map_err(sql_err)?;
            let rows = stmt
                .query_map([row_id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })
                .map_err(sql_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err)?;

            rows.into_iter()
                .map(|(id, title, url, last_update)| {
                    Ok(StorySummary {
                        id: format_row_id(id),
                        title,
                        url,
                        last_update: decode_timestamp(last_update)?,
                    })
                })
                .collect()
        })
    }
}
