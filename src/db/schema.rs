//! Table definitions used by the embedded store's bootstrap.
//!
//! The relational store creates the same tables through its sqlx
//! migration in `migrations/relational`.

/// Name and `CREATE TABLE` statement for every table, in creation order.
pub const TABLES: &[(&str, &str)] = &[
    ("users", USERS),
    ("feeds", FEEDS),
    ("stories", STORIES),
    ("settings", SETTINGS),
];

const USERS: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
)";

const FEEDS: &str = "CREATE TABLE feeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    last_update TEXT
)";

const STORIES: &str = "CREATE TABLE stories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    published TEXT,
    last_update TEXT,
    read INTEGER NOT NULL DEFAULT 0,
    feed_id INTEGER NOT NULL REFERENCES feeds(id)
)";

const SETTINGS: &str = "CREATE TABLE settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL
)";

pub const STORIES_FEED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_stories_feed_id ON stories(feed_id)";
