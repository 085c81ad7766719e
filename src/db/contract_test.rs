//! Behavioral tests every backend must pass.
//!
//! Each check is written once against the `Storage` trait and then
//! instantiated for the relational and the embedded store.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use crate::db::{
    DbError, EmbeddedStorage, FeedContent, RelationalStorage, Storage, StoryContent, Timestamp,
};

fn at(day: u32, nanos: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 1, day, 10, 30, 0).unwrap() + Duration::nanoseconds(nanos)
}

fn feed(title: &str) -> FeedContent {
    FeedContent {
        title: title.to_string(),
        url: format!("https://{}.example.com/rss", title.to_lowercase()),
        last_update: Some(at(1, 250_000_001)),
    }
}

fn story(feed_id: &str, title: &str, read: bool) -> StoryContent {
    StoryContent {
        title: title.to_string(),
        url: format!("https://example.com/{}", title.to_lowercase()),
        description: format!("About {}", title),
        published: Some(at(2, 0)),
        last_update: Some(at(3, 999)),
        read,
        feed_id: feed_id.to_string(),
    }
}

async fn feed_round_trip<S: Storage>(storage: &S) {
    let content = feed("Planet");
    let id = storage.add_feed(&content).await.expect("add_feed");

    let stored = storage
        .get_feed_by_id(&id)
        .await
        .expect("get_feed_by_id")
        .expect("feed should exist");
    assert_eq!(stored.id, id);
    assert_eq!(stored.content(), content);

    let untimed = FeedContent {
        last_update: None,
        ..feed("Quiet")
    };
    let id = storage.add_feed(&untimed).await.expect("add_feed");
    let stored = storage.get_feed_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.content(), untimed);
}

async fn feeds_listed_in_creation_order<S: Storage>(storage: &S) {
    assert!(storage.get_feeds().await.unwrap().is_empty());

    let first = storage.add_feed(&feed("Zeta")).await.unwrap();
    let second = storage.add_feed(&feed("Alpha")).await.unwrap();
    assert_ne!(first, second);

    let ids: Vec<String> = storage
        .get_feeds()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec![first, second.clone()]);

    let by_title = storage.get_feed_by_title("Alpha").await.unwrap().unwrap();
    assert_eq!(by_title.id, second);
    assert!(storage.get_feed_by_title("alpha").await.unwrap().is_none());
    assert!(storage.get_feed_by_title("Alph").await.unwrap().is_none());
}

async fn story_round_trip<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("News")).await.unwrap();
    let content = story(&feed_id, "Launch", true);

    let id = storage.add_story(&content).await.expect("add_story");
    let stored = storage
        .get_story_by_id(&id)
        .await
        .expect("get_story_by_id")
        .expect("story should exist");

    assert_eq!(stored.id, id);
    assert_eq!(stored.content(), content);
}

async fn remove_feed_cascades_to_stories<S: Storage>(storage: &S) {
    let doomed = storage.add_feed(&feed("Doomed")).await.unwrap();
    let kept = storage.add_feed(&feed("Kept")).await.unwrap();

    let mut doomed_stories = Vec::new();
    for title in ["One", "Two", "Three"] {
        doomed_stories.push(storage.add_story(&story(&doomed, title, false)).await.unwrap());
    }
    let survivor = storage.add_story(&story(&kept, "Survivor", false)).await.unwrap();

    storage.remove_feed(&doomed).await.expect("remove_feed");

    assert!(storage.get_feed_by_id(&doomed).await.unwrap().is_none());
    assert!(storage.get_stories(&doomed).await.unwrap().is_empty());
    assert!(storage.get_feed_unread(&doomed).await.unwrap().is_empty());
    for id in &doomed_stories {
        assert!(storage.get_story_by_id(id).await.unwrap().is_none());
    }

    assert!(storage.get_feed_by_id(&kept).await.unwrap().is_some());
    assert!(storage.get_story_by_id(&survivor).await.unwrap().is_some());
}

async fn remove_unknown_feed_is_a_noop<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Stay")).await.unwrap();

    storage.remove_feed("nonexistent").await.expect("bad id");
    storage.remove_feed("424242").await.expect("unknown id");

    assert_eq!(storage.get_feeds().await.unwrap().len(), 1);
    assert!(storage.get_feed_by_id(&feed_id).await.unwrap().is_some());
}

async fn not_found_is_routine<S: Storage>(storage: &S) {
    assert!(storage.get_feed_by_id("nonexistent").await.unwrap().is_none());
    assert!(storage.get_feed_by_id("1").await.unwrap().is_none());
    assert!(storage.get_story_by_id("nonexistent").await.unwrap().is_none());
    assert!(storage.get_password("nonexistent-user").await.unwrap().is_none());
    assert!(storage.get_feed_by_title("Nothing").await.unwrap().is_none());
    assert!(storage.get_stories("nonexistent").await.unwrap().is_empty());
    assert!(storage.get_feed_unread("nonexistent").await.unwrap().is_empty());
    assert!(storage.get_users().await.unwrap().is_empty());
    assert!(storage.get_settings().await.unwrap().is_empty());
}

async fn unread_filter<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Mixed")).await.unwrap();
    let a = storage.add_story(&story(&feed_id, "A", false)).await.unwrap();
    let _b = storage.add_story(&story(&feed_id, "B", true)).await.unwrap();
    let c = storage.add_story(&story(&feed_id, "C", false)).await.unwrap();

    let other = storage.add_feed(&feed("Other")).await.unwrap();
    storage.add_story(&story(&other, "D", false)).await.unwrap();

    let unread = storage.get_feed_unread(&feed_id).await.unwrap();
    let mut ids: Vec<String> = unread.iter().map(|s| s.id.clone()).collect();
    ids.sort();
    let mut expected = vec![a.clone(), c];
    expected.sort();
    assert_eq!(ids, expected);

    let first = unread.iter().find(|s| s.id == a).unwrap();
    assert_eq!(first.title, "A");
    assert_eq!(first.url, "https://example.com/a");
    assert_eq!(first.last_update, Some(at(3, 999)));
}

async fn unread_filter_when_everything_is_read<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Done")).await.unwrap();
    storage.add_story(&story(&feed_id, "A", true)).await.unwrap();

    assert!(storage.get_feed_unread(&feed_id).await.unwrap().is_empty());
    assert_eq!(storage.get_stories(&feed_id).await.unwrap().len(), 1);
}

async fn settings_upsert_by_key<S: Storage>(storage: &S) {
    storage.set_setting("theme", &json!("dark")).await.unwrap();
    storage.set_setting("theme", &json!("light")).await.unwrap();
    storage
        .set_setting("layout", &json!({"columns": 2, "compact": true}))
        .await
        .unwrap();

    assert_eq!(storage.get_setting("theme").await.unwrap(), json!("light"));

    let settings = storage.get_settings().await.unwrap();
    assert_eq!(settings.len(), 2);
    assert_eq!(settings.get("theme"), Some(&json!("light")));
    assert_eq!(
        settings.get("layout"),
        Some(&json!({"columns": 2, "compact": true}))
    );
}

async fn absent_setting_is_empty_sequence<S: Storage>(storage: &S) {
    assert_eq!(storage.get_setting("missing").await.unwrap(), json!([]));

    let err = storage.get_setting("").await.unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
    let err = storage.set_setting("", &json!(1)).await.unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}

async fn update_story_replaces_every_field<S: Storage>(storage: &S) {
    let original_feed = storage.add_feed(&feed("Before")).await.unwrap();
    let new_feed = storage.add_feed(&feed("After")).await.unwrap();
    let id = storage
        .add_story(&story(&original_feed, "Draft", false))
        .await
        .unwrap();

    let replacement = StoryContent {
        title: "Final".to_string(),
        url: "https://example.com/final".to_string(),
        description: String::new(),
        published: None,
        last_update: Some(at(9, 5)),
        read: true,
        feed_id: new_feed.clone(),
    };

    let updated = storage
        .update_story(&id, &replacement)
        .await
        .expect("update_story")
        .expect("story should exist");
    assert_eq!(updated.id, id);
    assert_eq!(updated.content(), replacement);

    let stored = storage.get_story_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored, updated);
    assert!(storage.get_stories(&original_feed).await.unwrap().is_empty());
    assert_eq!(storage.get_stories(&new_feed).await.unwrap().len(), 1);
}

async fn update_missing_story_returns_none<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Any")).await.unwrap();
    let content = story(&feed_id, "Ghost", false);

    assert!(storage.update_story("nonexistent", &content).await.unwrap().is_none());
    assert!(storage.update_story("777", &content).await.unwrap().is_none());
    assert!(storage.get_stories(&feed_id).await.unwrap().is_empty());
}

async fn update_story_to_unknown_feed_is_rejected<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Home")).await.unwrap();
    let id = storage.add_story(&story(&feed_id, "Stay", false)).await.unwrap();

    let err = storage
        .update_story(&id, &story("9999", "Moved", true))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Constraint { .. }));

    let stored = storage.get_story_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Stay");
    assert_eq!(stored.feed_id, feed_id);
}

async fn story_with_unknown_feed_is_rejected<S: Storage>(storage: &S) {
    let err = storage
        .add_story(&story("9999", "Orphan", false))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Constraint { .. }));

    let err = storage
        .add_story(&story("not-a-feed", "Orphan", false))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Constraint { .. }));
}

async fn identifiers_are_matched_exactly<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Exact")).await.unwrap();
    let story_id = storage
        .add_story(&story(&feed_id, "Exact", false))
        .await
        .unwrap();

    for alias in [
        format!("+{}", feed_id),
        format!("0{}", feed_id),
        format!(" {} ", feed_id),
    ] {
        assert!(storage.get_feed_by_id(&alias).await.unwrap().is_none());
        assert!(storage.get_stories(&alias).await.unwrap().is_empty());
        assert!(storage.get_feed_unread(&alias).await.unwrap().is_empty());

        let err = storage
            .add_story(&story(&alias, "Aliased", false))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint { .. }));

        storage.remove_feed(&alias).await.unwrap();
    }

    let alias = format!("0{}", story_id);
    assert!(storage.get_story_by_id(&alias).await.unwrap().is_none());
    storage.remove_story(&alias).await.unwrap();

    let stored = storage.get_story_by_id(&story_id).await.unwrap().unwrap();
    assert_eq!(stored.feed_id, feed_id);
    assert!(storage.get_feed_by_id(&feed_id).await.unwrap().is_some());
}

async fn remove_story_removes_only_that_story<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Pair")).await.unwrap();
    let gone = storage.add_story(&story(&feed_id, "Gone", false)).await.unwrap();
    let kept = storage.add_story(&story(&feed_id, "Kept", false)).await.unwrap();

    storage.remove_story(&gone).await.expect("remove_story");
    storage.remove_story(&gone).await.expect("second removal is a no-op");
    storage.remove_story("nonexistent").await.expect("bad id is a no-op");

    let remaining: Vec<String> = storage
        .get_stories(&feed_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(remaining, vec![kept]);
    assert!(storage.get_feed_by_id(&feed_id).await.unwrap().is_some());
}

async fn user_lifecycle<S: Storage>(storage: &S) {
    storage.add_user("alice", "hash1").await.unwrap();
    assert!(storage.get_users().await.unwrap().contains(&"alice".to_string()));

    storage.set_password("alice", "hash2").await.unwrap();
    assert_eq!(
        storage.get_password("alice").await.unwrap().as_deref(),
        Some("hash2")
    );

    storage.remove_user("alice").await.unwrap();
    assert!(!storage.get_users().await.unwrap().contains(&"alice".to_string()));
    assert!(storage.get_password("alice").await.unwrap().is_none());
}

async fn users_listed_in_creation_order<S: Storage>(storage: &S) {
    for name in ["carol", "alice", "bob"] {
        storage.add_user(name, "secret").await.unwrap();
    }
    assert_eq!(storage.get_users().await.unwrap(), vec!["carol", "alice", "bob"]);
}

async fn duplicate_username_is_rejected<S: Storage>(storage: &S) {
    storage.add_user("bob", "first").await.unwrap();

    let err = storage.add_user("bob", "second").await.unwrap_err();
    assert!(matches!(err, DbError::AlreadyExists { .. }));

    assert_eq!(storage.get_users().await.unwrap(), vec!["bob".to_string()]);
    assert_eq!(
        storage.get_password("bob").await.unwrap().as_deref(),
        Some("first")
    );
}

async fn absent_user_writes_are_noops<S: Storage>(storage: &S) {
    storage.remove_user("ghost").await.expect("remove_user");
    storage.set_password("ghost", "x").await.expect("set_password");

    assert!(storage.get_users().await.unwrap().is_empty());
    assert!(storage.get_password("ghost").await.unwrap().is_none());
}

async fn returned_records_are_detached<S: Storage>(storage: &S) {
    let feed_id = storage.add_feed(&feed("Original")).await.unwrap();

    let mut copy = storage.get_feed_by_id(&feed_id).await.unwrap().unwrap();
    copy.title = "Changed locally".to_string();

    let stored = storage.get_feed_by_id(&feed_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original");
}

macro_rules! contract_tests {
    ($($name:ident),* $(,)?) => {
        mod relational {
            use super::*;

            $(
                #[tokio::test(flavor = "multi_thread")]
                async fn $name() {
                    let storage = RelationalStorage::in_memory()
                        .await
                        .expect("Failed to create in-memory relational storage");
                    super::$name(&storage).await;
                }
            )*
        }

        mod embedded {
            use super::*;

            $(
                #[tokio::test(flavor = "multi_thread")]
                async fn $name() {
                    let storage = EmbeddedStorage::in_memory()
                        .expect("Failed to create in-memory embedded storage");
                    super::$name(&storage).await;
                }
            )*
        }
    };
}

contract_tests!(
    feed_round_trip,
    feeds_listed_in_creation_order,
    story_round_trip,
    remove_feed_cascades_to_stories,
    remove_unknown_feed_is_a_noop,
    not_found_is_routine,
    unread_filter,
    unread_filter_when_everything_is_read,
    settings_upsert_by_key,
    absent_setting_is_empty_sequence,
    update_story_replaces_every_field,
    update_missing_story_returns_none,
    update_story_to_unknown_feed_is_rejected,
    story_with_unknown_feed_is_rejected,
    identifiers_are_matched_exactly,
    remove_story_removes_only_that_story,
    user_lifecycle,
    users_listed_in_creation_order,
    duplicate_username_is_rejected,
    absent_user_writes_are_noops,
    returned_records_are_detached,
);
