//! Tests for configuration-selected storage.

use crate::db::{
    AnyStorage, BackendKind, DbError, EmbeddedStorage, FeedContent, RelationalStorage, Storage,
    StorageConfig, StoryContent,
};

async fn round_trip_and_cascade(storage: &AnyStorage) {
    let feed = FeedContent {
        title: "LWN".to_string(),
        url: "https://lwn.net/headlines/rss".to_string(),
        last_update: None,
    };
    let feed_id = storage.add_feed(&feed).await.expect("add_feed");
    assert_eq!(
        storage.get_feed_by_id(&feed_id).await.unwrap().unwrap().content(),
        feed
    );

    let story = StoryContent {
        title: "Kernel release".to_string(),
        url: "https://lwn.net/Articles/1".to_string(),
        feed_id: feed_id.clone(),
        ..Default::default()
    };
    let story_id = storage.add_story(&story).await.expect("add_story");
    let stored = storage.get_story_by_id(&story_id).await.unwrap().unwrap();
    assert_eq!(stored.content(), story);
    assert_eq!(storage.get_feed_unread(&feed_id).await.unwrap().len(), 1);

    storage.set_setting("theme", &serde_json::json!("dark")).await.unwrap();
    assert_eq!(
        storage.get_setting("theme").await.unwrap(),
        serde_json::json!("dark")
    );

    storage.remove_feed(&feed_id).await.expect("remove_feed");
    assert!(storage.get_feed_by_id(&feed_id).await.unwrap().is_none());
    assert!(storage.get_story_by_id(&story_id).await.unwrap().is_none());
    assert!(storage.get_stories(&feed_id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_open_relational_from_config() {
    let config = StorageConfig::Relational {
        uri: "sqlite::memory:".to_string(),
    };
    let storage = AnyStorage::open(&config).await.expect("open relational");

    assert_eq!(storage.backend(), BackendKind::Relational);
    round_trip_and_cascade(&storage).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_open_embedded_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig::Embedded {
        path: dir.path().join("feeds.db"),
    };
    let storage = AnyStorage::open(&config).await.expect("open embedded");

    assert_eq!(storage.backend(), BackendKind::Embedded);
    round_trip_and_cascade(&storage).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_embedded_config_persists_across_opens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig::Embedded {
        path: dir.path().join("feeds.db"),
    };

    {
        let storage = AnyStorage::open(&config).await.unwrap();
        storage.add_user("alice", "hash").await.unwrap();
    }

    let storage = AnyStorage::open(&config).await.unwrap();
    assert_eq!(storage.get_users().await.unwrap(), vec!["alice".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrap_existing_backends() {
    let relational: AnyStorage = RelationalStorage::in_memory().await.unwrap().into();
    assert_eq!(relational.backend(), BackendKind::Relational);
    round_trip_and_cascade(&relational).await;

    let embedded: AnyStorage = EmbeddedStorage::in_memory().unwrap().into();
    assert_eq!(embedded.backend(), BackendKind::Embedded);
    round_trip_and_cascade(&embedded).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_uri_is_configuration_error() {
    let err = RelationalStorage::open("sqlite://feeds.db?mode=bogus")
        .await
        .err()
        .expect("malformed uri should be rejected");
    assert!(matches!(err, DbError::Configuration { .. }));

    let config = StorageConfig::Relational {
        uri: "sqlite://feeds.db?mode=bogus".to_string(),
    };
    let err = AnyStorage::open(&config).await.err().expect("rejected");
    assert!(matches!(err, DbError::Configuration { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_parameters_are_configuration_errors() {
    let err = AnyStorage::open(&StorageConfig::Relational { uri: String::new() })
        .await
        .err()
        .expect("empty uri should be rejected");
    assert!(matches!(err, DbError::Configuration { .. }));

    let err = AnyStorage::open(&StorageConfig::Embedded {
        path: Default::default(),
    })
    .await
    .err()
    .expect("empty path should be rejected");
    assert!(matches!(err, DbError::Configuration { .. }));
}
