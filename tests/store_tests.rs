use blog_portal::{
    models::{Post, UpdatePostRequest, User},
    store::{MemoryStore, Store},
};

fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{name}@demo.com"),
        ..Default::default()
    }
}

fn post(id: &str, title: &str, genre: &str) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        genre: genre.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn soft_delete_excludes_from_reads_but_retains_the_record() {
    let store = MemoryStore::new();
    store
        .insert_user(user("aaaaaaaaaaaaaaaaaaaaaaaa", "alice"))
        .await
        .unwrap();

    assert!(store.soft_delete_user("aaaaaaaaaaaaaaaaaaaaaaaa").await.unwrap());

    assert!(store.find_user("aaaaaaaaaaaaaaaaaaaaaaaa").await.unwrap().is_none());
    assert!(store.list_users().await.unwrap().is_empty());
    assert!(store.find_user_by_email("alice@demo.com").await.unwrap().is_none());

    // A second delete finds no live document.
    assert!(!store.soft_delete_user("aaaaaaaaaaaaaaaaaaaaaaaa").await.unwrap());
}

#[tokio::test]
async fn deleting_a_missing_id_mutates_nothing() {
    let store = MemoryStore::new();
    store
        .insert_post(post("bbbbbbbbbbbbbbbbbbbbbbbb", "Keep me", "Tech"))
        .await
        .unwrap();

    assert!(!store.soft_delete_post("ffffffffffffffffffffffff").await.unwrap());
    assert_eq!(store.list_posts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn comment_refs_push_and_pull() {
    let store = MemoryStore::new();
    store
        .insert_post(post("bbbbbbbbbbbbbbbbbbbbbbbb", "Parent", "Tech"))
        .await
        .unwrap();

    assert!(
        store
            .push_comment_ref("bbbbbbbbbbbbbbbbbbbbbbbb", "cccccccccccccccccccccccc")
            .await
            .unwrap()
    );
    let parent = store.find_post("bbbbbbbbbbbbbbbbbbbbbbbb").await.unwrap().unwrap();
    assert_eq!(parent.comments, vec!["cccccccccccccccccccccccc"]);

    assert!(
        store
            .pull_comment_ref("bbbbbbbbbbbbbbbbbbbbbbbb", "cccccccccccccccccccccccc")
            .await
            .unwrap()
    );
    let parent = store.find_post("bbbbbbbbbbbbbbbbbbbbbbbb").await.unwrap().unwrap();
    assert!(parent.comments.is_empty());

    // Pushing onto a missing (or deleted) post reports false.
    assert!(
        !store
            .push_comment_ref("ffffffffffffffffffffffff", "cccccccccccccccccccccccc")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn partial_update_touches_only_supplied_fields() {
    let store = MemoryStore::new();
    let original = store
        .insert_post(post("bbbbbbbbbbbbbbbbbbbbbbbb", "Old title", "Tech"))
        .await
        .unwrap();

    let updated = store
        .update_post(
            "bbbbbbbbbbbbbbbbbbbbbbbb",
            UpdatePostRequest {
                title: Some("New title".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "New title");
    assert_eq!(updated.genre, "Tech");
    assert!(updated.updated_at >= original.updated_at);

    // Updating an unknown id is None, not an error.
    assert!(
        store
            .update_post("ffffffffffffffffffffffff", UpdatePostRequest::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn listing_preserves_insertion_order() {
    let store = MemoryStore::new();
    for (id, title) in [
        ("aaaaaaaaaaaaaaaaaaaaaaaa", "first"),
        ("bbbbbbbbbbbbbbbbbbbbbbbb", "second"),
        ("cccccccccccccccccccccccc", "third"),
    ] {
        store.insert_post(post(id, title, "Tech")).await.unwrap();
    }

    let titles: Vec<String> = store
        .list_posts()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn genre_match_is_case_insensitive_substring() {
    let store = MemoryStore::new();
    store
        .insert_post(post("aaaaaaaaaaaaaaaaaaaaaaaa", "A", "Science Fiction"))
        .await
        .unwrap();
    store
        .insert_post(post("bbbbbbbbbbbbbbbbbbbbbbbb", "B", "Cooking"))
        .await
        .unwrap();

    assert_eq!(store.find_posts_by_genre("FICTION").await.unwrap().len(), 1);
    assert_eq!(store.find_posts_by_genre("cook").await.unwrap().len(), 1);
    assert_eq!(store.find_posts_by_genre("c").await.unwrap().len(), 2);
    assert!(store.find_posts_by_genre("poetry").await.unwrap().is_empty());
}
