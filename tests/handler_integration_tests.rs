use blog_portal::{
    AppConfig, AppState, MemoryStore, create_router,
    auth::Claims,
    models::Role,
    services::seed_demo_users,
    store::StoreState,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_app() -> String {
    let store = Arc::new(MemoryStore::new()) as StoreState;
    let config = AppConfig::default();

    seed_demo_users(&store, config.bcrypt_cost)
        .await
        .expect("Failed to seed demo accounts");

    let state = AppState::new(store, config);
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Logs in a seeded demo account; returns (bearer token, user id).
async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> (String, String) {
    let response = client
        .post(&format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("login fail");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    (
        body["token"]["token"].as_str().unwrap().to_string(),
        body["token"]["id"].as_str().unwrap().to_string(),
    )
}

/// Creates a post as the admin demo account; returns (admin token, post id).
async fn seed_post(client: &reqwest::Client, address: &str) -> (String, String) {
    let (admin_token, admin_id) = login(client, address, "admin@demo.com", "Admin123").await;

    let response = client
        .post(&format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({
            "title": "On soft deletes",
            "content": "Nothing is ever really gone.",
            "author": admin_id,
            "genre": "Tech",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let post: Value = response.json().await.unwrap();
    (admin_token, post["_id"].as_str().unwrap().to_string())
}

async fn get_post(client: &reqwest::Client, address: &str, token: &str, id: &str) -> Value {
    let response = client
        .get(&format!("{}/api/posts/{}", address, id))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_comment_lifecycle_updates_post_references() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, post_id) = seed_post(&client, &address).await;
    let (user_token, user_id) = login(&client, &address, "user@demo.com", "User123").await;

    // USER posts a comment on the existing post, author set to their own id.
    let response = client
        .post(&format!("{}/api/comments", address))
        .header("Authorization", format!("Bearer {user_token}"))
        .json(&json!({ "content": "Great point.", "author": user_id, "post": post_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let comment: Value = response.json().await.unwrap();
    let comment_id = comment["_id"].as_str().unwrap().to_string();

    // The parent post now lists the comment exactly once.
    let post = get_post(&client, &address, &user_token, &post_id).await;
    let refs: Vec<&str> = post["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(refs.iter().filter(|id| **id == comment_id).count(), 1);

    // First delete: 204, and the reference disappears.
    let response = client
        .delete(&format!("{}/api/comments/{}", address, comment_id))
        .header("Authorization", format!("Bearer {user_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let post = get_post(&client, &address, &user_token, &post_id).await;
    assert!(post["comments"].as_array().unwrap().is_empty());

    // Second delete: the comment is already gone from normal flow.
    let response = client
        .delete(&format!("{}/api/comments/{}", address, comment_id))
        .header("Authorization", format!("Bearer {user_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_author_mismatch_rejected_without_mutation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, post_id) = seed_post(&client, &address).await;
    let (user_token, _) = login(&client, &address, "user@demo.com", "User123").await;
    let (_, admin_id) = login(&client, &address, "admin@demo.com", "Admin123").await;

    // USER tries to attribute the comment to the admin.
    let response = client
        .post(&format!("{}/api/comments", address))
        .header("Authorization", format!("Bearer {user_token}"))
        .json(&json!({ "content": "Sneaky.", "author": admin_id, "post": post_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Author mismatch");

    // No comment record, no reference on the post.
    let post = get_post(&client, &address, &user_token, &post_id).await;
    assert!(post["comments"].as_array().unwrap().is_empty());

    let response = client
        .get(&format!("{}/api/comments", address))
        .header("Authorization", format!("Bearer {user_token}"))
        .send()
        .await
        .unwrap();
    let comments: Value = response.json().await.unwrap();
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_with_missing_references_creates_nothing() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, post_id) = seed_post(&client, &address).await;
    let (user_token, user_id) = login(&client, &address, "user@demo.com", "User123").await;

    // Well-formed but nonexistent post id.
    let response = client
        .post(&format!("{}/api/comments", address))
        .header("Authorization", format!("Bearer {user_token}"))
        .json(&json!({
            "content": "Into the void.",
            "author": user_id,
            "post": "ffffffffffffffffffffffff",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Post not found");

    // A principal whose id does not exist in the store: passes the ownership
    // check (author == principal) but fails the reference check.
    let ghost_id = "feedfacefeedfacefeedface";
    let now = chrono::Utc::now().timestamp() as usize;
    let ghost_token = encode(
        &Header::default(),
        &Claims {
            id: ghost_id.to_string(),
            roles: vec![Role::User],
            iat: now,
            exp: now + 3600,
        },
        &EncodingKey::from_secret(b"defaultSecret"),
    )
    .unwrap();

    let response = client
        .post(&format!("{}/api/comments", address))
        .header("Authorization", format!("Bearer {ghost_token}"))
        .json(&json!({ "content": "Who am I?", "author": ghost_id, "post": post_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User not found");

    // Neither attempt created a record or touched the post.
    let post = get_post(&client, &address, &user_token, &post_id).await;
    assert!(post["comments"].as_array().unwrap().is_empty());

    let response = client
        .get(&format!("{}/api/comments", address))
        .header("Authorization", format!("Bearer {user_token}"))
        .send()
        .await
        .unwrap();
    let comments: Value = response.json().await.unwrap();
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_soft_delete_protocol() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (admin_token, post_id) = seed_post(&client, &address).await;

    // Deleting a well-formed id that never existed: 404, nothing changes.
    let response = client
        .delete(&format!("{}/api/posts/ffffffffffffffffffffffff", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Deleting the real one: 204 with an empty body.
    let response = client
        .delete(&format!("{}/api/posts/{}", address, post_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert!(response.bytes().await.unwrap().is_empty());

    // Excluded from list and get; a second delete finds nothing.
    let response = client
        .get(&format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    let posts: Value = response.json().await.unwrap();
    assert!(posts.as_array().unwrap().is_empty());

    let response = client
        .get(&format!("{}/api/posts/{}", address, post_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        format!("Post with id {} was not found", post_id)
    );

    let response = client
        .delete(&format!("{}/api/posts/{}", address, post_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_post_partial_update() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (admin_token, post_id) = seed_post(&client, &address).await;

    let response = client
        .put(&format!("{}/api/posts/{}", address, post_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({ "title": "On tombstones" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let post: Value = response.json().await.unwrap();
    assert_eq!(post["title"], "On tombstones");
    // Unlisted fields are untouched.
    assert_eq!(post["content"], "Nothing is ever really gone.");
    assert_eq!(post["genre"], "Tech");

    // An empty partial update is accepted as a touch.
    let response = client
        .put(&format!("{}/api/posts/{}", address, post_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Unknown id translates to 404, not an error.
    let response = client
        .put(&format!("{}/api/posts/ffffffffffffffffffffffff", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({ "title": "Ghost post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_posts_by_genre_and_author() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (admin_token, admin_id) = login(&client, &address, "admin@demo.com", "Admin123").await;
    for (title, genre) in [("A", "Tech"), ("B", "Cooking")] {
        let response = client
            .post(&format!("{}/api/posts", address))
            .header("Authorization", format!("Bearer {admin_token}"))
            .json(&json!({
                "title": format!("Post {title}"),
                "content": "c",
                "author": admin_id,
                "genre": genre,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    // Case-insensitive substring match.
    for (fragment, expected) in [("TECH", 1), ("ook", 1), ("c", 2), ("zzz", 0)] {
        let response = client
            .get(&format!("{}/api/posts/genre/{}", address, fragment))
            .header("Authorization", format!("Bearer {admin_token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let posts: Value = response.json().await.unwrap();
        assert_eq!(posts.as_array().unwrap().len(), expected, "fragment: {fragment}");
    }

    // Author filter resolves the author's display name.
    let response = client
        .get(&format!("{}/api/posts/author/{}", address, admin_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let posts: Value = response.json().await.unwrap();
    assert_eq!(posts.as_array().unwrap().len(), 2);
    assert_eq!(posts[0]["author"], "Demo Admin");

    // Unknown author: checked explicitly, 400 rather than an empty list.
    let response = client
        .get(&format!("{}/api/posts/author/ffffffffffffffffffffffff", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_user_management() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (admin_token, _) = login(&client, &address, "admin@demo.com", "Admin123").await;

    // Create: roles default to [USER]; the hash never appears in a response.
    let response = client
        .post(&format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({ "name": "Carol", "email": "carol@demo.com", "password": "Carol123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["roles"], json!(["USER"]));
    assert!(user.get("password").is_none());
    let user_id = user["id"].as_str().unwrap().to_string();

    // The new account can log in.
    login(&client, &address, "carol@demo.com", "Carol123").await;

    // Duplicate email rejected.
    let response = client
        .post(&format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({ "name": "Carol Again", "email": "carol@demo.com", "password": "Carol123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email already in use");

    // Partial update.
    let response = client
        .put(&format!("{}/api/users/{}", address, user_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .json(&json!({ "name": "Caroline" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["name"], "Caroline");
    assert_eq!(user["email"], "carol@demo.com");

    // Soft delete: gone from list and get, record retained internally.
    let response = client
        .delete(&format!("{}/api/users/{}", address, user_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(&format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    let users: Value = response.json().await.unwrap();
    // Just the two seeded accounts remain visible.
    assert_eq!(users.as_array().unwrap().len(), 2);

    let response = client
        .get(&format!("{}/api/users/{}", address, user_id))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_malformed_path_id_is_a_validation_error() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (admin_token, _) = login(&client, &address, "admin@demo.com", "Admin123").await;

    let response = client
        .get(&format!("{}/api/posts/not-an-id", address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Validation errors");
    assert_eq!(body["errors"][0]["field"], "id");
    assert_eq!(body["errors"][0]["value"], "not-an-id");
}
