use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState,
    auth::Principal,
    error::ApiError,
    models::{
        Comment, CommentResponse, CreateCommentRequest, CreatePostRequest, CreateUserRequest,
        LoginRequest, LoginResponse, Post, PostResponse, UpdateCommentRequest, UpdatePostRequest,
        UpdateUserRequest, UserResponse,
    },
    validate,
};

/// Deserializes a body that already passed field validation. Anything serde
/// still rejects (a well-shaped field of the wrong JSON type, e.g. a numeric
/// roles list) is a client error, not ours.
fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|_| ApiError::BadRequest("Malformed request body".to_string()))
}

// --- Auth ---

/// login
///
/// [Public Route] Verifies credentials and issues a signed session token.
/// Unknown email and wrong password are deliberately indistinguishable.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate::body(validate::LOGIN_RULES, &body)?;
    let payload: LoginRequest = parse_body(body)?;

    let token = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse { token }))
}

// --- Users ---

/// get_users
///
/// [Admin Route] Lists all live (non-deleted) users.
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "Users", body = [UserResponse]))
)]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    Ok(Json(state.users.get_all().await?))
}

/// get_user
///
/// [Admin Route] Retrieves a single user by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    validate::path_id("id", &id)?;
    match state.users.get_by_id(&id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound(format!("User with id {id} was not found"))),
    }
}

/// create_user
///
/// [Admin Route] Creates a user. The password is hashed by the service; the
/// response shape never includes it.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses((status = 201, description = "Created", body = UserResponse))
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate::body(validate::USER_CREATE_RULES, &body)?;
    let payload: CreateUserRequest = parse_body(body)?;

    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// update_user
///
/// [Admin Route] Partial update. An empty body is accepted and acts as an
/// `updatedAt` touch.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<UserResponse>, ApiError> {
    validate::path_id("id", &id)?;
    validate::body(validate::USER_UPDATE_RULES, &body)?;
    let payload: UpdateUserRequest = parse_body(body)?;

    match state.users.update(&id, payload).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound(format!("User with id {id} was not found"))),
    }
}

/// delete_user
///
/// [Admin Route] Soft-deletes a user. 204 on success, 404 when no live user
/// matched. Deleting twice is therefore 204 then 404.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate::path_id("id", &id)?;
    if state.users.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User with id {id} was not found")))
    }
}

// --- Posts ---

/// get_posts
///
/// [Authenticated Route] Lists all live posts, resolved for display
/// (author name, comment summaries), in insertion order.
#[utoipa::path(
    get,
    path = "/api/posts",
    responses((status = 200, description = "Posts", body = [PostResponse]))
)]
pub async fn get_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    Ok(Json(state.posts.get_all().await?))
}

/// get_post
///
/// [Authenticated Route] Retrieves a single resolved post by id.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    validate::path_id("id", &id)?;
    match state.posts.get_by_id(&id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound(format!("Post with id {id} was not found"))),
    }
}

/// get_posts_by_genre
///
/// [Authenticated Route] Case-insensitive substring search on the genre
/// field. An unmatched genre yields an empty list, never an error.
#[utoipa::path(
    get,
    path = "/api/posts/genre/{genre}",
    params(("genre" = String, Path, description = "Genre fragment")),
    responses((status = 200, description = "Posts", body = [PostResponse]))
)]
pub async fn get_posts_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    Ok(Json(state.posts.get_by_genre(&genre).await?))
}

/// get_posts_by_author
///
/// [Authenticated Route] Lists a user's posts. The user's existence is
/// checked explicitly: an unknown author id is a 400, not an empty list.
#[utoipa::path(
    get,
    path = "/api/posts/author/{user_id}",
    params(("user_id" = String, Path, description = "Author's user ID")),
    responses(
        (status = 200, description = "Posts", body = [PostResponse]),
        (status = 400, description = "User not found")
    )
)]
pub async fn get_posts_by_author(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    validate::path_id("user_id", &user_id)?;
    Ok(Json(state.posts.get_by_author(&user_id).await?))
}

/// create_post
///
/// [Admin Route] Creates a post. Two checks guard the service call: the
/// `author` field must equal the authenticated principal's id (a pure
/// identity comparison, independent of the role gate), and the referenced
/// user must exist.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "User not found"),
        (status = 403, description = "Author mismatch")
    )
)]
pub async fn create_post(
    principal: Principal,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    validate::body(validate::POST_CREATE_RULES, &body)?;
    let payload: CreatePostRequest = parse_body(body)?;

    if payload.author != principal.id {
        return Err(ApiError::AuthorMismatch);
    }

    let post = state.posts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Admin Route] Partial update of title/content/genre.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Post>, ApiError> {
    validate::path_id("id", &id)?;
    validate::body(validate::POST_UPDATE_RULES, &body)?;
    let payload: UpdatePostRequest = parse_body(body)?;

    match state.posts.update(&id, payload).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound(format!("Post with id {id} was not found"))),
    }
}

/// delete_post
///
/// [Admin Route] Soft-deletes a post.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate::path_id("id", &id)?;
    if state.posts.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Post with id {id} was not found")))
    }
}

// --- Comments ---

/// get_comments
///
/// [Authenticated Route] Lists all live comments, resolved for display.
#[utoipa::path(
    get,
    path = "/api/comments",
    responses((status = 200, description = "Comments", body = [CommentResponse]))
)]
pub async fn get_comments(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    Ok(Json(state.comments.get_all().await?))
}

/// get_comment
///
/// [Authenticated Route] Retrieves a single resolved comment by id.
#[utoipa::path(
    get,
    path = "/api/comments/{id}",
    params(("id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Found", body = CommentResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, ApiError> {
    validate::path_id("id", &id)?;
    match state.comments.get_by_id(&id).await? {
        Some(comment) => Ok(Json(comment)),
        None => Err(ApiError::NotFound(format!(
            "Comment with id {id} was not found"
        ))),
    }
}

/// get_comments_by_author
///
/// [Authenticated Route] Lists a user's comments; unknown user id is a 400.
#[utoipa::path(
    get,
    path = "/api/comments/author/{user_id}",
    params(("user_id" = String, Path, description = "Author's user ID")),
    responses(
        (status = 200, description = "Comments", body = [CommentResponse]),
        (status = 400, description = "User not found")
    )
)]
pub async fn get_comments_by_author(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    validate::path_id("user_id", &user_id)?;
    Ok(Json(state.comments.get_by_author(&user_id).await?))
}

/// create_comment
///
/// [User Route] Posts a new comment. Same ownership check as post creation;
/// the service then validates both references and appends the new id to the
/// parent post's comments list.
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 400, description = "User or Post not found"),
        (status = 403, description = "Author mismatch")
    )
)]
pub async fn create_comment(
    principal: Principal,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    validate::body(validate::COMMENT_CREATE_RULES, &body)?;
    let payload: CreateCommentRequest = parse_body(body)?;

    if payload.author != principal.id {
        return Err(ApiError::AuthorMismatch);
    }

    let comment = state.comments.create(payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// update_comment
///
/// [User Route] Partial update of a comment's content.
#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    params(("id" = String, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Comment>, ApiError> {
    validate::path_id("id", &id)?;
    validate::body(validate::COMMENT_UPDATE_RULES, &body)?;
    let payload: UpdateCommentRequest = parse_body(body)?;

    match state.comments.update(&id, payload).await? {
        Some(comment) => Ok(Json(comment)),
        None => Err(ApiError::NotFound(format!(
            "Comment with id {id} was not found"
        ))),
    }
}

/// delete_comment
///
/// [User Route] Soft-deletes a comment and removes its id from the parent
/// post's comments list in the same logical operation.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = String, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate::path_id("id", &id)?;
    if state.comments.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "Comment with id {id} was not found"
        )))
    }
}
