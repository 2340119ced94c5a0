use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to the Document Store) ---

/// Role
///
/// The RBAC primitive. Roles form an unordered set per user; membership is the
/// only authorization check performed anywhere in the application. There is no
/// hierarchy: ADMIN does not imply USER unless both are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

/// User
///
/// The canonical user document stored in the `users` collection.
///
/// This is the *persistence* shape: it carries the bcrypt password hash and is
/// never serialized to a client. HTTP responses use [`UserResponse`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    // Canonical 24-hex-character document id.
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    // Unique across the collection (index created at startup).
    pub email: String,
    // bcrypt hash. Write-only: excluded from every response shape.
    pub password: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Soft-delete marker. A non-null value excludes the document from all
    // normal-flow queries; documents are never physically removed.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Post
///
/// A blog post document from the `posts` collection. The `comments` field holds
/// the ordered ids of the post's comments and is kept consistent by the comment
/// service: creating a comment appends its id, deleting a comment removes it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    // Id of the authoring User. Must reference an existing, non-deleted user
    // at creation time; not re-validated on reads.
    pub author: String,
    pub genre: String,
    pub comments: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Comment
///
/// A comment document from the `comments` collection. Both `author` and `post`
/// must reference existing, non-deleted documents at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub author: String,
    pub post: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// --- Response Shapes (Output Schemas) ---

/// UserResponse
///
/// The client-facing user shape. Identical to [`User`] minus the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<Role>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// CommentSummary
///
/// The short comment view embedded in a resolved post.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentSummary {
    pub id: String,
    pub content: String,
}

/// PostResponse
///
/// A post resolved for display: the author id is replaced by the author's
/// display name and the comment ids by [`CommentSummary`] entries.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub genre: String,
    pub comments: Vec<CommentSummary>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CommentResponse
///
/// A comment resolved for display (author id replaced by display name).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub author: String,
    pub post: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// AuthPayload
///
/// The signed session issued on a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthPayload {
    pub id: String,
    pub roles: Vec<Role>,
    pub token: String,
}

/// LoginResponse
///
/// Envelope returned by the login endpoint: `{ "token": { id, roles, token } }`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: AuthPayload,
}

/// CreateUserRequest
///
/// Input payload for creating a user. The password arrives in plaintext and is
/// hashed by the user service before anything is persisted. Roles default to
/// `[USER]` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// UpdateUserRequest
///
/// Partial update payload for a user.
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so that serializing the payload yields exactly the fields to `$set`, leaving
/// the rest of the document untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

/// CreatePostRequest
///
/// Input payload for creating a post. The `author` field must equal the
/// authenticated principal's id (enforced at the controller) and reference an
/// existing user (enforced at the service). The comments list always starts
/// empty; it is derived state owned by the comment service.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub author: String,
    pub genre: String,
}

/// UpdatePostRequest
///
/// Partial update payload for a post. Same `$set` projection trick as
/// [`UpdateUserRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
    pub author: String,
    pub post: String,
}

/// UpdateCommentRequest
///
/// Partial update payload for a comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
