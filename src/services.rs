use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::{
    auth::Claims,
    models::{
        AuthPayload, Comment, CommentResponse, CommentSummary, CreateCommentRequest,
        CreatePostRequest, CreateUserRequest, Post, PostResponse, Role, UpdateCommentRequest,
        UpdatePostRequest, UpdateUserRequest, User, UserResponse,
    },
    store::{StoreError, StoreState},
};

/// ServiceError
///
/// The domain-level failure taxonomy. `ReferenceNotFound` is the only
/// domain-specific error the CRUD protocol produces; everything else is
/// infrastructure and propagates opaquely to the controller boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required related entity ("User", "Post") is absent or soft-deleted.
    #[error("{0} not found")]
    ReferenceNotFound(&'static str),
    /// The email-uniqueness invariant would be violated.
    #[error("email already in use")]
    EmailTaken,
    /// Login failure: unknown email or wrong password, indistinguishable.
    #[error("invalid credentials")]
    NotAuthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Resolves an author id to a display name for response shapes. A user that
/// has been soft-deleted since the entity was written resolves to the raw id.
async fn display_name(store: &StoreState, author_id: &str) -> Result<String, ServiceError> {
    Ok(store
        .find_user(author_id)
        .await?
        .map(|user| user.name)
        .unwrap_or_else(|| author_id.to_string()))
}

fn new_id() -> String {
    ObjectId::new().to_hex()
}

// --- User Service ---

/// UserService
///
/// Create/read/update/soft-delete for users. Passwords are hashed here, before
/// anything touches the store; no service method ever returns the hash.
#[derive(Clone)]
pub struct UserService {
    store: StoreState,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: StoreState, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn get_all(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserResponse>, ServiceError> {
        Ok(self.store.find_user(id).await?.map(UserResponse::from))
    }

    /// create
    ///
    /// Hashes the password and persists the new user. Roles default to
    /// `[USER]` when the request omits them or supplies an empty list.
    pub async fn create(&self, input: CreateUserRequest) -> Result<UserResponse, ServiceError> {
        if self.store.find_user_by_email(&input.email).await?.is_some() {
            return Err(ServiceError::EmailTaken);
        }

        let roles = match input.roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => vec![Role::User],
        };

        let now = Utc::now();
        let user = User {
            id: new_id(),
            name: input.name,
            email: input.email,
            password: bcrypt::hash(&input.password, self.bcrypt_cost)?,
            roles,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        Ok(UserResponse::from(self.store.insert_user(user).await?))
    }

    /// update
    ///
    /// Partial update; a supplied password is re-hashed before it reaches the
    /// store. `None` means no live user with that id (a 404 for the caller,
    /// not an error).
    pub async fn update(
        &self,
        id: &str,
        mut patch: UpdateUserRequest,
    ) -> Result<Option<UserResponse>, ServiceError> {
        if let Some(password) = patch.password.take() {
            patch.password = Some(bcrypt::hash(&password, self.bcrypt_cost)?);
        }
        Ok(self
            .store
            .update_user(id, patch)
            .await?
            .map(UserResponse::from))
    }

    /// Soft-deletes by stamping `deletedAt`. The record itself is retained.
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(self.store.soft_delete_user(id).await?)
    }
}

// --- Post Service ---

/// PostService
///
/// The post side of the shared CRUD protocol, plus the genre and author
/// filtered reads. Creation enforces the cross-reference invariant: the
/// authoring user must exist (and not be soft-deleted) at creation time.
#[derive(Clone)]
pub struct PostService {
    store: StoreState,
}

impl PostService {
    pub fn new(store: StoreState) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<PostResponse>, ServiceError> {
        let posts = self.store.list_posts().await?;
        let mut resolved = Vec::with_capacity(posts.len());
        for post in posts {
            resolved.push(self.resolve(post).await?);
        }
        Ok(resolved)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<PostResponse>, ServiceError> {
        match self.store.find_post(id).await? {
            Some(post) => Ok(Some(self.resolve(post).await?)),
            None => Ok(None),
        }
    }

    /// Case-insensitive substring match on the genre field. No existence
    /// precondition: an unmatched genre is an empty list, never an error.
    pub async fn get_by_genre(&self, genre: &str) -> Result<Vec<PostResponse>, ServiceError> {
        let posts = self.store.find_posts_by_genre(genre).await?;
        let mut resolved = Vec::with_capacity(posts.len());
        for post in posts {
            resolved.push(self.resolve(post).await?);
        }
        Ok(resolved)
    }

    /// get_by_author
    ///
    /// Fails with `ReferenceNotFound("User")` when the user does not exist,
    /// checked explicitly, independent of whether the user has any posts.
    pub async fn get_by_author(&self, user_id: &str) -> Result<Vec<PostResponse>, ServiceError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::ReferenceNotFound("User"));
        }
        let posts = self.store.find_posts_by_author(user_id).await?;
        let mut resolved = Vec::with_capacity(posts.len());
        for post in posts {
            resolved.push(self.resolve(post).await?);
        }
        Ok(resolved)
    }

    /// create
    ///
    /// Validates the author reference, then persists. The comments list always
    /// starts empty: it is derived state owned by the comment service.
    pub async fn create(&self, input: CreatePostRequest) -> Result<Post, ServiceError> {
        if self.store.find_user(&input.author).await?.is_none() {
            return Err(ServiceError::ReferenceNotFound("User"));
        }

        let now = Utc::now();
        let post = Post {
            id: new_id(),
            title: input.title,
            content: input.content,
            author: input.author,
            genre: input.genre,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        Ok(self.store.insert_post(post).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: UpdatePostRequest,
    ) -> Result<Option<Post>, ServiceError> {
        Ok(self.store.update_post(id, patch).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(self.store.soft_delete_post(id).await?)
    }

    /// Resolves a post for display: author id becomes the display name, each
    /// live comment id becomes an id/content summary. Comment ids pointing at
    /// soft-deleted comments are skipped rather than surfaced.
    async fn resolve(&self, post: Post) -> Result<PostResponse, ServiceError> {
        let author = display_name(&self.store, &post.author).await?;

        let mut comments = Vec::with_capacity(post.comments.len());
        for comment_id in &post.comments {
            if let Some(comment) = self.store.find_comment(comment_id).await? {
                comments.push(CommentSummary {
                    id: comment.id,
                    content: comment.content,
                });
            }
        }

        Ok(PostResponse {
            id: post.id,
            title: post.title,
            content: post.content,
            author,
            genre: post.genre,
            comments,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}

// --- Comment Service ---

/// CommentService
///
/// The comment side of the CRUD protocol. Owns the bidirectional link with the
/// parent post: creation appends the comment id to the post's list, deletion
/// removes it, so no orphaned reference persists once a comment is gone.
#[derive(Clone)]
pub struct CommentService {
    store: StoreState,
}

impl CommentService {
    pub fn new(store: StoreState) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<CommentResponse>, ServiceError> {
        let comments = self.store.list_comments().await?;
        let mut resolved = Vec::with_capacity(comments.len());
        for comment in comments {
            resolved.push(self.resolve(comment).await?);
        }
        Ok(resolved)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<CommentResponse>, ServiceError> {
        match self.store.find_comment(id).await? {
            Some(comment) => Ok(Some(self.resolve(comment).await?)),
            None => Ok(None),
        }
    }

    /// Fails with `ReferenceNotFound("User")` when the user does not exist,
    /// even when the result would simply be empty.
    pub async fn get_by_author(
        &self,
        user_id: &str,
    ) -> Result<Vec<CommentResponse>, ServiceError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::ReferenceNotFound("User"));
        }
        let comments = self.store.find_comments_by_author(user_id).await?;
        let mut resolved = Vec::with_capacity(comments.len());
        for comment in comments {
            resolved.push(self.resolve(comment).await?);
        }
        Ok(resolved)
    }

    /// create
    ///
    /// Validates both references before anything is written: a missing author
    /// or post means no comment record is created and the parent post's
    /// comments list is never touched. On success the new id is atomically
    /// appended to the parent's list.
    pub async fn create(&self, input: CreateCommentRequest) -> Result<Comment, ServiceError> {
        if self.store.find_user(&input.author).await?.is_none() {
            return Err(ServiceError::ReferenceNotFound("User"));
        }
        if self.store.find_post(&input.post).await?.is_none() {
            return Err(ServiceError::ReferenceNotFound("Post"));
        }

        let now = Utc::now();
        let comment = Comment {
            id: new_id(),
            content: input.content,
            author: input.author,
            post: input.post,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let comment = self.store.insert_comment(comment).await?;

        // The post existed a moment ago; losing the race against its deletion
        // still surfaces as a missing reference rather than silent success.
        if !self
            .store
            .push_comment_ref(&comment.post, &comment.id)
            .await?
        {
            return Err(ServiceError::ReferenceNotFound("Post"));
        }

        Ok(comment)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: UpdateCommentRequest,
    ) -> Result<Option<Comment>, ServiceError> {
        Ok(self.store.update_comment(id, patch).await?)
    }

    /// delete
    ///
    /// Soft-deletes the comment and removes its id from the parent post's
    /// list in the same logical operation. A store failure during the
    /// secondary update propagates; it is never swallowed.
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let Some(comment) = self.store.find_comment(id).await? else {
            return Ok(false);
        };

        if !self.store.soft_delete_comment(id).await? {
            return Ok(false);
        }

        self.store.pull_comment_ref(&comment.post, id).await?;
        Ok(true)
    }

    async fn resolve(&self, comment: Comment) -> Result<CommentResponse, ServiceError> {
        let author = display_name(&self.store, &comment.author).await?;
        Ok(CommentResponse {
            id: comment.id,
            content: comment.content,
            author,
            post: comment.post,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }
}

// --- Auth Service ---

/// AuthService
///
/// Credential verification and token issue. Deliberately cannot tell a caller
/// whether the email or the password was wrong.
#[derive(Clone)]
pub struct AuthService {
    store: StoreState,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(store: StoreState, jwt_secret: String) -> Self {
        Self { store, jwt_secret }
    }

    /// login
    ///
    /// Looks the user up by email (the one read path that includes the stored
    /// hash), compares via bcrypt's one-way verify, and on success issues a
    /// signed token embedding `{ id, roles }` with a one-hour expiry.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ServiceError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Err(ServiceError::NotAuthorized);
        };

        if !bcrypt::verify(password, &user.password)? {
            return Err(ServiceError::NotAuthorized);
        }

        let token = self.generate_token(&user)?;
        Ok(AuthPayload {
            id: user.id,
            roles: user.roles,
            token,
        })
    }

    /// generate_token
    ///
    /// Pure function from a user's id/roles to a signed token string; does not
    /// touch the store.
    pub fn generate_token(&self, user: &User) -> Result<String, ServiceError> {
        let iat = Utc::now().timestamp() as usize;
        let claims = Claims {
            id: user.id.clone(),
            roles: user.roles.clone(),
            iat,
            exp: iat + 3600,
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }
}

// --- Bootstrap Seeding ---

/// seed_demo_users
///
/// Ensures the two demo accounts exist. Keyed by email, so running it on every
/// startup is idempotent.
pub async fn seed_demo_users(store: &StoreState, bcrypt_cost: u32) -> Result<(), ServiceError> {
    let accounts: [(&str, &str, &str, Vec<Role>); 2] = [
        (
            "Demo Admin",
            "admin@demo.com",
            "Admin123",
            vec![Role::Admin, Role::User],
        ),
        ("Demo User", "user@demo.com", "User123", vec![Role::User]),
    ];

    for (name, email, password, roles) in accounts {
        if store.find_user_by_email(email).await?.is_none() {
            let now = Utc::now();
            store
                .insert_user(User {
                    id: new_id(),
                    name: name.to_string(),
                    email: email.to_string(),
                    password: bcrypt::hash(password, bcrypt_cost)?,
                    roles,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                })
                .await?;
            tracing::info!("seeded demo account {email}");
        }
    }

    Ok(())
}
