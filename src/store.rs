use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{Bson, doc},
    options::{IndexOptions, ReturnDocument},
};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::models::{
    Comment, Post, UpdateCommentRequest, UpdatePostRequest, UpdateUserRequest, User,
};

/// StoreError
///
/// Failures at the document-store boundary. These are infrastructure errors:
/// services propagate them opaquely and the controller masks them as 500s.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
}

/// Store Trait
///
/// Defines the abstract contract for all persistence operations: per-collection
/// lookups, inserts, partial updates, soft deletes, and the atomic array
/// push/pull keeping a post's comment list consistent. This is the core of the
/// Repository Abstraction pattern, allowing the services to interact with the
/// data layer without knowing the concrete implementation (Mongo, Memory).
///
/// All "find" and "list" methods implement the soft-delete protocol: documents
/// with a non-null `deletedAt` are invisible to them. Nothing here ever
/// physically removes a document.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Store>`) safely shareable across Axum's asynchronous task
/// boundaries.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    // Lookup for the login path. Unlike every response shape, the returned
    // document includes the password hash.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    // Partial update; refreshes `updatedAt`. None if no live document matched.
    async fn update_user(
        &self,
        id: &str,
        patch: UpdateUserRequest,
    ) -> Result<Option<User>, StoreError>;
    // Sets `deletedAt`; true only if a live document was marked.
    async fn soft_delete_user(&self, id: &str) -> Result<bool, StoreError>;

    // --- Posts ---
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;
    async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError>;
    async fn find_posts_by_author(&self, author: &str) -> Result<Vec<Post>, StoreError>;
    // Case-insensitive substring match on the genre field.
    async fn find_posts_by_genre(&self, genre: &str) -> Result<Vec<Post>, StoreError>;
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError>;
    async fn update_post(
        &self,
        id: &str,
        patch: UpdatePostRequest,
    ) -> Result<Option<Post>, StoreError>;
    async fn soft_delete_post(&self, id: &str) -> Result<bool, StoreError>;
    // Atomic append/removal of a comment id on the parent post's list.
    async fn push_comment_ref(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError>;
    async fn pull_comment_ref(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError>;

    // --- Comments ---
    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError>;
    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, StoreError>;
    async fn find_comments_by_author(&self, author: &str) -> Result<Vec<Comment>, StoreError>;
    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError>;
    async fn update_comment(
        &self,
        id: &str,
        patch: UpdateCommentRequest,
    ) -> Result<Option<Comment>, StoreError>;
    async fn soft_delete_comment(&self, id: &str) -> Result<bool, StoreError>;
}

/// StoreState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type StoreState = Arc<dyn Store>;

// --- The Real Implementation (MongoDB) ---

/// MongoStore
///
/// The concrete implementation of the [`Store`] trait backed by MongoDB.
/// Partial updates use `$set` projections, soft deletes stamp `deletedAt`,
/// and the comment-reference bookkeeping relies on the store's atomic
/// `$push`/`$pull` array operators.
pub struct MongoStore {
    users: Collection<User>,
    posts: Collection<Post>,
    comments: Collection<Comment>,
}

impl MongoStore {
    /// Connects to the `blog` database behind the given URI.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(&client.database("blog")))
    }

    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            users: db.collection("users"),
            posts: db.collection("posts"),
            comments: db.collection("comments"),
        }
    }

    /// ensure_indexes
    ///
    /// Creates the unique index backing the email-uniqueness invariant.
    /// Idempotent; called once at startup.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self.users.find(doc! { "deletedAt": Bson::Null }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .find_one(doc! { "_id": id, "deletedAt": Bson::Null })
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .find_one(doc! { "email": email, "deletedAt": Bson::Null })
            .await?)
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.users.insert_one(&user).await?;
        Ok(user)
    }

    async fn update_user(
        &self,
        id: &str,
        patch: UpdateUserRequest,
    ) -> Result<Option<User>, StoreError> {
        // skip_serializing_if on the patch struct means this document holds
        // exactly the provided fields.
        let mut set = mongodb::bson::to_document(&patch)?;
        set.insert("updatedAt", mongodb::bson::to_bson(&Utc::now())?);

        Ok(self
            .users
            .find_one_and_update(
                doc! { "_id": id, "deletedAt": Bson::Null },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn soft_delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .users
            .update_one(
                doc! { "_id": id, "deletedAt": Bson::Null },
                doc! { "$set": { "deletedAt": mongodb::bson::to_bson(&Utc::now())? } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let cursor = self.posts.find(doc! { "deletedAt": Bson::Null }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        Ok(self
            .posts
            .find_one(doc! { "_id": id, "deletedAt": Bson::Null })
            .await?)
    }

    async fn find_posts_by_author(&self, author: &str) -> Result<Vec<Post>, StoreError> {
        let cursor = self
            .posts
            .find(doc! { "author": author, "deletedAt": Bson::Null })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_posts_by_genre(&self, genre: &str) -> Result<Vec<Post>, StoreError> {
        // Unanchored case-insensitive regex implements the substring match.
        let cursor = self
            .posts
            .find(doc! {
                "genre": { "$regex": regex::escape(genre), "$options": "i" },
                "deletedAt": Bson::Null,
            })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.posts.insert_one(&post).await?;
        Ok(post)
    }

    async fn update_post(
        &self,
        id: &str,
        patch: UpdatePostRequest,
    ) -> Result<Option<Post>, StoreError> {
        let mut set = mongodb::bson::to_document(&patch)?;
        set.insert("updatedAt", mongodb::bson::to_bson(&Utc::now())?);

        Ok(self
            .posts
            .find_one_and_update(
                doc! { "_id": id, "deletedAt": Bson::Null },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn soft_delete_post(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .posts
            .update_one(
                doc! { "_id": id, "deletedAt": Bson::Null },
                doc! { "$set": { "deletedAt": mongodb::bson::to_bson(&Utc::now())? } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn push_comment_ref(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        let result = self
            .posts
            .update_one(
                doc! { "_id": post_id, "deletedAt": Bson::Null },
                doc! { "$push": { "comments": comment_id } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_comment_ref(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        let result = self
            .posts
            .update_one(
                doc! { "_id": post_id, "deletedAt": Bson::Null },
                doc! { "$pull": { "comments": comment_id } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError> {
        let cursor = self.comments.find(doc! { "deletedAt": Bson::Null }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        Ok(self
            .comments
            .find_one(doc! { "_id": id, "deletedAt": Bson::Null })
            .await?)
    }

    async fn find_comments_by_author(&self, author: &str) -> Result<Vec<Comment>, StoreError> {
        let cursor = self
            .comments
            .find(doc! { "author": author, "deletedAt": Bson::Null })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError> {
        self.comments.insert_one(&comment).await?;
        Ok(comment)
    }

    async fn update_comment(
        &self,
        id: &str,
        patch: UpdateCommentRequest,
    ) -> Result<Option<Comment>, StoreError> {
        let mut set = mongodb::bson::to_document(&patch)?;
        set.insert("updatedAt", mongodb::bson::to_bson(&Utc::now())?);

        Ok(self
            .comments
            .find_one_and_update(
                doc! { "_id": id, "deletedAt": Bson::Null },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn soft_delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .comments
            .update_one(
                doc! { "_id": id, "deletedAt": Bson::Null },
                doc! { "$set": { "deletedAt": mongodb::bson::to_bson(&Utc::now())? } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}

// --- The In-Memory Implementation ---

/// MemoryStore
///
/// An in-process implementation of the [`Store`] trait holding each collection
/// in an insertion-ordered vector. Same contract as [`MongoStore`], no I/O:
/// used by the test suite, and handy for local bring-up without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<Post>>,
    comments: Mutex<Vec<Comment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: &str,
        patch: UpdateUserRequest,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id && u.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(password) = patch.password {
            user.password = password;
        }
        if let Some(roles) = patch.roles {
            user.roles = roles;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn soft_delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id && u.deleted_at.is_none()) {
            Some(user) => {
                user.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .filter(|p| p.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .cloned())
    }

    async fn find_posts_by_author(&self, author: &str) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .filter(|p| p.author == author && p.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_posts_by_genre(&self, genre: &str) -> Result<Vec<Post>, StoreError> {
        let needle = genre.to_lowercase();
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .filter(|p| p.deleted_at.is_none() && p.genre.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        id: &str,
        patch: UpdatePostRequest,
    ) -> Result<Option<Post>, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id && p.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(genre) = patch.genre {
            post.genre = genre;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn soft_delete_post(&self, id: &str) -> Result<bool, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.iter_mut().find(|p| p.id == id && p.deleted_at.is_none()) {
            Some(post) => {
                post.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_comment_ref(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        match posts
            .iter_mut()
            .find(|p| p.id == post_id && p.deleted_at.is_none())
        {
            Some(post) => {
                post.comments.push(comment_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_comment_ref(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        match posts
            .iter_mut()
            .find(|p| p.id == post_id && p.deleted_at.is_none())
        {
            Some(post) => {
                post.comments.retain(|c| c != comment_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError> {
        let comments = self.comments.lock().unwrap();
        Ok(comments
            .iter()
            .filter(|c| c.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        let comments = self.comments.lock().unwrap();
        Ok(comments
            .iter()
            .find(|c| c.id == id && c.deleted_at.is_none())
            .cloned())
    }

    async fn find_comments_by_author(&self, author: &str) -> Result<Vec<Comment>, StoreError> {
        let comments = self.comments.lock().unwrap();
        Ok(comments
            .iter()
            .filter(|c| c.author == author && c.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError> {
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(
        &self,
        id: &str,
        patch: UpdateCommentRequest,
    ) -> Result<Option<Comment>, StoreError> {
        let mut comments = self.comments.lock().unwrap();
        let Some(comment) = comments
            .iter_mut()
            .find(|c| c.id == id && c.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if let Some(content) = patch.content {
            comment.content = content;
        }
        comment.updated_at = Utc::now();
        Ok(Some(comment.clone()))
    }

    async fn soft_delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        let mut comments = self.comments.lock().unwrap();
        match comments
            .iter_mut()
            .find(|c| c.id == id && c.deleted_at.is_none())
        {
            Some(comment) => {
                comment.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
