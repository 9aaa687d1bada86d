use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repository::toggle_membership;
use crate::db::StoreError;
use crate::posts::models::{NewPost, Post};

const POST_COLUMNS: &str = "id, user_id, display_name, location, description, picture_path, \
     user_picture_path, likes, comments, created_at";

/// Storage operations on posts
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    /// The whole feed, newest first
    async fn list(&self) -> Result<Vec<Post>, StoreError>;

    /// Posts by one author, newest first
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, StoreError>;

    /// Atomically add `user_id` to the like set if absent, remove it if present
    ///
    /// Returns `None` when the post does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, StoreError>;
}

/// PostgreSQL-backed post store
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let query = format!(
            r#"
            INSERT INTO posts (id, user_id, display_name, location, description, picture_path, user_picture_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let post = sqlx::query_as::<_, Post>(&query)
            .bind(Uuid::new_v4())
            .bind(post.user_id)
            .bind(&post.display_name)
            .bind(&post.location)
            .bind(&post.description)
            .bind(&post.picture_path)
            .bind(&post.user_picture_path)
            .fetch_one(&self.pool)
            .await?;

        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);

        let post = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let query = format!("SELECT {} FROM posts ORDER BY created_at DESC", POST_COLUMNS);

        let posts = sqlx::query_as::<_, Post>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let query = format!(
            "SELECT {} FROM posts WHERE user_id = $1 ORDER BY created_at DESC",
            POST_COLUMNS
        );

        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, StoreError> {
        // Single statement, so concurrent toggles on the same row serialize in Postgres
        let query = format!(
            r#"
            UPDATE posts
            SET likes = CASE
                WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                ELSE array_append(likes, $2)
            END
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let post = sqlx::query_as::<_, Post>(&query)
            .bind(post_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }
}

/// Process-local post store used by the test suite
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create(&self, new_post: NewPost) -> Result<Post, StoreError> {
        let post = Post {
            id: Uuid::new_v4(),
            user_id: new_post.user_id,
            display_name: new_post.display_name,
            location: new_post.location,
            description: new_post.description,
            picture_path: new_post.picture_path,
            user_picture_path: new_post.user_picture_path,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        };
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.read().await.values().cloned().collect();
        Ok(newest_first(posts))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let posts = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(posts))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>, StoreError> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&post_id).map(|post| {
            toggle_membership(&mut post.likes, user_id);
            post.clone()
        }))
    }
}
