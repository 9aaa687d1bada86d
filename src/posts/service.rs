use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::repository::UserStore;
use crate::error::ApiError;
use crate::posts::models::{CreatePostRequest, NewPost, Post};
use crate::posts::repository::PostStore;
use crate::uploads::{self, UploadConfig, UploadRequest};

/// Service layer for post business logic
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    uploads: UploadConfig,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>, uploads: UploadConfig) -> Self {
        Self {
            posts,
            users,
            uploads,
        }
    }

    /// Create a post on behalf of the authenticated user
    ///
    /// 1. Validates the request
    /// 2. Rejects an explicit author that differs from the caller
    /// 3. Looks up the author (denormalised onto the post)
    /// 4. Stores the optional picture
    /// 5. Persists the post
    pub async fn create_post(
        &self,
        caller: Uuid,
        mut request: CreatePostRequest,
        picture: Option<UploadRequest>,
    ) -> Result<Post, ApiError> {
        request.description = request.description.trim().to_string();
        request.validate()?;

        if let Some(author_id) = request.user_id {
            if author_id != caller {
                return Err(ApiError::Forbidden(format!(
                    "user {} cannot post as {}",
                    caller, author_id
                )));
            }
        }

        let author = self
            .users
            .find_by_id(caller)
            .await?
            .ok_or_else(|| ApiError::not_found("User", caller))?;

        let stored = match picture {
            Some(picture) => Some(uploads::store(&self.uploads, &picture).await?),
            None => None,
        };

        let new_post = NewPost {
            user_id: author.id,
            display_name: author.display_name,
            location: author.location,
            description: request.description,
            picture_path: stored.as_ref().map(|s| s.file.file_name.clone()),
            user_picture_path: author.picture_path,
        };

        let post = match self.posts.create(new_post).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(stored) = &stored {
                    uploads::discard(stored).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!("User {} created post {}", caller, post.id);
        Ok(post)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let posts = self.posts.list().await?;
        tracing::debug!("Retrieved {} posts", posts.len());
        Ok(posts)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, ApiError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post", id))
    }

    pub async fn list_user_posts(&self, user_id: Uuid) -> Result<Vec<Post>, ApiError> {
        Ok(self.posts.list_by_user(user_id).await?)
    }

    /// Toggle the caller's like on a post; a second call undoes the first
    pub async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Post, ApiError> {
        let post = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post", post_id))?;

        tracing::info!(
            "User {} {} post {}",
            user_id,
            if post.is_liked_by(user_id) { "liked" } else { "unliked" },
            post_id
        );
        Ok(post)
    }
}
