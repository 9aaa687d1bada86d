use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

/// A post in the feed
///
/// Author fields are copied from the user at creation time; `likes` holds the
/// ids of users who currently like the post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "Jane Doe")]
    pub display_name: String,
    pub location: Option<String>,
    #[schema(example = "Sunset over the harbour")]
    pub description: String,
    #[schema(example = "harbour.jpg")]
    pub picture_path: Option<String>,
    pub user_picture_path: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}

/// Fields needed to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub display_name: String,
    pub location: Option<String>,
    pub description: String,
    pub picture_path: Option<String>,
    pub user_picture_path: Option<String>,
}

/// Create-post request, assembled from the multipart form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(
        length(min = 1, max = 2000, message = "Description must be between 1 and 2000 characters"),
        custom = "validate_not_blank"
    )]
    pub description: String,
    /// Optional explicit author; must match the token subject when present
    pub user_id: Option<Uuid>,
}

/// Shape of the multipart create-post form, for the API docs only
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CreatePostForm {
    description: String,
    user_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Binary)]
    picture: Option<Vec<u8>>,
}
