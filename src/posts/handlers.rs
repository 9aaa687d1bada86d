// HTTP handlers for post endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ErrorResponse};
use crate::posts::models::{CreatePostForm, CreatePostRequest, Post};
use crate::uploads::{MultipartForm, PICTURE_FIELD};
use crate::validation::parse_id;
use crate::AppState;

/// Create a post as the authenticated user
/// POST /posts
#[utoipa::path(
    post,
    path = "/posts",
    request_body(content = CreatePostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Missing token or foreign author", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let mut form = MultipartForm::from_multipart(multipart).await?;
    let picture = form.take_file(PICTURE_FIELD);

    let user_id = match form.text("user_id").filter(|v| !v.trim().is_empty()) {
        Some(raw) => Some(
            raw.trim()
                .parse::<Uuid>()
                .map_err(|_| ApiError::ValidationError(format!("invalid user_id: {}", raw)))?,
        ),
        None => None,
    };
    let request = CreatePostRequest {
        description: form.text("description").unwrap_or_default(),
        user_id,
    };

    let post = state
        .posts
        .create_post(user.user_id, request, picture)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// The feed
/// GET /posts
#[utoipa::path(
    get,
    path = "/posts",
    responses((status = 200, description = "All posts, newest first", body = Vec<Post>)),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_feed_posts_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list_posts().await?))
}

/// GET /posts/{id}
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post found", body = Post),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let id = parse_id(&id, "Post")?;
    Ok(Json(state.posts.get_post(id).await?))
}

/// Posts written by one user
/// GET /users/{id}/posts
#[utoipa::path(
    get,
    path = "/users/{id}/posts",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses((status = 200, description = "The user's posts, newest first", body = Vec<Post>)),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_user_posts_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let user_id = parse_id(&user_id, "User")?;
    Ok(Json(state.posts.list_user_posts(user_id).await?))
}

/// Like or unlike a post
/// PATCH /posts/{id}/like
#[utoipa::path(
    patch,
    path = "/posts/{id}/like",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Updated post", body = Post),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn like_post_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let id = parse_id(&id, "Post")?;
    Ok(Json(state.posts.like_post(id, user.user_id).await?))
}
