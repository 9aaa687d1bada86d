// HTTP handlers for user endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, UserResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::users::models::FriendResponse;
use crate::validation::parse_id;
use crate::AppState;

/// GET /users
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users, newest first", body = Vec<UserResponse>)),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_users_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    Ok(Json(state.users.list_users().await?))
}

/// GET /users/{id}
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id, "User")?;
    Ok(Json(state.users.get_user(id).await?))
}

/// GET /users/{id}/friends
#[utoipa::path(
    get,
    path = "/users/{id}/friends",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user's friends", body = Vec<FriendResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_friends_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FriendResponse>>, ApiError> {
    let id = parse_id(&id, "User")?;
    Ok(Json(state.users.get_user_friends(id).await?))
}

/// Toggle a friendship
/// PATCH /users/{id}/friends/{friend_id}
#[utoipa::path(
    patch,
    path = "/users/{id}/friends/{friend_id}",
    params(
        ("id" = Uuid, Path, description = "User ID (must be the caller)"),
        ("friend_id" = Uuid, Path, description = "Friend to add or remove")
    ),
    responses(
        (status = 200, description = "Updated friend list", body = Vec<FriendResponse>),
        (status = 403, description = "Not the caller's own list", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn add_remove_friend_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, friend_id)): Path<(String, String)>,
) -> Result<Json<Vec<FriendResponse>>, ApiError> {
    let id = parse_id(&id, "User")?;
    let friend_id = parse_id(&friend_id, "User")?;

    let friends = state
        .users
        .add_remove_friend(user.user_id, id, friend_id)
        .await?;
    Ok(Json(friends))
}
