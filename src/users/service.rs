use std::sync::Arc;
use uuid::Uuid;

use crate::auth::models::UserResponse;
use crate::auth::repository::UserStore;
use crate::error::ApiError;
use crate::users::models::FriendResponse;

/// Read access to users plus the friendship toggle
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ApiError> {
        let users = self.users.list().await?;
        tracing::debug!("Retrieved {} users", users.len());
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserResponse, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ApiError::not_found("User", id))
    }

    pub async fn get_user_friends(&self, id: Uuid) -> Result<Vec<FriendResponse>, ApiError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", id))?;

        let friends = self.users.find_many(&user.friends).await?;
        Ok(friends.into_iter().map(FriendResponse::from).collect())
    }

    /// Add or remove a friend; only the user themselves may change their list
    ///
    /// Returns the caller's friend list after the change.
    pub async fn add_remove_friend(
        &self,
        caller: Uuid,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Vec<FriendResponse>, ApiError> {
        if caller != user_id {
            return Err(ApiError::Forbidden(format!(
                "user {} cannot change friends of {}",
                caller, user_id
            )));
        }
        if user_id == friend_id {
            return Err(ApiError::ValidationError(
                "a user cannot befriend themselves".to_string(),
            ));
        }

        let updated = match self.users.toggle_friendship(user_id, friend_id).await? {
            Some(user) => user,
            None => {
                // report whichever side is missing
                let missing = match self.users.find_by_id(user_id).await? {
                    Some(_) => friend_id,
                    None => user_id,
                };
                return Err(ApiError::not_found("User", missing));
            }
        };

        tracing::info!(
            "User {} {} {}",
            user_id,
            if updated.friends.contains(&friend_id) { "befriended" } else { "unfriended" },
            friend_id
        );

        let friends = self.users.find_many(&updated.friends).await?;
        Ok(friends.into_iter().map(FriendResponse::from).collect())
    }
}
