use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::models::User;

/// Compact view of a user as shown in a friend list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FriendResponse {
    pub id: Uuid,
    pub display_name: String,
    pub occupation: Option<String>,
    pub location: Option<String>,
    pub picture_path: Option<String>,
}

impl From<User> for FriendResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            occupation: user.occupation,
            location: user.location,
            picture_path: user.picture_path,
        }
    }
}
