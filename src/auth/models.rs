// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub location: Option<String>,
    pub occupation: Option<String>,
    pub picture_path: Option<String>,
    pub viewed_profile: i32,
    pub impressions: i32,
    pub friends: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user; id and timestamp are assigned by the service
#[derive(Debug, Clone)]
pub struct NewUser {
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub location: Option<String>,
    pub occupation: Option<String>,
    pub picture_path: Option<String>,
    pub viewed_profile: i32,
    pub impressions: i32,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Jane Doe")]
    pub display_name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub location: Option<String>,
    pub occupation: Option<String>,
    pub picture_path: Option<String>,
    pub viewed_profile: i32,
    pub impressions: i32,
    pub friends: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            email: user.email,
            location: user.location,
            occupation: user.occupation,
            picture_path: user.picture_path,
            viewed_profile: user.viewed_profile,
            impressions: user.impressions,
            friends: user.friends,
            created_at: user.created_at,
        }
    }
}

/// Registration request, assembled from the multipart form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50), custom = "validate_not_blank")]
    pub display_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
}

/// Shape of the multipart registration form, for the API docs only
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RegisterForm {
    display_name: String,
    email: String,
    password: String,
    location: Option<String>,
    occupation: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    picture: Option<Vec<u8>>,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Login response: the session token plus the public user record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
