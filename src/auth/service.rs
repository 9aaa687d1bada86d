// Authentication service - business logic layer

use rand::Rng;
use std::sync::Arc;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, UserResponse},
    password::PasswordService,
    repository::UserStore,
    token::TokenService,
};
use crate::uploads::{self, UploadConfig, UploadRequest};
use crate::validation::{non_empty, normalize_email};

/// Authentication service coordinating registration and login
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    uploads: UploadConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, uploads: UploadConfig) -> Self {
        Self {
            users,
            tokens,
            uploads,
        }
    }

    /// Register a new user
    ///
    /// 1. Validates the request
    /// 2. Rejects an email that is already registered
    /// 3. Hashes the password
    /// 4. Stores the optional picture
    /// 5. Persists the user
    pub async fn register(
        &self,
        mut request: RegisterRequest,
        picture: Option<UploadRequest>,
    ) -> Result<UserResponse, AuthError> {
        // limits apply to what gets stored
        request.display_name = request.display_name.trim().to_string();
        request.location = non_empty(request.location);
        request.occupation = non_empty(request.occupation);
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.users.email_exists(&email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = PasswordService::hash_password_blocking(request.password).await?;

        let stored = match picture {
            Some(picture) => Some(uploads::store(&self.uploads, &picture).await?),
            None => None,
        };

        let (viewed_profile, impressions) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..10_000), rng.gen_range(0..10_000))
        };

        let new_user = NewUser {
            display_name: request.display_name,
            email,
            password_hash,
            location: request.location,
            occupation: request.occupation,
            picture_path: stored.as_ref().map(|s| s.file.file_name.clone()),
            viewed_profile,
            impressions,
        };

        let user = match self.users.create(new_user).await {
            Ok(user) => user,
            Err(e) => {
                if let Some(stored) = &stored {
                    uploads::discard(stored).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!("Registered user {}", user.id);
        Ok(user.into())
    }

    /// Check credentials and issue a session token
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let matches =
            PasswordService::verify_password_blocking(request.password, user.password_hash.clone())
                .await?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;

        tracing::info!("User {} logged in", user.id);
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::InMemoryUserStore;

    fn service() -> AuthService {
        service_with_ttl(3600)
    }

    fn service_with_ttl(ttl: i64) -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserStore::new()),
            TokenService::new("service-test-secret".to_string(), ttl),
            UploadConfig::new(std::env::temp_dir().join("social-api-auth-tests"), 1024 * 1024),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            display_name: "Jane Doe".to_string(),
            email: email.to_string(),
            password: "correct horse battery".to_string(),
            location: Some("Lisbon".to_string()),
            occupation: Some("".to_string()),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_user_without_hash() {
        let service = service();
        let user = service
            .register(register_request("jane@example.com"), None)
            .await
            .unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.location.as_deref(), Some("Lisbon"));
        assert_eq!(user.occupation, None);
        assert!(user.friends.is_empty());
        assert!((0..10_000).contains(&user.viewed_profile));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let service = service();
        service
            .register(register_request("dup@example.com"), None)
            .await
            .unwrap();

        let second = service.register(register_request("dup@example.com"), None).await;
        assert!(matches!(second, Err(AuthError::DuplicateEmail)));

        let shouting = service.register(register_request("DUP@Example.com"), None).await;
        assert!(matches!(shouting, Err(AuthError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let service = service();
        let mut request = register_request("not-an-email");
        let result = service.register(request.clone(), None).await;
        assert!(matches!(result, Err(AuthError::ValidationError(_))));

        request.email = "ok@example.com".to_string();
        request.password = "short".to_string();
        let result = service.register(request, None).await;
        assert!(matches!(result, Err(AuthError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_length_limits_apply_after_trimming() {
        let service = service();
        let mut request = register_request("padded@example.com");
        request.display_name = format!("  {}  ", "a".repeat(50));
        request.location = Some(format!(" {} ", "b".repeat(100)));

        let user = service.register(request, None).await.unwrap();
        assert_eq!(user.display_name.len(), 50);
        assert_eq!(user.location.map(|l| l.len()), Some(100));
    }

    #[tokio::test]
    async fn test_register_rejects_non_image_upload() {
        let service = service();
        let picture = UploadRequest {
            original_name: "payload.sh".to_string(),
            content_type: Some("application/x-sh".to_string()),
            bytes: b"#!/bin/sh".to_vec(),
        };

        let result = service
            .register(register_request("up@example.com"), Some(picture))
            .await;
        assert!(matches!(result, Err(AuthError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_login_with_correct_password_issues_verifiable_token() {
        let service = service();
        let user = service
            .register(register_request("login@example.com"), None)
            .await
            .unwrap();

        let response = service
            .login(login_request("login@example.com", "correct horse battery"))
            .await
            .unwrap();

        assert_eq!(response.user.id, user.id);
        assert_eq!(service.tokens().verify(&response.token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let service = service();
        service
            .register(register_request("wrong@example.com"), None)
            .await
            .unwrap();

        let result = service
            .login(login_request("wrong@example.com", "not the password"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_fails() {
        let result = service()
            .login(login_request("ghost@example.com", "whatever123"))
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_zero_ttl_login_token_is_expired() {
        let service = service_with_ttl(0);
        service
            .register(register_request("ttl@example.com"), None)
            .await
            .unwrap();

        let response = service
            .login(login_request("ttl@example.com", "correct horse battery"))
            .await
            .unwrap();
        assert!(matches!(
            service.tokens().verify(&response.token),
            Err(AuthError::ExpiredToken)
        ));
    }
}
