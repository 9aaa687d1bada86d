// HTTP handlers for authentication endpoints

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, RegisterForm, RegisterRequest, UserResponse},
};
use crate::error::ErrorResponse;
use crate::uploads::{MultipartForm, PICTURE_FIELD};
use crate::AppState;

/// Register a new user
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body(content = RegisterForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    let mut form = MultipartForm::from_multipart(multipart).await?;
    let picture = form.take_file(PICTURE_FIELD);

    let request = RegisterRequest {
        display_name: form.text("display_name").unwrap_or_default(),
        email: form.text("email").unwrap_or_default(),
        password: form.text("password").unwrap_or_default(),
        location: form.text("location"),
        occupation: form.text("occupation"),
    };
    tracing::debug!("Registering user with email: {}", request.email);

    let user = state.auth.register(request, picture).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive a session token
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 404, description = "User does not exist", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}
