//! Social media backend: accounts, session tokens, posts, likes and friends.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod posts;
pub mod uploads;
pub mod users;
pub mod validation;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{require_auth, AuthService, TokenService, UserStore};
use crate::posts::{PostService, PostStore};
use crate::uploads::UploadConfig;
use crate::users::UserService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        posts::handlers::create_post_handler,
        posts::handlers::get_feed_posts_handler,
        posts::handlers::get_post_handler,
        posts::handlers::get_user_posts_handler,
        posts::handlers::like_post_handler,
        users::handlers::get_users_handler,
        users::handlers::get_user_handler,
        users::handlers::get_user_friends_handler,
        users::handlers::add_remove_friend_handler,
    ),
    components(schemas(
        auth::models::RegisterForm,
        auth::models::LoginRequest,
        auth::models::UserResponse,
        auth::models::AuthResponse,
        posts::models::Post,
        posts::models::CreatePostForm,
        users::models::FriendResponse,
        error::ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "posts", description = "Feed, posts and likes"),
        (name = "users", description = "Profiles and friends")
    ),
    info(
        title = "Social API",
        version = "1.0.0",
        description = "Backend for a small social network"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
    pub posts: PostService,
    pub tokens: TokenService,
    pub uploads: UploadConfig,
}

impl AppState {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        post_store: Arc<dyn PostStore>,
        tokens: TokenService,
        uploads: UploadConfig,
    ) -> Self {
        Self {
            auth: AuthService::new(user_store.clone(), tokens.clone(), uploads.clone()),
            users: UserService::new(user_store.clone()),
            posts: PostService::new(post_store, user_store, uploads.clone()),
            tokens,
            uploads,
        }
    }
}

/// Creates and configures the application router
///
/// Public routes: registration, login, uploaded assets and the API docs.
/// Everything else sits behind the session token gate.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    let protected = Router::new()
        .route(
            "/posts",
            post(posts::create_post_handler).get(posts::get_feed_posts_handler),
        )
        .route("/posts/:id", get(posts::get_post_handler))
        .route("/posts/:id/like", patch(posts::like_post_handler))
        .route("/users", get(users::get_users_handler))
        .route("/users/:id", get(users::get_user_handler))
        .route("/users/:id/friends", get(users::get_user_friends_handler))
        .route(
            "/users/:id/friends/:friend_id",
            patch(users::add_remove_friend_handler),
        )
        .route("/users/:id/posts", get(posts::get_user_posts_handler))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ));

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public)
        .merge(protected)
        .nest_service("/assets", pipeline::static_assets(&state.uploads.dir));

    let router = pipeline::with_body_limit(router, max_body_bytes);
    let router = pipeline::with_cors(router);
    let router = pipeline::with_security_headers(router);
    let router = pipeline::with_request_tracing(router);

    router.with_state(state)
}
