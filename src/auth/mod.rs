// Authentication module
// Session tokens, password hashing, registration/login and the request gate

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, register_handler};
pub use middleware::{require_auth, AuthenticatedUser};
pub use models::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse};
pub use repository::{InMemoryUserStore, PgUserStore, UserStore};
pub use service::AuthService;
pub use token::TokenService;
