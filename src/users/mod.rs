pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::*;
pub use models::FriendResponse;
pub use service::UserService;
