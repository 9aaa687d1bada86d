pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::*;
pub use models::{CreatePostRequest, NewPost, Post};
pub use repository::{InMemoryPostStore, PgPostStore, PostStore};
pub use service::PostService;
