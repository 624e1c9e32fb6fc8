//! HTTP/JSON API.
//!
//! Handlers, extractors and middleware for the blog API, plus the server
//! that hosts them.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
