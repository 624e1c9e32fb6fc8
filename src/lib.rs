//! Folio - a personal blog REST API.
//!
//! Posts, categories, threaded comments with moderation and a contact
//! form, served over HTTP/JSON with bearer-token authentication.

pub mod auth;
pub mod blog;
pub mod config;
pub mod contact;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod media;
pub mod oauth;
pub mod pagination;
pub mod seed;
pub mod web;

pub use auth::{hash_password, verify_password, AuthError, Caller, TokenService};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository, UserUpdate};
pub use error::{FolioError, Result};
