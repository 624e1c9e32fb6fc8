//! Authentication module for Folio.
//!
//! This module provides password hashing, bearer token handling, and the
//! gate that turns a token into a [`Caller`].

mod caller;
mod gate;
mod password;
mod token;

pub use caller::Caller;
pub use gate::{authenticate, authenticate_optional, require_admin, AuthError};
pub use password::{
    hash_password, random_password_hash, validate_password, verify_password, PasswordError,
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
pub use token::{Claims, TokenService};
