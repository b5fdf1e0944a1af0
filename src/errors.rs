//! Unified error type for the storefront.
//!
//! Every core operation returns [`Result`]. The HTTP layer turns these
//! variants into status codes in `api::error`.

use crate::core::validation::FieldErrors;
use thiserror::Error;

/// All failures surfaced by the storefront.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Store-layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure while reading config files or binding the listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or conflicting input, reported per field
    #[error("Validation failed: {errors}")]
    Validation {
        /// Messages keyed by field name
        errors: FieldErrors,
    },

    /// Credentials or token did not identify an active user
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Reason shown to the client
        message: String,
    },

    /// The request carried no usable identity
    #[error("Authentication required")]
    Unauthenticated,

    /// A user referenced by id no longer exists
    #[error("User not found: {id}")]
    UserNotFound {
        /// Missing user id
        id: i64,
    },

    /// A cart row does not exist or belongs to someone else
    #[error("Cart item not found: {id}")]
    CartItemNotFound {
        /// Missing cart item id
        id: i64,
    },

    /// A category referenced by id does not exist
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Missing category id
        id: i64,
    },

    /// JWT encoding or decoding failed
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Argon2 could not hash or parse a password hash
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Error reported by argon2
        message: String,
    },
}

impl Error {
    /// Builds a validation error carrying a single field message.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        Self::Validation { errors }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
