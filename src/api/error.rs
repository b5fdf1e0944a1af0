//! HTTP mapping for [`Error`].
//!
//! Client errors carry a `message` and, for validation failures, the per-field
//! `errors` map. Server errors are logged and answered with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

impl Error {
    /// Status code this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication { .. } | Self::Unauthenticated | Self::Token(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::UserNotFound { .. } | Self::CartItemNotFound { .. } | Self::CategoryNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::PasswordHash { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation { errors } => {
                debug!(%errors, "Rejected invalid input");
                json!({ "message": "Invalid input.", "errors": errors })
            }
            Self::Authentication { message } => json!({ "message": message }),
            Self::Unauthenticated => {
                json!({ "message": "Authentication credentials were not provided." })
            }
            Self::Token(err) => {
                debug!("Token rejected: {}", err);
                json!({ "message": "Token is invalid or expired" })
            }
            Self::UserNotFound { .. } => json!({ "message": "User not found" }),
            Self::CartItemNotFound { .. } => json!({ "message": "Cart item not found" }),
            Self::CategoryNotFound { .. } => json!({ "message": "Category not found" }),
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::PasswordHash { .. } => {
                error!("Request failed: {}", self);
                json!({ "message": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("non_field_errors", rejection.body_text())
    }
}
