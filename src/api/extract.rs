//! Request extractors shared by the handlers.

use crate::{entities::user, errors::Error};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

/// JSON body whose parse failures become validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// The authenticated user, placed in request extensions by
/// [`super::auth::resolve_identity`]. Rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(Error::Unauthenticated)
    }
}
