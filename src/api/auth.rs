//! Identity middleware.
//!
//! A `Bearer` access token in the `Authorization` header wins over the
//! `sessionid` cookie. Requests with neither, or with credentials that no longer
//! resolve, continue anonymously; handlers that need a user reject them through
//! the [`CurrentUser`] extractor.

use super::{AppState, extract::CurrentUser};
use crate::{
    core::{accounts, tokens},
    entities::user,
    errors::{Error, Result},
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;
use tracing::debug;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionid";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn identify(state: &AppState, headers: &HeaderMap, cookies: &Cookies) -> Result<Option<user::Model>> {
    if let Some(token) = bearer_token(headers) {
        match tokens::resolve_access_token(&state.db, &state.tokens, token).await {
            Ok(found) => return Ok(Some(found)),
            Err(Error::Database(err)) => return Err(Error::Database(err)),
            Err(err) => debug!("Bearer token not accepted: {}", err),
        }
    }

    match cookies.get(SESSION_COOKIE) {
        Some(cookie) => accounts::resolve_session(&state.db, cookie.value()).await,
        None => Ok(None),
    }
}

/// Resolves the caller and stores a [`CurrentUser`] in the request extensions.
pub async fn resolve_identity(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(&state, request.headers(), &cookies).await;
    match identity {
        Ok(Some(found)) => {
            debug!(user_id = found.id, "Request authenticated");
            request.extensions_mut().insert(CurrentUser(found));
        }
        Ok(None) => {}
        Err(err) => return err.into_response(),
    }
    next.run(request).await
}
