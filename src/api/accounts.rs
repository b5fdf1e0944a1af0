//! Account and token endpoints.

use super::{
    AppState,
    auth::SESSION_COOKIE,
    extract::{ApiJson, CurrentUser},
};
use crate::{
    core::{
        accounts::{self, NewAccount},
        tokens::{self, TokenPair},
        validation::{FieldErrors, REQUIRED},
    },
    entities::user,
    errors::{Error, Result},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use tracing::{info, instrument};

/// Routes advertised at the API root.
pub const TOKEN_ROUTES: [&str; 2] = ["/api/token", "/api/token/refresh"];

/// Body of `POST /api/register`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    email: String,
    username: String,
    password: String,
    password_confirm: Option<String>,
}

/// Email/password body shared by login and token issuance.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsRequest {
    email: String,
    password: String,
}

impl CredentialsRequest {
    fn check(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if self.email.trim().is_empty() {
            errors.add("email", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }
}

/// Body of `POST /api/token/refresh`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    refresh: String,
}

/// Public view of a user: email and username only.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    email: String,
    username: String,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            email: model.email,
            username: model.username,
        }
    }
}

/// `GET /api`
pub async fn list_routes() -> Json<[&'static str; 2]> {
    Json(TOKEN_ROUTES)
}

/// `POST /api/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let created = accounts::register(
        &state.db,
        NewAccount {
            email: body.email,
            username: body.username,
            password: body.password,
            password_confirm: body.password_confirm,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<UserSummary>> {
    body.check()?;
    let (session, found) = accounts::login(
        &state.db,
        &body.email,
        &body.password,
        state.settings.session_ttl,
    )
    .await
    .map_err(|err| match err {
        Error::Authentication { message } => Error::validation("non_field_errors", message),
        other => other,
    })?;

    cookies.add(
        Cookie::build((SESSION_COOKIE, session.token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    );
    Ok(Json(found.into()))
}

/// `POST /api/logout`
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<StatusCode> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        if accounts::logout(&state.db, cookie.value()).await? {
            info!("Session closed");
        }
    }
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok(StatusCode::OK)
}

/// `GET /api/user`
pub async fn current_user(CurrentUser(found): CurrentUser) -> Json<Value> {
    Json(json!({ "user": UserSummary::from(found) }))
}

/// `POST /api/token`
#[instrument(skip_all)]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<TokenPair>> {
    body.check()?;
    let pair = tokens::issue_token(&state.db, &state.tokens, &body.email, &body.password).await?;
    Ok(Json(pair))
}

/// `POST /api/token/refresh`
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    if body.refresh.trim().is_empty() {
        return Err(Error::validation("refresh", REQUIRED));
    }
    let pair = tokens::refresh_token(&state.db, &state.tokens, body.refresh.trim()).await?;
    Ok(Json(pair))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode, header};
    use serde_json::json;

    #[tokio::test]
    async fn test_root_lists_token_routes() -> Result<()> {
        let app = test_app().await?;
        let response = app.call(Method::GET, "/api", None, &[]).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!(["/api/token", "/api/token/refresh"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_hides_password() -> Result<()> {
        let app = test_app().await?;
        let body = json!({
            "email": "alice@example.com",
            "username": "alice",
            "password": TEST_PASSWORD,
        });
        let response = app.call(Method::POST, "/api/register", Some(body), &[]).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["email"], "alice@example.com");
        assert_eq!(response.body["username"], "alice");
        assert!(response.body.get("password").is_none());

        let again = json!({
            "email": "alice@example.com",
            "username": "alice",
            "password": "short",
        });
        let response = app.call(Method::POST, "/api/register", Some(again), &[]).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["errors"]["email"].is_array());
        assert!(response.body["errors"]["username"].is_array());
        assert!(response.body["errors"]["password"].is_array());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() -> Result<()> {
        let app = test_app().await?;
        let response = app
            .call_raw(Method::POST, "/api/register", "{not json", &[])
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["errors"]["non_field_errors"].is_array());
        Ok(())
    }

    #[tokio::test]
    async fn test_login_cookie_session_lifecycle() -> Result<()> {
        let app = test_app().await?;
        create_test_user(&app.state.db, "alice").await?;

        let bad = json!({ "email": "alice@example.com", "password": "wrong-password" });
        let response = app.call(Method::POST, "/api/login", Some(bad), &[]).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.set_cookie.is_none());

        let good = json!({ "email": "alice@example.com", "password": TEST_PASSWORD });
        let response = app.call(Method::POST, "/api/login", Some(good), &[]).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!({ "email": "alice@example.com", "username": "alice" })
        );
        let set_cookie = response.set_cookie.unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();
        assert!(cookie.starts_with("sessionid="));

        let headers = [(header::COOKIE, cookie.as_str())];
        let response = app.call(Method::GET, "/api/user", None, &headers).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["user"]["username"], "alice");

        let response = app.call(Method::POST, "/api/logout", None, &headers).await;
        assert_eq!(response.status, StatusCode::OK);

        let response = app.call(Method::GET, "/api/user", None, &headers).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_token_pair_authenticates_and_refreshes() -> Result<()> {
        let app = test_app().await?;
        create_test_user(&app.state.db, "alice").await?;

        let creds = json!({ "email": "alice@example.com", "password": "nope-nope" });
        let response = app.call(Method::POST, "/api/token", Some(creds), &[]).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let creds = json!({ "email": "alice@example.com", "password": TEST_PASSWORD });
        let response = app.call(Method::POST, "/api/token", Some(creds), &[]).await;
        assert_eq!(response.status, StatusCode::OK);
        let access = response.body["access"].as_str().unwrap().to_string();
        let refresh = response.body["refresh"].as_str().unwrap().to_string();

        let bearer = format!("Bearer {access}");
        let response = app
            .call(Method::GET, "/api/user", None, &[(header::AUTHORIZATION, bearer.as_str())])
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["user"]["email"], "alice@example.com");

        let wrong_kind = format!("Bearer {refresh}");
        let response = app
            .call(Method::GET, "/api/cart", None, &[(header::AUTHORIZATION, wrong_kind.as_str())])
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = app
            .call(
                Method::POST,
                "/api/token/refresh",
                Some(json!({ "refresh": access })),
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = app
            .call(
                Method::POST,
                "/api/token/refresh",
                Some(json!({ "refresh": refresh })),
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let renewed = format!("Bearer {}", response.body["access"].as_str().unwrap());
        let response = app
            .call(Method::GET, "/api/cart", None, &[(header::AUTHORIZATION, renewed.as_str())])
            .await;
        assert_eq!(response.status, StatusCode::OK);
        Ok(())
    }
}
