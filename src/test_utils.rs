//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    api::{self, AppState},
    config::Settings,
    core::{accounts, catalog},
    entities,
    errors::Result,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderName, Method, Request, StatusCode, header},
};
use sea_orm::{DatabaseConnection, prelude::Decimal};
use serde_json::Value;
use tower::ServiceExt;

/// Password given to every account made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "test-password-123";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers an active account.
///
/// # Defaults
/// * `email`: `{username}@example.com`
/// * `password`: [`TEST_PASSWORD`]
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    accounts::register(
        db,
        accounts::NewAccount {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: TEST_PASSWORD.to_string(),
            password_confirm: Some(TEST_PASSWORD.to_string()),
        },
    )
    .await
}

/// Creates a category with no image.
pub async fn create_test_category(
    db: &DatabaseConnection,
    title: &str,
) -> Result<entities::category::Model> {
    catalog::create_category(db, title, None).await
}

/// Creates a product with no image or description.
pub async fn create_test_product(
    db: &DatabaseConnection,
    category_id: i64,
    name: &str,
    price: Decimal,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        catalog::NewProduct {
            category_id,
            name: name.to_string(),
            price,
            image: None,
            description: None,
        },
    )
    .await
}

/// Fresh database with one user (`alice`) and one product (`Apple` at 10.00
/// in `Fruits`).
pub async fn setup_with_product() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "alice").await?;
    let fruits = create_test_category(&db, "Fruits").await?;
    let apple = create_test_product(&db, fruits.id, "Apple", Decimal::new(1000, 2)).await?;
    Ok((db, user, apple))
}

/// Installs a `tracing` subscriber that writes through the test harness.
/// Safe to call from every test; only the first call takes effect.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("storefront=debug"))
        .with_test_writer()
        .try_init();
}

/// A router over a fresh in-memory database, driven without a listener.
pub struct TestApp {
    /// State shared with the router, for seeding data directly
    pub state: AppState,
    router: Router,
}

/// Status, decoded JSON body and `Set-Cookie` header of a test response.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status
    pub status: StatusCode,
    /// Body parsed as JSON, `Value::Null` when empty
    pub body: Value,
    /// First `Set-Cookie` header, if any
    pub set_cookie: Option<String>,
}

/// Builds a [`TestApp`] with [`Settings::for_tests`].
pub async fn test_app() -> Result<TestApp> {
    init_test_tracing();
    let db = setup_test_db().await?;
    let state = AppState::new(db, Settings::for_tests());
    Ok(TestApp {
        router: api::router(state.clone()),
        state,
    })
}

impl TestApp {
    /// Sends a request with an optional JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(HeaderName, &str)],
    ) -> TestResponse {
        let body = body.map(|value| value.to_string()).unwrap_or_default();
        self.call_raw(method, uri, &body, headers).await
    }

    /// Sends a request whose body is passed through untouched.
    #[allow(clippy::unwrap_used)]
    pub async fn call_raw(
        &self,
        method: Method,
        uri: &str,
        body: &str,
        headers: &[(HeaderName, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !body.is_empty() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            body,
            set_cookie,
        }
    }

    /// `Authorization` header value carrying a fresh access token for `owner`.
    pub fn bearer_for(&self, owner: &entities::user::Model) -> Result<String> {
        let pair = self.state.tokens.issue_pair(owner)?;
        Ok(format!("Bearer {}", pair.access))
    }
}
