//! HTTP interface - axum router, shared state and handlers.
//!
//! Handlers are thin: they decode the request, call into [`crate::core`] and
//! shape the response. Every route lives under `/api`.

/// Registration, login/logout, current user and JWT endpoints
pub mod accounts;
/// Identity middleware
pub mod auth;
/// Cart endpoints
pub mod cart;
/// Public catalog endpoints
pub mod catalog;
mod error;
/// Request extractors
pub mod extract;
/// Checkout and order history endpoints
pub mod orders;

use crate::{config::Settings, core::tokens::TokenIssuer};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::{DatabaseConnection, prelude::Decimal};
use serde::Serializer;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Runtime settings
    pub settings: Arc<Settings>,
    /// JWT signer/verifier built from the settings
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Builds the state, deriving the token issuer from `settings`.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        let tokens = TokenIssuer::new(
            &settings.jwt_secret,
            settings.access_token_ttl,
            settings.refresh_token_ttl,
        );
        Self {
            db,
            settings: Arc::new(settings),
            tokens,
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(accounts::list_routes))
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/user", get(accounts::current_user))
        .route("/token", post(accounts::obtain_token))
        .route("/token/refresh", post(accounts::refresh_token))
        .route("/products", get(catalog::list_products))
        .route("/categories", get(catalog::list_categories))
        .route(
            "/cart",
            get(cart::list_cart)
                .post(cart::add_to_cart)
                .delete(cart::remove_from_cart)
                .patch(cart::adjust_cart_item),
        )
        .route("/orders", get(orders::list_orders).post(orders::place_order))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_identity,
        ));

    Router::new()
        .nest("/api", api)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serializes a money amount as a string with exactly two decimal places.
fn money<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut value = value.round_dp(2);
    value.rescale(2);
    serializer.collect_str(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Priced {
        #[serde(serialize_with = "money")]
        price: Decimal,
    }

    #[test]
    fn test_money_always_has_two_places() {
        let render = |price| serde_json::to_string(&Priced { price }).unwrap_or_default();
        assert_eq!(render(Decimal::new(12, 0)), r#"{"price":"12.00"}"#);
        assert_eq!(render(Decimal::new(15, 1)), r#"{"price":"1.50"}"#);
        assert_eq!(render(Decimal::new(1999, 2)), r#"{"price":"19.99"}"#);
    }
}
