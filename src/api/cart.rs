//! Cart endpoints. All of them require an authenticated user.

use super::{
    AppState,
    extract::{ApiJson, CurrentUser},
    money,
};
use crate::{
    core::{
        cart::{self, Adjustment, CartLine, CartWrite},
        catalog::get_product_by_id,
        validation::REQUIRED,
    },
    entities::cart_item,
    errors::{Error, Result},
};
use axum::{Json, extract::State, http::StatusCode};
use sea_orm::prelude::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A cart row with the product's name, price and image.
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    id: i64,
    user: i64,
    product: i64,
    quantity: i32,
    name: String,
    #[serde(serialize_with = "money")]
    price: Decimal,
    image: Option<String>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let CartLine { item, product } = line;
        Self {
            id: item.id,
            user: item.user_id,
            product: item.product_id,
            quantity: item.quantity,
            name: product.name,
            price: product.price,
            image: product.image,
        }
    }
}

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(default, alias = "product_id")]
    product: Option<i64>,
    #[serde(default = "default_quantity")]
    quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Body of `DELETE /api/cart` and `PATCH /api/cart`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CartItemRequest {
    cart_item_id: Option<i64>,
    #[serde(rename = "type")]
    adjustment: Option<String>,
}

async fn respond_with_line(
    state: &AppState,
    item: cart_item::Model,
) -> Result<Json<CartItemResponse>> {
    let product = get_product_by_id(&state.db, item.product_id)
        .await?
        .ok_or_else(|| Error::validation("product", "Product no longer exists."))?;
    Ok(Json(CartLine { item, product }.into()))
}

/// `GET /api/cart`
pub async fn list_cart(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<Vec<CartItemResponse>>> {
    let lines = cart::list_cart(&state.db, owner.id).await?;
    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

/// `POST /api/cart` - 201 when a row is created, 200 when an existing row grows.
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItemResponse>)> {
    let product_id = body.product.ok_or_else(|| Error::validation("product", REQUIRED))?;
    let written = cart::add_to_cart(&state.db, owner.id, product_id, body.quantity).await?;
    let status = match written {
        CartWrite::Created(_) => StatusCode::CREATED,
        CartWrite::Incremented(_) => StatusCode::OK,
    };
    let response = respond_with_line(&state, written.into_item()).await?;
    Ok((status, response))
}

/// `DELETE /api/cart`
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let failed = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Failed to remove item from cart" })),
        )
    };
    let Some(cart_item_id) = body.cart_item_id else {
        return Ok(failed());
    };
    match cart::remove_from_cart(&state.db, owner.id, cart_item_id).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({ "message": "Item removed from cart successfully" })),
        )),
        Err(Error::CartItemNotFound { .. }) => Ok(failed()),
        Err(err) => Err(err),
    }
}

/// `PATCH /api/cart` with `type` of `inc` or `dec`.
pub async fn adjust_cart_item(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Json<CartItemResponse>> {
    let cart_item_id = body
        .cart_item_id
        .ok_or_else(|| Error::validation("cart_item_id", REQUIRED))?;
    let adjustment: Adjustment = body
        .adjustment
        .as_deref()
        .ok_or_else(|| Error::validation("type", REQUIRED))?
        .parse()?;
    let item = cart::adjust_quantity(&state.db, owner.id, cart_item_id, adjustment).await?;
    respond_with_line(&state, item).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode, header};
    use sea_orm::prelude::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_cart_requires_authentication() -> Result<()> {
        let app = test_app().await?;
        let response = app.call(Method::GET, "/api/cart", None, &[]).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = app
            .call(
                Method::POST,
                "/api/cart",
                Some(json!({ "product": 1, "quantity": 1 })),
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_list_adjust_remove() -> Result<()> {
        let app = test_app().await?;
        let alice = create_test_user(&app.state.db, "alice").await?;
        let bearer = app.bearer_for(&alice)?;
        let headers = [(header::AUTHORIZATION, bearer.as_str())];
        let fruits = create_test_category(&app.state.db, "Fruits").await?;
        let apple =
            create_test_product(&app.state.db, fruits.id, "Apple", Decimal::new(1000, 2)).await?;

        let add = json!({ "product": apple.id, "quantity": 2 });
        let response = app.call(Method::POST, "/api/cart", Some(add), &headers).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["quantity"], 2);
        assert_eq!(response.body["user"], alice.id);
        let cart_item_id = response.body["id"].as_i64().unwrap();

        let again = json!({ "product_id": apple.id, "quantity": 3 });
        let response = app.call(Method::POST, "/api/cart", Some(again), &headers).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["id"], cart_item_id);
        assert_eq!(response.body["quantity"], 5);

        let response = app.call(Method::GET, "/api/cart", None, &headers).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!([{
                "id": cart_item_id,
                "user": alice.id,
                "product": apple.id,
                "quantity": 5,
                "name": "Apple",
                "price": "10.00",
                "image": null,
            }])
        );

        let dec = json!({ "cart_item_id": cart_item_id, "type": "dec" });
        let response = app.call(Method::PATCH, "/api/cart", Some(dec), &headers).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["quantity"], 4);

        let bogus = json!({ "cart_item_id": cart_item_id, "type": "double" });
        let response = app.call(Method::PATCH, "/api/cart", Some(bogus), &headers).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let remove = json!({ "cart_item_id": cart_item_id });
        let response = app.call(Method::DELETE, "/api/cart", Some(remove.clone()), &headers).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body["message"],
            "Item removed from cart successfully"
        );

        let response = app.call(Method::DELETE, "/api/cart", Some(remove), &headers).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["message"], "Failed to remove item from cart");
        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_items_are_not_found() -> Result<()> {
        let app = test_app().await?;
        let alice = create_test_user(&app.state.db, "alice").await?;
        let bob = create_test_user(&app.state.db, "bob").await?;
        let fruits = create_test_category(&app.state.db, "Fruits").await?;
        let apple =
            create_test_product(&app.state.db, fruits.id, "Apple", Decimal::new(1000, 2)).await?;

        let alice_bearer = app.bearer_for(&alice)?;
        let bob_bearer = app.bearer_for(&bob)?;
        let alice_headers = [(header::AUTHORIZATION, alice_bearer.as_str())];
        let bob_headers = [(header::AUTHORIZATION, bob_bearer.as_str())];

        let add = json!({ "product": apple.id });
        let response = app.call(Method::POST, "/api/cart", Some(add), &alice_headers).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["quantity"], 1);
        let cart_item_id = response.body["id"].as_i64().unwrap();

        let inc = json!({ "cart_item_id": cart_item_id, "type": "inc" });
        let response = app.call(Method::PATCH, "/api/cart", Some(inc), &bob_headers).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let remove = json!({ "cart_item_id": cart_item_id });
        let response = app.call(Method::DELETE, "/api/cart", Some(remove), &bob_headers).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = app.call(Method::GET, "/api/cart", None, &alice_headers).await;
        assert_eq!(response.body[0]["quantity"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_rejected() -> Result<()> {
        let app = test_app().await?;
        let alice = create_test_user(&app.state.db, "alice").await?;
        let bearer = app.bearer_for(&alice)?;
        let headers = [(header::AUTHORIZATION, bearer.as_str())];

        let response = app
            .call(Method::POST, "/api/cart", Some(json!({ "quantity": 1 })), &headers)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["errors"]["product"].is_array());

        let response = app
            .call(
                Method::POST,
                "/api/cart",
                Some(json!({ "product": 999, "quantity": 1 })),
                &headers,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["errors"]["product"].is_array());
        Ok(())
    }
}
