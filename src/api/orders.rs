//! Checkout and order history endpoints.

use super::{
    AppState,
    extract::{ApiJson, CurrentUser},
    money,
};
use crate::{
    core::checkout::{self, OrderLine, OrderSummary, PlaceOrder, ShippingAddressInput},
    entities::shipping_address,
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use sea_orm::prelude::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShippingAddressData {
    shipping_address: Option<String>,
    mobile_number: Option<String>,
    city: Option<String>,
    pincode: Option<String>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOrderRequest {
    shipping_address_data: ShippingAddressData,
    amount: Option<Decimal>,
    #[serde(alias = "payment_id")]
    razorpay_payment_id: Option<String>,
}

impl From<PlaceOrderRequest> for PlaceOrder {
    fn from(body: PlaceOrderRequest) -> Self {
        let address = body.shipping_address_data;
        Self {
            address: ShippingAddressInput {
                shipping_address: address.shipping_address,
                mobile_number: address.mobile_number,
                city: address.city,
                pincode: address.pincode,
            },
            amount: body.amount,
            payment_id: body.razorpay_payment_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct OrderItemResponse {
    id: i64,
    quantity: i32,
    product_name: String,
    #[serde(serialize_with = "money")]
    product_price: Decimal,
}

impl From<OrderLine> for OrderItemResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.item.id,
            quantity: line.item.quantity,
            product_name: line.product_name,
            product_price: line.product_price,
        }
    }
}

/// An order as shown in history.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    id: i64,
    order_date: DateTime<Utc>,
    is_ordered: bool,
    #[serde(serialize_with = "money")]
    subtotal: Decimal,
    payment_id: Option<String>,
    shipping_address: Option<i64>,
    shipping_address_data: Option<shipping_address::Model>,
    items: Vec<OrderItemResponse>,
}

impl From<OrderSummary> for OrderResponse {
    fn from(summary: OrderSummary) -> Self {
        let OrderSummary {
            order,
            shipping_address,
            items,
        } = summary;
        Self {
            id: order.id,
            order_date: order.order_date,
            is_ordered: order.is_ordered,
            subtotal: order.subtotal,
            payment_id: order.payment_id,
            shipping_address: order.shipping_address_id,
            shipping_address_data: shipping_address,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// `GET /api/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = checkout::list_orders(&state.db, owner.id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// `POST /api/orders`
pub async fn place_order(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    ApiJson(body): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let placed = checkout::place_order(&state.db, owner.id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Order placed successfully.", "order_id": placed.id })),
    ))
}
