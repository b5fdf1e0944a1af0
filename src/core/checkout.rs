//! Checkout business logic - converting a cart into an order.
//!
//! Placing an order writes the shipping address, the order row and one order
//! item per cart row, then empties the cart. All of it happens in a single
//! transaction: either the order exists with its items and the cart is empty,
//! or nothing changed.

use crate::{
    core::{
        cart::list_cart,
        validation::{FieldErrors, REQUIRED, check_decimal, required_text},
    },
    entities::{
        CartItem, Order, OrderItem, Product, ShippingAddress, cart_item, order, order_item,
        product, shipping_address,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Maximum mobile number length.
pub const MAX_MOBILE_LEN: usize = 15;
/// Maximum city length.
pub const MAX_CITY_LEN: usize = 100;
/// Maximum pincode length.
pub const MAX_PINCODE_LEN: usize = 10;

/// Delivery details as submitted. Every field is required.
#[derive(Debug, Clone, Default)]
pub struct ShippingAddressInput {
    /// Street address
    pub shipping_address: Option<String>,
    /// Contact number
    pub mobile_number: Option<String>,
    /// City
    pub city: Option<String>,
    /// Postal code
    pub pincode: Option<String>,
}

/// Checkout request.
#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    /// Where to ship
    pub address: ShippingAddressInput,
    /// Amount the client charged; stored as the order subtotal
    pub amount: Option<Decimal>,
    /// Payment-provider reference, stored verbatim
    pub payment_id: Option<String>,
}

/// One displayed line of an order, priced from the live product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// The order item row
    pub item: order_item::Model,
    /// Current product name
    pub product_name: String,
    /// Current product price
    pub product_price: Decimal,
}

/// An order with everything needed to display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    /// The order row
    pub order: order::Model,
    /// Shipping address, if it still exists
    pub shipping_address: Option<shipping_address::Model>,
    /// Line items in insertion order
    pub items: Vec<OrderLine>,
}

struct ValidAddress {
    shipping_address: String,
    mobile_number: String,
    city: String,
    pincode: String,
}

fn validate(input: &PlaceOrder) -> Result<(ValidAddress, Decimal)> {
    let mut errors = FieldErrors::default();
    let address = &input.address;

    let street = match address.shipping_address.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            errors.add("shipping_address", REQUIRED);
            None
        }
    };
    let mobile = required_text(
        &mut errors,
        "mobile_number",
        address.mobile_number.as_deref(),
        MAX_MOBILE_LEN,
    );
    let city = required_text(&mut errors, "city", address.city.as_deref(), MAX_CITY_LEN);
    let pincode = required_text(
        &mut errors,
        "pincode",
        address.pincode.as_deref(),
        MAX_PINCODE_LEN,
    );

    match input.amount {
        Some(amount) => check_decimal(&mut errors, "amount", amount, 10, 2),
        None => errors.add("amount", REQUIRED),
    }

    errors.into_result()?;

    // All four are Some once the error set is empty
    match (street, mobile, city, pincode, input.amount) {
        (Some(shipping_address), Some(mobile_number), Some(city), Some(pincode), Some(amount)) => {
            Ok((
                ValidAddress {
                    shipping_address,
                    mobile_number,
                    city,
                    pincode,
                },
                amount,
            ))
        }
        _ => Err(Error::validation("non_field_errors", REQUIRED)),
    }
}

/// Places an order from the user's current cart.
///
/// The client-supplied amount is recorded as the subtotal. The server also
/// totals the cart at current prices and logs a warning if the two differ.
/// An empty cart still produces an order, with no items.
///
/// # Errors
/// Returns [`Error::Validation`] with every failing field if the
/// address or amount is invalid. Nothing is written in that case.
#[instrument(skip(db, input), fields(payment_id = ?input.payment_id))]
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: i64,
    input: PlaceOrder,
) -> Result<order::Model> {
    let (address, amount) = validate(&input)?;

    let txn = db.begin().await?;

    let address = shipping_address::ActiveModel {
        user_id: Set(user_id),
        shipping_address: Set(address.shipping_address),
        mobile_number: Set(address.mobile_number),
        city: Set(address.city),
        pincode: Set(address.pincode),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let placed = order::ActiveModel {
        user_id: Set(user_id),
        shipping_address_id: Set(Some(address.id)),
        order_date: Set(Utc::now()),
        is_ordered: Set(true),
        subtotal: Set(amount),
        payment_id: Set(input.payment_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let lines = list_cart(&txn, user_id).await?;
    let computed: Decimal = lines
        .iter()
        .map(|line| line.product.price * Decimal::from(line.item.quantity))
        .sum();
    if computed != amount {
        warn!(
            order_id = placed.id,
            %amount,
            %computed,
            "Client amount differs from cart total"
        );
    }

    if !lines.is_empty() {
        let items = lines.iter().map(|line| order_item::ActiveModel {
            order_id: Set(placed.id),
            product_id: Set(line.product.id),
            quantity: Set(line.item.quantity),
            ..Default::default()
        });
        OrderItem::insert_many(items).exec(&txn).await?;
    }

    CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(order_id = placed.id, items = lines.len(), "Order placed");
    Ok(placed)
}

/// Lists the user's orders, oldest first, with address and priced lines.
pub async fn list_orders(db: &DatabaseConnection, user_id: i64) -> Result<Vec<OrderSummary>> {
    let orders = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .find_also_related(ShippingAddress)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?;

    let order_ids: Vec<i64> = orders.iter().map(|(placed, _)| placed.id).collect();
    let rows: Vec<(order_item::Model, Option<product::Model>)> = OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .find_also_related(Product)
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    let mut lines_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for (item, product) in rows {
        let Some(product) = product else {
            continue;
        };
        lines_by_order.entry(item.order_id).or_default().push(OrderLine {
            item,
            product_name: product.name,
            product_price: product.price,
        });
    }

    Ok(orders
        .into_iter()
        .map(|(placed, shipping_address)| OrderSummary {
            items: lines_by_order.remove(&placed.id).unwrap_or_default(),
            order: placed,
            shipping_address,
        })
        .collect())
}
