//! Cart business logic - per-user product quantities awaiting checkout.
//!
//! Each (user, product) pair has at most one row. Adding a product that is
//! already in the cart increments the existing row inside a transaction; a
//! unique index backs this up, and the one constraint violation it can raise
//! under concurrent adds is retried as an increment.

use crate::{
    core::validation::FieldErrors,
    entities::{CartItem, Product, cart_item, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Largest quantity a cart row can hold.
pub const MAX_QUANTITY: i32 = i32::MAX;

/// Outcome of [`add_to_cart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartWrite {
    /// A new row was inserted
    Created(cart_item::Model),
    /// An existing row's quantity was increased
    Incremented(cart_item::Model),
}

impl CartWrite {
    /// The resulting cart row.
    #[must_use]
    pub const fn item(&self) -> &cart_item::Model {
        match self {
            Self::Created(item) | Self::Incremented(item) => item,
        }
    }

    /// Consumes the outcome, returning the cart row.
    #[must_use]
    pub fn into_item(self) -> cart_item::Model {
        match self {
            Self::Created(item) | Self::Incremented(item) => item,
        }
    }
}

/// Direction for [`adjust_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Add one unit
    Increment,
    /// Remove one unit, never dropping below one
    Decrement,
}

impl FromStr for Adjustment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inc" => Ok(Self::Increment),
            "dec" => Ok(Self::Decrement),
            other => Err(Error::validation(
                "type",
                format!("\"{other}\" is not a valid choice. Use \"inc\" or \"dec\"."),
            )),
        }
    }
}

/// A cart row with the product it references, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// The cart row
    pub item: cart_item::Model,
    /// The live product
    pub product: product::Model,
}

/// Adds `quantity` units of a product to the user's cart.
///
/// Creates a row if the product is not in the cart yet, otherwise increments the
/// existing row. The lookup and write run in one transaction.
///
/// # Errors
/// Returns [`Error::Validation`] if the quantity is below one, the product does
/// not exist, or the row would grow past [`MAX_QUANTITY`]. A rejected add leaves
/// the row unchanged.
#[instrument(skip(db))]
pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<CartWrite> {
    let mut errors = FieldErrors::default();
    if quantity < 1 {
        errors.add("quantity", "Ensure this value is greater than or equal to 1.");
    }
    errors.into_result()?;

    match try_add_to_cart(db, user_id, product_id, quantity).await {
        Err(Error::Database(err))
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            // Another request inserted the row between our lookup and insert;
            // the retry will find it and increment instead.
            warn!("Concurrent cart insert detected, retrying as increment");
            try_add_to_cart(db, user_id, product_id, quantity).await
        }
        other => other,
    }
}

async fn try_add_to_cart(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<CartWrite> {
    let txn = db.begin().await?;

    if Product::find_by_id(product_id).one(&txn).await?.is_none() {
        return Err(Error::validation(
            "product",
            format!("Invalid pk \"{product_id}\" - object does not exist."),
        ));
    }

    let existing = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let outcome = match existing {
        Some(row) => {
            let updated = increment_quantity(&txn, row.id, quantity).await?;
            debug!(cart_item_id = updated.id, quantity = updated.quantity, "Incremented cart row");
            CartWrite::Incremented(updated)
        }
        None => {
            let created = cart_item::ActiveModel {
                user_id: Set(user_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            debug!(cart_item_id = created.id, "Created cart row");
            CartWrite::Created(created)
        }
    };

    txn.commit().await?;
    Ok(outcome)
}

/// Atomically adds `delta` to a cart row: `UPDATE cart_items SET quantity = quantity + delta`.
///
/// The update only matches while the result still fits the column, so a row
/// never holds a quantity above [`MAX_QUANTITY`].
async fn increment_quantity<C>(db: &C, cart_item_id: i64, delta: i32) -> Result<cart_item::Model>
where
    C: ConnectionTrait,
{
    let result = CartItem::update_many()
        .col_expr(
            cart_item::Column::Quantity,
            Expr::col(cart_item::Column::Quantity).add(delta),
        )
        .filter(cart_item::Column::Id.eq(cart_item_id))
        .filter(cart_item::Column::Quantity.lte(MAX_QUANTITY - delta))
        .exec(db)
        .await?;

    let row = CartItem::find_by_id(cart_item_id)
        .one(db)
        .await?
        .ok_or(Error::CartItemNotFound { id: cart_item_id })?;

    if result.rows_affected == 0 {
        return Err(Error::validation("quantity", quantity_too_large()));
    }
    Ok(row)
}

fn quantity_too_large() -> String {
    format!("Ensure the cart quantity is less than or equal to {MAX_QUANTITY}.")
}

async fn find_owned_item<C>(db: &C, user_id: i64, cart_item_id: i64) -> Result<cart_item::Model>
where
    C: ConnectionTrait,
{
    CartItem::find_by_id(cart_item_id)
        .filter(cart_item::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error::CartItemNotFound { id: cart_item_id })
}

/// Deletes one row from the user's cart.
///
/// # Errors
/// Returns [`Error::CartItemNotFound`] if no such row belongs to the user.
#[instrument(skip(db))]
pub async fn remove_from_cart(db: &DatabaseConnection, user_id: i64, cart_item_id: i64) -> Result<()> {
    let result = CartItem::delete_many()
        .filter(cart_item::Column::Id.eq(cart_item_id))
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::CartItemNotFound { id: cart_item_id });
    }
    Ok(())
}

/// Increments or decrements a cart row by one unit.
///
/// Decrementing a row with quantity 1 leaves it at 1; use [`remove_from_cart`]
/// to drop a product entirely.
///
/// # Errors
/// Returns [`Error::CartItemNotFound`] if no such row belongs to the user, or
/// [`Error::Validation`] when incrementing a row already at [`MAX_QUANTITY`].
#[instrument(skip(db))]
pub async fn adjust_quantity(
    db: &DatabaseConnection,
    user_id: i64,
    cart_item_id: i64,
    adjustment: Adjustment,
) -> Result<cart_item::Model> {
    let item = find_owned_item(db, user_id, cart_item_id).await?;

    match adjustment {
        Adjustment::Increment => increment_quantity(db, item.id, 1).await,
        Adjustment::Decrement => {
            CartItem::update_many()
                .col_expr(
                    cart_item::Column::Quantity,
                    Expr::col(cart_item::Column::Quantity).sub(1),
                )
                .filter(cart_item::Column::Id.eq(item.id))
                .filter(cart_item::Column::Quantity.gt(1))
                .exec(db)
                .await?;
            find_owned_item(db, user_id, cart_item_id).await
        }
    }
}

/// Lists the user's cart rows with their products, ordered by row id.
pub async fn list_cart<C>(db: &C, user_id: i64) -> Result<Vec<CartLine>>
where
    C: ConnectionTrait,
{
    let rows = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .find_also_related(Product)
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|product| CartLine { item, product }))
        .collect())
}
