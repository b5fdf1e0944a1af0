//! Database configuration module for the storefront.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{
    CartItem, Category, Order, OrderItem, Product, Session, ShippingAddress, User, cart_item,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Default database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing) from the entity definitions.
///
/// Parents are created before children so foreign keys resolve on every backend.
/// Also creates the unique `(user_id, product_id)` index on `cart_items`.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Session).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, CartItem).await?;
    create_table(db, &schema, ShippingAddress).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;

    let cart_index = Index::create()
        .name("idx_cart_items_user_product")
        .table(CartItem)
        .col(cart_item::Column::UserId)
        .col(cart_item::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&cart_index)).await?;

    info!("Database tables ensured.");
    Ok(())
}
