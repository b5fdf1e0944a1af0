//! Order entity - A placed order and its recorded subtotal.
//!
//! The subtotal is written once at checkout and never recomputed. The shipping
//! address reference is cleared (not cascaded) if the address row is deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer who placed the order
    pub user_id: i64,
    /// Address the order ships to, None once the address is deleted
    pub shipping_address_id: Option<i64>,
    /// When the order was placed
    pub order_date: DateTimeUtc,
    /// Always true for orders created through checkout
    pub is_ordered: bool,
    /// Amount recorded at checkout
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub subtotal: Decimal,
    /// Opaque payment-provider reference supplied by the client
    pub payment_id: Option<String>,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Each order ships to at most one address
    #[sea_orm(
        belongs_to = "super::shipping_address::Entity",
        from = "Column::ShippingAddressId",
        to = "super::shipping_address::Column::Id",
        on_delete = "SetNull"
    )]
    ShippingAddress,
    /// One order has many line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::shipping_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingAddress.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
