//! User entity - Registered storefront accounts.
//!
//! Accounts are identified by email. The password column only ever holds an
//! argon2 PHC string, never the plaintext.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login identifier, stored with a lowercased domain part
    #[sea_orm(unique)]
    pub email: String,
    /// Public display name
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password: String,
    /// When the account was registered
    pub start_date: DateTimeUtc,
    /// Free-form profile text
    #[sea_orm(column_type = "Text")]
    pub about: String,
    /// Staff accounts may manage the catalog
    pub is_staff: bool,
    /// Inactive accounts cannot authenticate
    pub is_active: bool,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many login sessions
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
    /// One user has many cart rows
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// One user has many saved shipping addresses
    #[sea_orm(has_many = "super::shipping_address::Entity")]
    ShippingAddresses,
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::shipping_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingAddresses.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
