//! Shipping address entity - Delivery details captured at checkout.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shipping address database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipping_addresses")]
pub struct Model {
    /// Unique identifier for the address
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer the address was captured for
    #[serde(rename = "user")]
    pub user_id: i64,
    /// Street address, free text
    #[sea_orm(column_type = "Text")]
    pub shipping_address: String,
    /// Contact number, at most 15 characters
    pub mobile_number: String,
    /// At most 100 characters
    pub city: String,
    /// Postal code, at most 10 characters
    pub pincode: String,
}

/// Defines relationships between ShippingAddress and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each address belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Orders shipped to this address
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
