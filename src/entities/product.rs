//! Product entity - Items offered in the catalog.
//!
//! Each product belongs to exactly one category and carries a fixed-point price.
//! Cart rows and order line items reference products rather than copying them,
//! so a price change is visible everywhere the product is displayed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the category this product is listed under
    pub category_id: i64,
    /// Name of the product (e.g., "Basmati Rice 1kg")
    pub name: String,
    /// Unit price, never negative
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Blob-storage path of the product image, if any
    pub image: Option<String>,
    /// Long-form description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
    /// Products appear in many cart rows
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// Products appear in many order line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
