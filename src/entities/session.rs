//! Session entity - Server-side login sessions keyed by an opaque cookie token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Unique identifier for the session
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Random token sent to the client in the `sessionid` cookie
    #[sea_orm(unique)]
    pub token: String,
    /// User the session logs in
    pub user_id: i64,
    /// When the session was opened
    pub created_at: DateTimeUtc,
    /// Sessions past this instant no longer authenticate
    pub expires_at: DateTimeUtc,
}

/// Defines relationships between Session and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
