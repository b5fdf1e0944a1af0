//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod session;
pub mod shipping_address;
pub mod user;

// Re-export specific types to avoid conflicts
pub use cart_item::{Column as CartItemColumn, Entity as CartItem, Model as CartItemModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel};
pub use shipping_address::{
    Column as ShippingAddressColumn, Entity as ShippingAddress, Model as ShippingAddressModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
