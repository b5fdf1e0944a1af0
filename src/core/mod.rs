/// Registration, password checks and cookie sessions
pub mod accounts;

/// Per-user cart rows
pub mod cart;

/// Categories, products and catalog seeding
pub mod catalog;

/// Turning a cart into an order, and order history
pub mod checkout;

/// JWT access and refresh tokens
pub mod tokens;

/// Field-level validation helpers
pub mod validation;
