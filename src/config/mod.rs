/// Database configuration and connection management
pub mod database;

/// Catalog seed loading from a TOML file
pub mod catalog;

/// Server and authentication settings from environment variables
pub mod settings;

pub use settings::Settings;
