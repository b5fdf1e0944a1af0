//! Catalog seed configuration loaded from a TOML file.
//!
//! The file lists categories and, nested under each, the products to create.
//! Seeding is idempotent, see `core::catalog::seed_catalog`.

use crate::errors::{Error, Result};
use sea_orm::prelude::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire catalog file
#[derive(Debug, Deserialize, Default)]
pub struct CatalogConfig {
    /// Categories to seed, in order
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// A category and the products listed under it
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Category title, used as the lookup key when re-seeding
    pub title: String,
    /// Optional image path
    pub image: Option<String>,
    /// Products belonging to this category
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A single product entry
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Product name, unique within its category for seeding purposes
    pub name: String,
    /// Unit price, written as a string (`"12.50"`) or a number
    pub price: Decimal,
    /// Optional image path
    pub image: Option<String>,
    /// Optional description
    pub description: Option<String>,
}

/// Loads the catalog seed from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    parse_catalog(&contents)
}

/// Parses catalog TOML from a string.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog file: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let toml_str = r#"
            [[categories]]
            title = "Fruits"
            image = "category/fruits.png"

            [[categories.products]]
            name = "Apple"
            price = "1.20"
            description = "Crisp red apples"

            [[categories.products]]
            name = "Banana"
            price = 0.5

            [[categories]]
            title = "Dairy"
        "#;

        let config = parse_catalog(toml_str).unwrap();
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].title, "Fruits");
        assert_eq!(
            config.categories[0].image.as_deref(),
            Some("category/fruits.png")
        );
        assert_eq!(config.categories[0].products.len(), 2);
        assert_eq!(config.categories[0].products[0].price, Decimal::new(120, 2));
        assert_eq!(config.categories[0].products[1].price, Decimal::new(5, 1));
        assert!(config.categories[1].products.is_empty());
        assert!(config.categories[1].image.is_none());
    }

    #[test]
    fn test_parse_catalog_rejects_missing_price() {
        let toml_str = r#"
            [[categories]]
            title = "Fruits"

            [[categories.products]]
            name = "Apple"
        "#;

        let result = parse_catalog(toml_str);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let result = load_catalog("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
