//! Public catalog endpoints.

use super::{AppState, money};
use crate::{
    core::catalog::{self, ProductListing},
    entities::category,
    errors::Result,
};
use axum::{Json, extract::State};
use sea_orm::prelude::Decimal;
use serde::Serialize;

/// A product as listed, with its category embedded.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    id: i64,
    name: String,
    #[serde(serialize_with = "money")]
    price: Decimal,
    image: Option<String>,
    description: Option<String>,
    category: category::Model,
}

impl From<ProductListing> for ProductResponse {
    fn from(listing: ProductListing) -> Self {
        let ProductListing { product, category } = listing;
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            image: product.image,
            description: product.description,
            category,
        }
    }
}

/// `GET /api/products`
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let listings = catalog::list_products(&state.db).await?;
    Ok(Json(listings.into_iter().map(Into::into).collect()))
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<category::Model>>> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}
