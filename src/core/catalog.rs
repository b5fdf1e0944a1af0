//! Catalog business logic - Categories and products.
//!
//! Listing is read-only and returns whole tables in id order. Creation validates
//! names and prices the same way for seeding and for tests. `seed_catalog` is
//! idempotent: categories are matched by title and products by (category, name).

use crate::{
    config::catalog::CatalogConfig,
    core::validation::{FieldErrors, REQUIRED, check_decimal},
    entities::{Category, Product, category, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Maximum category title length.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum product name length.
pub const MAX_PRODUCT_NAME_LEN: usize = 50;

/// A product together with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListing {
    /// The product row
    pub product: product::Model,
    /// Category the product is listed under
    pub category: category::Model,
}

/// Retrieves every category, ordered by id.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every product with its category embedded, ordered by product id.
///
/// # Errors
/// Returns an error if the query fails or a product points at a missing category.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<ProductListing>> {
    let rows = Product::find()
        .find_also_related(Category)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(product, category)| {
            let category = category.ok_or_else(|| Error::CategoryNotFound {
                id: product.category_id,
            })?;
            Ok(ProductListing { product, category })
        })
        .collect()
}

/// Retrieves a product by its unique ID.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new category after checking the title.
///
/// # Errors
/// Returns [`Error::Validation`] if the title is blank or longer than [`MAX_TITLE_LEN`].
pub async fn create_category(
    db: &DatabaseConnection,
    title: &str,
    image: Option<String>,
) -> Result<category::Model> {
    let mut errors = FieldErrors::default();
    let title = title.trim();
    if title.is_empty() {
        errors.add("title", REQUIRED);
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.add(
            "title",
            format!("Ensure this field has no more than {MAX_TITLE_LEN} characters."),
        );
    }
    errors.into_result()?;

    category::ActiveModel {
        title: Set(title.to_string()),
        image: Set(image),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Owning category
    pub category_id: i64,
    /// Display name
    pub name: String,
    /// Unit price, at least zero
    pub price: Decimal,
    /// Optional image path
    pub image: Option<String>,
    /// Optional description
    pub description: Option<String>,
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The name is blank or longer than [`MAX_PRODUCT_NAME_LEN`]
/// - The price is negative or does not fit `decimal(10, 2)`
/// - The category does not exist
/// - The database insert fails
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    let mut errors = FieldErrors::default();
    let name = new.name.trim();
    if name.is_empty() {
        errors.add("name", REQUIRED);
    } else if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        errors.add(
            "name",
            format!("Ensure this field has no more than {MAX_PRODUCT_NAME_LEN} characters."),
        );
    }
    check_decimal(&mut errors, "price", new.price, 10, 2);
    errors.into_result()?;

    if Category::find_by_id(new.category_id).one(db).await?.is_none() {
        return Err(Error::CategoryNotFound {
            id: new.category_id,
        });
    }

    product::ActiveModel {
        category_id: Set(new.category_id),
        name: Set(name.to_string()),
        price: Set(new.price),
        image: Set(new.image),
        description: Set(new.description),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Counts of rows created by a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Categories inserted
    pub categories_created: usize,
    /// Products inserted
    pub products_created: usize,
}

/// Creates any categories and products from `config` that do not exist yet.
#[instrument(skip_all)]
pub async fn seed_catalog(db: &DatabaseConnection, config: &CatalogConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for seed in &config.categories {
        let existing = Category::find()
            .filter(category::Column::Title.eq(seed.title.trim()))
            .one(db)
            .await?;
        let category = match existing {
            Some(found) => found,
            None => {
                summary.categories_created += 1;
                create_category(db, &seed.title, seed.image.clone()).await?
            }
        };

        for item in &seed.products {
            let exists = Product::find()
                .filter(product::Column::CategoryId.eq(category.id))
                .filter(product::Column::Name.eq(item.name.trim()))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }
            create_product(
                db,
                NewProduct {
                    category_id: category.id,
                    name: item.name.clone(),
                    price: item.price,
                    image: item.image.clone(),
                    description: item.description.clone(),
                },
            )
            .await?;
            summary.products_created += 1;
        }
    }

    info!(
        categories = summary.categories_created,
        products = summary.products_created,
        "Catalog seeded"
    );
    Ok(summary)
}
