//! Catalog fixture loading.
//!
//! Reads `catalog_categories.json` and `catalog_products.json`, both lists of
//! `{"model": ..., "pk": ..., "fields": {...}}` records, and upserts them by
//! primary key in a single transaction. Products whose category does not
//! exist are skipped.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, Postgres, Transaction};
use thiserror::Error;
use tracing::{info, warn};

use super::CommandError;

pub const CATEGORIES_FILE: &str = "catalog_categories.json";
pub const PRODUCTS_FILE: &str = "catalog_products.json";

/// Errors that can occur while loading fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Fixture not found: {0}")]
    NotFound(String),

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid fixture {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One fixture record.
#[derive(Debug, Deserialize)]
pub struct Record<F> {
    pub pk: i32,
    pub fields: F,
}

#[derive(Debug, Deserialize)]
pub struct CategoryFields {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image_url")]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductFields {
    pub category: i32,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default, alias = "image_url")]
    pub main_image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_rating")]
    pub rating: Decimal,
}

const fn default_true() -> bool {
    true
}

fn default_rating() -> Decimal {
    Decimal::new(450, 2)
}

/// Blank image paths are stored as NULL.
fn image_path(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a fixture file's contents.
///
/// # Errors
///
/// Returns the JSON error if the document does not match the record shape.
pub fn parse<F: for<'de> Deserialize<'de>>(json: &str) -> Result<Vec<Record<F>>, serde_json::Error> {
    serde_json::from_str(json)
}

async fn read_fixture<F: for<'de> Deserialize<'de>>(
    dir: &Path,
    name: &str,
) -> Result<Vec<Record<F>>, FixtureError> {
    let path = dir.join(name);
    let display = path.display().to_string();
    if !path.exists() {
        return Err(FixtureError::NotFound(display));
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| FixtureError::Io {
            path: display.clone(),
            source,
        })?;
    parse(&content).map_err(|source| FixtureError::Json {
        path: display,
        source,
    })
}

/// Load the catalog fixtures from `dir`.
///
/// # Errors
///
/// Returns an error if a fixture is missing or malformed, or any database
/// statement fails. Nothing is written in that case.
pub async fn load(dir: &Path, flush: bool) -> Result<(), FixtureError> {
    // Parse both files before touching the database
    let categories: Vec<Record<CategoryFields>> = read_fixture(dir, CATEGORIES_FILE).await?;
    let products: Vec<Record<ProductFields>> = read_fixture(dir, PRODUCTS_FILE).await?;
    info!(
        categories = categories.len(),
        products = products.len(),
        "Parsed fixtures"
    );

    let pool = super::connect().await?;
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

    if flush {
        info!("Deleting existing products and categories...");
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;
    }

    let mut created_categories = 0;
    for record in &categories {
        if upsert_category(&mut tx, record).await? {
            created_categories += 1;
        }
    }

    let mut created_products = 0;
    let mut skipped = 0;
    for record in &products {
        let category_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(record.fields.category)
                .fetch_one(&mut *tx)
                .await?;
        if !category_exists {
            warn!(
                product = record.pk,
                category = record.fields.category,
                "Skipping product with unknown category"
            );
            skipped += 1;
            continue;
        }
        if upsert_product(&mut tx, record).await? {
            created_products += 1;
        }
    }

    // Explicit ids leave the serial sequences behind
    reset_sequence(&mut tx, "categories").await?;
    reset_sequence(&mut tx, "products").await?;

    tx.commit().await?;

    info!(
        categories_created = created_categories,
        products_created = created_products,
        products_skipped = skipped,
        "Catalog loaded"
    );
    Ok(())
}

/// Returns whether the row was inserted rather than updated.
async fn upsert_category(
    conn: &mut PgConnection,
    record: &Record<CategoryFields>,
) -> Result<bool, sqlx::Error> {
    let fields = &record.fields;
    sqlx::query_scalar(
        "INSERT INTO categories (id, name, slug, description, image) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, slug = EXCLUDED.slug, \
             description = EXCLUDED.description, image = EXCLUDED.image, \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(record.pk)
    .bind(&fields.name)
    .bind(&fields.slug)
    .bind(&fields.description)
    .bind(image_path(fields.image.as_deref()))
    .fetch_one(conn)
    .await
}

/// Returns whether the row was inserted rather than updated.
async fn upsert_product(
    conn: &mut PgConnection,
    record: &Record<ProductFields>,
) -> Result<bool, sqlx::Error> {
    let fields = &record.fields;
    sqlx::query_scalar(
        "INSERT INTO products \
             (id, category_id, name, slug, description, price, stock, main_image, \
              is_active, is_featured, rating) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (id) DO UPDATE SET \
             category_id = EXCLUDED.category_id, name = EXCLUDED.name, \
             slug = EXCLUDED.slug, description = EXCLUDED.description, \
             price = EXCLUDED.price, stock = EXCLUDED.stock, \
             main_image = EXCLUDED.main_image, is_active = EXCLUDED.is_active, \
             is_featured = EXCLUDED.is_featured, rating = EXCLUDED.rating, \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(record.pk)
    .bind(fields.category)
    .bind(&fields.name)
    .bind(&fields.slug)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(fields.stock)
    .bind(image_path(fields.main_image.as_deref()))
    .bind(fields.is_active)
    .bind(fields.is_featured)
    .bind(fields.rating)
    .fetch_one(conn)
    .await
}

/// Move a table's id sequence past its largest id.
async fn reset_sequence(conn: &mut PgConnection, table: &'static str) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    ))
    .execute(conn)
    .await?;
    Ok(())
}
