//! Demo data seeding.
//!
//! Creates four categories and six products so a fresh database has
//! something to browse. Rows are matched by slug, so running the command
//! again only fills in what is missing.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use greenshop_core::slugify;

use super::CommandError;

/// Stock given to every seeded product.
const SEED_STOCK: i32 = 50;

/// Demo categories: name and description.
pub const DEMO_CATEGORIES: [(&str, &str); 4] = [
    ("Органические продукты", "Все самое свежее и экологичное."),
    ("Косметика", "Натуральные средства по уходу."),
    ("Дом и интерьер", "Товары для уютного и эко-дома."),
    ("Спорт и активный отдых", "Снаряжение и одежда."),
];

/// A demo product. `category` is the name of one of [`DEMO_CATEGORIES`].
#[derive(Debug, Clone, Copy)]
pub struct DemoProduct {
    pub name: &'static str,
    pub category: &'static str,
    /// Price in kopecks.
    pub price_minor: i64,
    pub description: &'static str,
    pub is_featured: bool,
}

impl DemoProduct {
    #[must_use]
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_minor, 2)
    }
}

pub const DEMO_PRODUCTS: [DemoProduct; 6] = [
    DemoProduct {
        name: "Эко набор для кухни",
        category: "Дом и интерьер",
        price_minor: 249_900,
        description: "Комплект бамбуковой посуды и льняных салфеток.",
        is_featured: true,
    },
    DemoProduct {
        name: "Набор органических специй",
        category: "Органические продукты",
        price_minor: 109_900,
        description: "Ароматные специи без усилителей вкуса.",
        is_featured: true,
    },
    DemoProduct {
        name: "Веганский крем для лица",
        category: "Косметика",
        price_minor: 189_000,
        description: "Легкий увлажняющий крем на растительной основе.",
        is_featured: true,
    },
    DemoProduct {
        name: "Термос из переработанной стали",
        category: "Спорт и активный отдых",
        price_minor: 159_000,
        description: "Держит температуру до 12 часов, подходит для походов.",
        is_featured: false,
    },
    DemoProduct {
        name: "Бамбуковая зубная щётка",
        category: "Косметика",
        price_minor: 29_000,
        description: "Разлагаемая щетка с мягкой щетиной.",
        is_featured: false,
    },
    DemoProduct {
        name: "Набор многоразовых мешочков",
        category: "Дом и интерьер",
        price_minor: 59_000,
        description: "Удобно для покупок и хранения продуктов.",
        is_featured: false,
    },
];

/// Seed the demo store.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a query fails.
pub async fn demo_store() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let mut categories = Vec::with_capacity(DEMO_CATEGORIES.len());
    for (name, description) in DEMO_CATEGORIES {
        let id = get_or_create_category(&pool, name, description).await?;
        categories.push((slugify(name), id));
    }

    let mut created = 0;
    for product in &DEMO_PRODUCTS {
        let category_slug = slugify(product.category);
        let Some((_, category_id)) = categories.iter().find(|(slug, _)| *slug == category_slug)
        else {
            continue;
        };
        if create_product_if_missing(&pool, *category_id, product).await? {
            created += 1;
        }
    }

    info!(
        products_created = created,
        categories = categories.len(),
        "Seeding complete!"
    );
    Ok(())
}

async fn get_or_create_category(
    pool: &PgPool,
    name: &str,
    description: &str,
) -> Result<i32, sqlx::Error> {
    let slug = slugify(name);
    sqlx::query(
        "INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3) \
         ON CONFLICT (slug) DO NOTHING",
    )
    .bind(name)
    .bind(&slug)
    .bind(description)
    .execute(pool)
    .await?;

    sqlx::query_scalar("SELECT id FROM categories WHERE slug = $1")
        .bind(&slug)
        .fetch_one(pool)
        .await
}

/// Returns whether a new row was inserted.
async fn create_product_if_missing(
    pool: &PgPool,
    category_id: i32,
    product: &DemoProduct,
) -> Result<bool, sqlx::Error> {
    let inserted: Option<i32> = sqlx::query_scalar(
        "INSERT INTO products (category_id, name, slug, description, price, stock, is_active, is_featured) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7) \
         ON CONFLICT (slug) DO NOTHING RETURNING id",
    )
    .bind(category_id)
    .bind(product.name)
    .bind(slugify(product.name))
    .bind(product.description)
    .bind(product.price())
    .bind(SEED_STOCK)
    .bind(product.is_featured)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_every_product_has_a_category() {
        let category_slugs: HashSet<String> =
            DEMO_CATEGORIES.iter().map(|(name, _)| slugify(name)).collect();
        for product in &DEMO_PRODUCTS {
            assert!(
                category_slugs.contains(&slugify(product.category)),
                "{} has no category",
                product.name
            );
        }
    }

    #[test]
    fn test_product_slugs_are_unique() {
        let slugs: HashSet<String> = DEMO_PRODUCTS.iter().map(|p| slugify(p.name)).collect();
        assert_eq!(slugs.len(), DEMO_PRODUCTS.len());
        assert!(slugs.contains("eko-nabor-dlya-kuhni"));
    }

    #[test]
    fn test_price() {
        assert_eq!(DEMO_PRODUCTS[0].price().to_string(), "2499.00");
        assert_eq!(DEMO_PRODUCTS[4].price().to_string(), "290.00");
    }
}
