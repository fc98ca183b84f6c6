//! Catalog repository: categories, products and gallery images.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use greenshop_core::{CategoryId, ProductId, ProductImageId};

use super::{RepositoryError, like_pattern};
use crate::models::catalog::{Category, Product, ProductImage, ProductSummary};
use crate::models::pagination::{self, Page};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, category_id, name, slug, description, price, stock, \
     main_image, is_active, is_featured, rating, created_at, updated_at";

/// Products joined with their category; the primary image is the main
/// gallery image, else the first gallery image, else `main_image`.
const SUMMARY_SELECT: &str = r"
SELECT p.id, p.category_id, p.name, p.slug, p.description, p.price, p.stock,
       p.main_image, p.is_active, p.is_featured, p.rating, p.created_at, p.updated_at,
       c.name AS category_name, c.slug AS category_slug,
       COALESCE(
           (SELECT pi.image FROM product_images pi
            WHERE pi.product_id = p.id
            ORDER BY pi.is_main DESC, pi.display_order, pi.id
            LIMIT 1),
           NULLIF(p.main_image, '')
       ) AS primary_image
FROM products p
JOIN categories c ON c.id = p.category_id
";

const IMAGE_COLUMNS: &str =
    "id, product_id, image, alt_text, is_main, display_order, created_at, updated_at";

/// Public catalog filters.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive substring over name or description.
    pub query: Option<String>,
    /// Newest first instead of by name.
    pub newest_first: bool,
}

/// Admin product list filters.
#[derive(Debug, Clone, Default)]
pub struct AdminProductFilter {
    pub category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub query: Option<String>,
}

/// Fields written when creating or editing a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
}

/// Fields written when creating or editing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub main_image: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub rating: Decimal,
}

/// Inline quick-edit fields from the admin product list.
#[derive(Debug, Clone, Copy)]
pub struct ProductQuickEdit {
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
}

/// A gallery image about to be stored.
#[derive(Debug, Clone)]
pub struct NewProductImage {
    pub product_id: ProductId,
    pub image: String,
    pub alt_text: String,
    pub is_main: bool,
    pub display_order: i32,
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Categories whose name contains `query` (admin search).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_categories(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories"
        ));
        if let Some(query) = query {
            qb.push(" WHERE name ILIKE ").push_bind(like_pattern(query));
        }
        qb.push(" ORDER BY name");
        Ok(qb.build_query_as::<Category>().fetch_all(self.pool).await?)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, slug, description, image) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category"))
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist and
    /// `RepositoryError::Conflict` if the name or slug is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, image = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category and, by cascade, its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if one of its products appears in
    /// an order and `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_categories(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool)
            .await?)
    }

    // =========================================================================
    // Storefront product queries
    // =========================================================================

    /// Active featured products, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured_products(&self, limit: i64) -> Result<Vec<ProductSummary>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.is_active AND p.is_featured ORDER BY p.name, p.id LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Most recently created active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest_products(&self, limit: i64) -> Result<Vec<ProductSummary>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.is_active ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// One page of the public catalog.
    ///
    /// `raw_page` is the unparsed `page` query value; see
    /// [`pagination::resolve_page`] for how it is interpreted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn catalog_page(
        &self,
        filter: &CatalogFilter,
        raw_page: Option<&str>,
    ) -> Result<Page<ProductSummary>, RepositoryError> {
        let per_page = Page::<ProductSummary>::CATALOG_PER_PAGE;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p JOIN categories c ON c.id = p.category_id",
        );
        push_catalog_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let num_pages = pagination::num_pages(total, per_page);
        let number = pagination::resolve_page(raw_page, num_pages);

        let mut select = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_catalog_filters(&mut select, filter);
        if filter.newest_first {
            select.push(" ORDER BY p.created_at DESC, p.id DESC");
        } else {
            select.push(" ORDER BY p.name, p.id");
        }
        select
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind((number - 1) * per_page);
        let items = select
            .build_query_as::<ProductSummary>()
            .fetch_all(self.pool)
            .await?;

        Ok(Page {
            items,
            number,
            num_pages,
            total,
        })
    }

    /// An active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_product_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let product = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.slug = $1 AND p.is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// An active product by ID (used when adding to the cart).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Up to `limit` other active products from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related_products(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.category_id = $1 AND p.is_active AND p.id <> $2 \
             ORDER BY p.name, p.id LIMIT $3"
        ))
        .bind(product.category_id)
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Products with the given IDs regardless of status; missing IDs are
    /// simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    // =========================================================================
    // Admin product management
    // =========================================================================

    /// Filtered product list for the admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_products(
        &self,
        filter: &AdminProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        qb.push(" WHERE TRUE");
        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND p.is_active = ").push_bind(is_active);
        }
        if let Some(is_featured) = filter.is_featured {
            qb.push(" AND p.is_featured = ").push_bind(is_featured);
        }
        if let Some(query) = &filter.query {
            let pattern = like_pattern(query);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY p.name, p.id");
        Ok(qb
            .build_query_as::<ProductSummary>()
            .fetch_all(self.pool)
            .await?)
    }

    /// Get a product by ID regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (category_id, name, slug, description, price, stock, \
             main_image, is_active, is_featured, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.main_image)
        .bind(input.is_active)
        .bind(input.is_featured)
        .bind(input.rating)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product"))
    }

    /// Update every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET category_id = $2, name = $3, slug = $4, description = $5, \
             price = $6, stock = $7, main_image = $8, is_active = $9, is_featured = $10, \
             rating = $11, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.main_image)
        .bind(input.is_active)
        .bind(input.is_featured)
        .bind(input.rating)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Apply an inline quick edit from the product list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn quick_edit_product(
        &self,
        id: ProductId,
        edit: ProductQuickEdit,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET price = $2, stock = $3, is_active = $4, is_featured = $5, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(edit.price)
        .bind(edit.stock)
        .bind(edit.is_active)
        .bind(edit.is_featured)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if order history references it
    /// and `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "product"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_products(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?)
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    /// Gallery images of a product ordered by `(display_order, id)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_images(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM product_images WHERE product_id = $1 \
             ORDER BY display_order, id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(images)
    }

    /// Store a gallery image record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if the product does not exist.
    pub async fn add_image(&self, image: &NewProductImage) -> Result<ProductImage, RepositoryError> {
        sqlx::query_as::<_, ProductImage>(&format!(
            "INSERT INTO product_images (product_id, image, alt_text, is_main, display_order) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(image.product_id)
        .bind(&image.image)
        .bind(&image.alt_text)
        .bind(image.is_main)
        .bind(image.display_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product image"))
    }

    /// Delete a gallery image, returning the removed record so its file can
    /// be cleaned up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to
    /// the product.
    pub async fn delete_image(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<ProductImage, RepositoryError> {
        sqlx::query_as::<_, ProductImage>(&format!(
            "DELETE FROM product_images WHERE id = $1 AND product_id = $2 \
             RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

/// Append the public catalog `WHERE` clause.
fn push_catalog_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CatalogFilter) {
    qb.push(" WHERE p.is_active");
    if let Some(slug) = &filter.category {
        qb.push(" AND c.slug = ").push_bind(slug.clone());
    }
    if let Some(query) = &filter.query {
        let pattern = like_pattern(query);
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_filters_sql() {
        let filter = CatalogFilter {
            category: Some("kosmetika".to_owned()),
            query: Some("крем".to_owned()),
            newest_first: false,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products p");
        push_catalog_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM products p WHERE p.is_active AND c.slug = $1 \
             AND (p.name ILIKE $2 OR p.description ILIKE $3)"
        );
    }

    #[test]
    fn test_catalog_filters_default_only_active() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products p");
        push_catalog_filters(&mut qb, &CatalogFilter::default());
        assert_eq!(qb.sql(), "SELECT 1 FROM products p WHERE p.is_active");
    }
}
