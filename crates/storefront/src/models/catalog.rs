//! Catalog row types: categories, products and gallery images.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use greenshop_core::{CategoryId, Price, ProductId, ProductImageId};

/// A product category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Catalog URL filtered to this category.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/catalog?category={}", urlencoding::encode(&self.slug))
    }

    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        self.image.as_deref().filter(|path| !path.is_empty()).map(media_url)
    }
}

/// A product as stored in `products`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn url(&self) -> String {
        format!("/product/{}", self.slug)
    }

    #[must_use]
    pub fn price_display(&self) -> String {
        Price::store(self.price).display()
    }

    /// Price without currency, as used in form inputs.
    #[must_use]
    pub fn price_input(&self) -> String {
        Price::format_amount(self.price)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product with its category name and resolved primary image, as shown in
/// listings and the cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSummary {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: String,
    pub category_slug: String,
    pub primary_image: Option<String>,
}

impl ProductSummary {
    /// Public URL of the primary image, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        self.primary_image.as_deref().map(media_url)
    }
}

/// A gallery image attached to a product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub image: String,
    pub alt_text: String,
    pub is_main: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductImage {
    #[must_use]
    pub fn url(&self) -> String {
        media_url(&self.image)
    }
}

/// Pick the image a product is shown with.
///
/// Preference: the gallery image flagged main, then the first gallery image
/// in display order, then the product's own `main_image`. `gallery` must be
/// ordered by `(display_order, id)`.
#[must_use]
pub fn primary_image<'a>(gallery: &'a [ProductImage], main_image: Option<&'a str>) -> Option<&'a str> {
    gallery
        .iter()
        .find(|image| image.is_main)
        .or_else(|| gallery.first())
        .map(|image| image.image.as_str())
        .or_else(|| main_image.filter(|path| !path.is_empty()))
}

/// Map a stored media path (e.g. `products/gallery/x.jpg`) to its URL.
///
/// Absolute URLs from imported fixtures pass through unchanged.
#[must_use]
pub fn media_url(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/media/{path}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: i32, name: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: name.to_owned(),
            slug: greenshop_core::slugify(name),
            description: String::new(),
            price: price.parse().unwrap(),
            stock: 50,
            main_image: None,
            is_active: true,
            is_featured: false,
            rating: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn summary(id: i32, name: &str, price: &str) -> ProductSummary {
        ProductSummary {
            product: product(id, name, price),
            category_name: "Home".to_owned(),
            category_slug: "home".to_owned(),
            primary_image: None,
        }
    }

    fn image(id: i32, path: &str, is_main: bool) -> ProductImage {
        ProductImage {
            id: ProductImageId::new(id),
            product_id: ProductId::new(1),
            image: path.to_owned(),
            alt_text: String::new(),
            is_main,
            display_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_primary_image_prefers_main_flag() {
        let gallery = vec![image(1, "a.jpg", false), image(2, "b.jpg", true)];
        assert_eq!(primary_image(&gallery, Some("m.jpg")), Some("b.jpg"));
    }

    #[test]
    fn test_primary_image_falls_back_to_first_gallery_image() {
        let gallery = vec![image(1, "a.jpg", false), image(2, "b.jpg", false)];
        assert_eq!(primary_image(&gallery, Some("m.jpg")), Some("a.jpg"));
    }

    #[test]
    fn test_primary_image_falls_back_to_main_image() {
        assert_eq!(primary_image(&[], Some("m.jpg")), Some("m.jpg"));
        assert_eq!(primary_image(&[], Some("")), None);
        assert_eq!(primary_image(&[], None), None);
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("products/gallery/x.jpg"), "/media/products/gallery/x.jpg");
        assert_eq!(
            media_url("https://cdn.example/x.jpg"),
            "https://cdn.example/x.jpg"
        );
    }

    #[test]
    fn test_product_display_helpers() {
        let p = product(1, "Эко набор для кухни", "2499");
        assert_eq!(p.url(), "/product/eko-nabor-dlya-kuhni");
        assert_eq!(p.price_display(), "2499.00 ₽");
        assert_eq!(p.price_input(), "2499.00");
        assert!(p.in_stock());
    }
}
