//! Cart service.
//!
//! Loads the [`Cart`] from the session, applies a change, and writes it back.
//! Adding looks the product up in the catalog so the captured price is the
//! live price at that moment.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use greenshop_core::ProductId;

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::cart::{Cart, CartItem};
use crate::models::catalog::Product;
use crate::models::session::keys;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist or is not active.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Quantity missing the 1..=99 range or not a number.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Read the cart from the session; a missing cart is empty.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Parse a submitted quantity. A missing value means 1.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` for non-numbers and values outside
/// `1..=99`.
pub fn parse_quantity(raw: Option<&str>) -> Result<u32, CartError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(1);
    };
    match raw.parse::<u32>() {
        Ok(quantity) if (1..=Cart::MAX_QUANTITY).contains(&quantity) => Ok(quantity),
        _ => Err(CartError::InvalidQuantity(raw.to_owned())),
    }
}

/// Session cart operations.
pub struct CartService<'a> {
    session: &'a Session,
    catalog: CatalogRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self {
            session,
            catalog: CatalogRepository::new(pool),
        }
    }

    /// The current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read.
    pub async fn load(&self) -> Result<Cart, CartError> {
        Ok(load_cart(self.session).await?)
    }

    async fn save(&self, cart: &Cart) -> Result<(), CartError> {
        self.session.insert(keys::CART, cart).await?;
        Ok(())
    }

    /// Add (or with `replace`, set) a quantity of an active product.
    ///
    /// Returns the updated cart and the product that was added.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product is missing or
    /// inactive; the cart is left unchanged in that case.
    pub async fn add(
        &self,
        product_id: ProductId,
        quantity: u32,
        replace: bool,
    ) -> Result<(Cart, Product), CartError> {
        let product = self
            .catalog
            .active_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let mut cart = self.load().await?;
        cart.add(product.id, product.price, quantity, replace);
        self.save(&cart).await?;

        tracing::debug!(product_id = %product.id, quantity, replace, "Cart updated");
        Ok((cart, product))
    }

    /// Remove a product; a product that is not in the cart is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be updated.
    pub async fn remove(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let mut cart = self.load().await?;
        if cart.remove(product_id) {
            self.save(&cart).await?;
        }
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be updated.
    pub async fn clear(&self) -> Result<(), CartError> {
        self.save(&Cart::default()).await
    }

    /// Resolve the cart's lines against current product records.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the products cannot be loaded.
    pub async fn items(&self, cart: &Cart) -> Result<Vec<CartItem>, CartError> {
        let products = self.catalog.products_by_ids(&cart.product_ids()).await?;
        Ok(cart.resolve(&products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_defaults_to_one() {
        assert_eq!(parse_quantity(None).ok(), Some(1));
        assert_eq!(parse_quantity(Some("  ")).ok(), Some(1));
    }

    #[test]
    fn test_parse_quantity_range() {
        assert_eq!(parse_quantity(Some("1")).ok(), Some(1));
        assert_eq!(parse_quantity(Some("99")).ok(), Some(99));
        assert!(matches!(
            parse_quantity(Some("0")),
            Err(CartError::InvalidQuantity(_))
        ));
        assert!(parse_quantity(Some("100")).is_err());
        assert!(parse_quantity(Some("-2")).is_err());
        assert!(parse_quantity(Some("two")).is_err());
    }

    #[tokio::test]
    async fn test_load_cart_from_empty_session() {
        let store = std::sync::Arc::new(tower_sessions::MemoryStore::default());
        let session = Session::new(None, store, None);
        let cart = load_cart(&session).await;
        assert!(cart.is_ok_and(|cart| cart.is_empty()));
    }
}
