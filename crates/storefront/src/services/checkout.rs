//! Checkout: turn the session cart into a persisted order.
//!
//! The order row and one item per resolved cart line are written in a single
//! transaction with the unit prices captured in the cart. The cart is cleared
//! only after the transaction commits.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use greenshop_core::OrderId;

use super::cart::{CartError, CartService};
use crate::db::orders::NewOrderLine;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::order::{NewOrder, Order};
use crate::models::session::{CurrentUser, keys};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing in the cart resolves to an existing product.
    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Cart(#[from] CartError),

    /// Session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout service.
pub struct CheckoutService<'a> {
    session: &'a Session,
    cart: CartService<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self {
            session,
            cart: CartService::new(pool, session),
            orders: OrderRepository::new(pool),
        }
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if no cart line resolves to a
    /// product. Database failures leave the cart untouched.
    pub async fn place_order(&self, details: &NewOrder) -> Result<Order, CheckoutError> {
        let cart = self.cart.load().await?;
        let items = self.cart.items(&cart).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines: Vec<NewOrderLine> = items
            .iter()
            .map(|item| NewOrderLine {
                product_id: item.product.product.id,
                quantity: i32::try_from(item.quantity).unwrap_or(i32::MAX),
                unit_price: item.unit_price,
            })
            .collect();

        let order = self.orders.create_with_items(details, &lines).await?;

        self.cart.clear().await?;
        remember_order(self.session, order.id).await?;

        tracing::info!(
            order_id = %order.id,
            lines = lines.len(),
            user_id = ?order.user_id,
            "Order placed"
        );
        Ok(order)
    }
}

/// Record an order id as placed from this session.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn remember_order(
    session: &Session,
    order_id: OrderId,
) -> Result<(), tower_sessions::session::Error> {
    let mut placed = placed_orders(session).await?;
    if !placed.contains(&order_id) {
        placed.push(order_id);
    }
    session.insert(keys::PLACED_ORDERS, placed).await
}

/// Ids of orders placed from this session.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn placed_orders(session: &Session) -> Result<Vec<OrderId>, tower_sessions::session::Error> {
    Ok(session
        .get::<Vec<OrderId>>(keys::PLACED_ORDERS)
        .await?
        .unwrap_or_default())
}

/// Whether `viewer` may see an order's confirmation page.
///
/// Orders with an owner are visible to that user only; guest orders only to
/// the session that placed them.
#[must_use]
pub fn can_view_order(order: &Order, viewer: Option<&CurrentUser>, placed: &[OrderId]) -> bool {
    order.user_id.map_or_else(
        || placed.contains(&order.id),
        |owner| viewer.is_some_and(|user| user.id == owner),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use greenshop_core::{OrderStatus, UserId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn order(id: i32, user_id: Option<i32>) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: user_id.map(UserId::new),
            first_name: "Ivan".to_owned(),
            last_name: "Ivanov".to_owned(),
            email: "ivan@example.com".to_owned(),
            phone: "123".to_owned(),
            address: "Street 1".to_owned(),
            city: "Moscow".to_owned(),
            postal_code: "101000".to_owned(),
            notes: String::new(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn viewer(id: i32) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            username: format!("user{id}"),
            is_staff: false,
        }
    }

    #[test]
    fn test_owner_can_view_own_order() {
        assert!(can_view_order(&order(1, Some(5)), Some(&viewer(5)), &[]));
    }

    #[test]
    fn test_other_user_cannot_view_order() {
        assert!(!can_view_order(&order(1, Some(5)), Some(&viewer(6)), &[]));
        assert!(!can_view_order(
            &order(1, Some(5)),
            None,
            &[OrderId::new(1)]
        ));
    }

    #[test]
    fn test_guest_order_visible_only_to_placing_session() {
        assert!(can_view_order(&order(3, None), None, &[OrderId::new(3)]));
        assert!(!can_view_order(&order(3, None), None, &[OrderId::new(4)]));
        assert!(!can_view_order(&order(3, None), Some(&viewer(1)), &[]));
    }

    #[tokio::test]
    async fn test_remember_order_is_idempotent() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        remember_order(&session, OrderId::new(7)).await.unwrap();
        remember_order(&session, OrderId::new(7)).await.unwrap();
        remember_order(&session, OrderId::new(9)).await.unwrap();
        assert_eq!(
            placed_orders(&session).await.unwrap(),
            vec![OrderId::new(7), OrderId::new(9)]
        );
    }
}
