//! Per-page template context.
//!
//! Every full-page template embeds a [`PageContext`]: the logged-in user,
//! the cart badge numbers and the flash messages queued for this render.
//! It is built from the session alone.

use axum::{extract::FromRequestParts, http::request::Parts};
use rust_decimal::Decimal;
use tower_sessions::Session;

use greenshop_core::Price;

use crate::models::{CurrentUser, Flash, session_keys};
use crate::services::cart::load_cart;

/// Data shared by every rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub cart_total: Decimal,
    pub messages: Vec<Flash>,
}

impl PageContext {
    /// Cart total for the header badge.
    #[must_use]
    pub fn cart_total_display(&self) -> String {
        Price::store(self.cart_total).display()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_staff)
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("", |user| user.username.as_str())
    }

    /// Build the context from a session, draining its flash queue.
    pub async fn from_session(session: &Session) -> Self {
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        let cart = load_cart(session).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read cart for page context");
            Default::default()
        });

        let messages = Flash::drain(session).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to drain flash messages");
            Vec::new()
        });

        Self {
            user,
            cart_count: cart.len(),
            cart_total: cart.total(),
            messages,
        }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<Session>() {
            Some(session) => Self::from_session(session).await,
            None => Self::default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use greenshop_core::{ProductId, UserId};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::{Cart, FlashLevel};

    #[tokio::test]
    async fn test_page_context_reads_session_and_drains_flashes() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let mut cart = Cart::default();
        cart.add(ProductId::new(1), Decimal::new(2499, 0), 2, false);
        session.insert(session_keys::CART, &cart).await.unwrap();
        session
            .insert(
                session_keys::CURRENT_USER,
                CurrentUser {
                    id: UserId::new(7),
                    username: "anna".to_owned(),
                    is_staff: false,
                },
            )
            .await
            .unwrap();
        Flash::push(&session, FlashLevel::Success, "Profile updated.")
            .await
            .unwrap();

        let context = PageContext::from_session(&session).await;
        assert_eq!(context.cart_count, 2);
        assert_eq!(context.cart_total_display(), "4998.00 ₽");
        assert_eq!(context.username(), "anna");
        assert!(!context.is_staff());
        assert_eq!(context.messages.len(), 1);

        let again = PageContext::from_session(&session).await;
        assert!(again.messages.is_empty());
    }

    #[test]
    fn test_default_context_is_anonymous() {
        let context = PageContext::default();
        assert!(!context.is_authenticated());
        assert_eq!(context.cart_count, 0);
        assert_eq!(context.cart_total_display(), "0.00 ₽");
    }
}
