//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use greenshop_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Whether the user may enter the admin area.
    pub is_staff: bool,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the session cart.
    pub const CART: &str = "cart";

    /// Key for queued flash messages.
    pub const FLASH: &str = "_flash";

    /// Key for the ids of orders placed from this session.
    pub const PLACED_ORDERS: &str = "placed_orders";
}
