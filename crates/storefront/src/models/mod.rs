//! Domain models for the storefront.
//!
//! Row types map one-to-one onto the `PostgreSQL` tables created by the
//! migrations in `crates/storefront/migrations/`. Session-stored state (cart,
//! current user, flash messages) lives next to them.

pub mod cart;
pub mod catalog;
pub mod flash;
pub mod order;
pub mod pagination;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartLine};
pub use catalog::{Category, Product, ProductImage, ProductSummary, primary_image};
pub use flash::{Flash, FlashLevel};
pub use order::{NewOrder, Order, OrderItem, OrderItemDetail, OrderWithItems};
pub use pagination::Page;
pub use session::{CurrentUser, keys as session_keys};
pub use user::{User, UserProfile};
