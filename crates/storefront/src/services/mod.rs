//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, password login and staff account creation
//! - `cart` - Session cart operations backed by the catalog
//! - `checkout` - Turning the cart into a persisted order

pub mod auth;
pub mod cart;
pub mod checkout;
