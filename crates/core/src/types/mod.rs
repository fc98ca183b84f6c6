//! Core types for GreenShop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use slug::slugify;
pub use status::{OrderStatus, ParseOrderStatusError};
