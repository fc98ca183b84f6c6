//! GreenShop Core - Shared types library.
//!
//! This crate provides common types used across all GreenShop components:
//! - `storefront` - Public shop, customer accounts and the staff admin area
//! - `cli` - Command-line tools for migrations, seeding and staff accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, statuses and slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
