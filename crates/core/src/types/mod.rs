//! Core types for Cardshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod item;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use item::{LineItem, LocalCartItem, LocalWishlistItem, ProductSnapshot};
pub use price::{CurrencyCode, Price};
