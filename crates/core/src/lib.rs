//! Cardshop Core - Shared types library.
//!
//! This crate provides common types used across all Cardshop components:
//! - `storefront` - Client library for guest and authenticated carts/wishlists
//! - `cli` - Command-line driver for the storefront client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere,
//! including WASM front ends.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, and local line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
