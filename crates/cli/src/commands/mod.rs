//! Command implementations.

pub mod cart;
pub mod login;
pub mod wishlist;
