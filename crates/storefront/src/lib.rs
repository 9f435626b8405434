//! Cardshop storefront client library.
//!
//! Keeps a shopper's cart and wishlist consistent across the guest and
//! signed-in states:
//!
//! - [`storage`]: guest cart/wishlist persisted locally, with change events
//! - [`api`]: typed REST client with single-flight token refresh
//! - [`sync`]: merges guest data into the account after login
//! - [`state`]: optimistic state containers for the signed-in session
//! - [`guards`] and [`handles`]: at most one fetch per auth-gated resource
//! - [`session`]: the [`Storefront`] context a front end drives

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod guards;
pub mod handles;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, TokenStore};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use events::{EventBus, StorageEvent};
pub use session::{CartLine, CartSource, CartView, LoginOutcome, Storefront};
pub use sync::{SyncOutcome, SyncReport};
