//! Client-side state containers for the authenticated session.
//!
//! Each slice keeps its state in a `tokio::sync::watch` channel: a pure
//! reducer applies actions, and every dispatch notifies subscribers (the
//! views). Async operations dispatch pending/fulfilled/rejected actions
//! around the API call, mirroring how a UI store handles thunks.
//!
//! Mutations are synchronous and visible before any network call resolves.
//! The eventual server response is the source of truth and is written into
//! state as it arrives; in-flight requests are never cancelled.

pub mod auth;
pub mod cart;
pub mod wishlist;

pub use auth::{AuthState, AuthStatus, AuthStore};
pub use cart::{CartAction, CartState, CartStore};
pub use wishlist::{WishlistAction, WishlistState, WishlistStore};
