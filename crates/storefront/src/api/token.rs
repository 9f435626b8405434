//! Access-token holder shared by the API client and the session.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;

/// The current bearer token, if any.
///
/// Cloning shares the same slot. Subscribers are notified whenever the
/// token is set or cleared, including when a failed refresh demotes the
/// session to guest.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<watch::Sender<Option<SecretString>>>,
}

impl TokenStore {
    /// Create an empty token store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            inner: Arc::new(sender),
        }
    }

    /// Current token.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.inner.borrow().clone()
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Replace the token and notify subscribers.
    pub fn set(&self, token: SecretString) {
        self.inner.send_replace(Some(token));
    }

    /// Drop the token and notify subscribers.
    pub fn clear(&self) {
        self.inner.send_replace(None);
    }

    /// Whether the held token equals `token` (both absent counts as equal).
    #[must_use]
    pub fn matches(&self, token: Option<&SecretString>) -> bool {
        match (self.inner.borrow().as_ref(), token) {
            (Some(current), Some(other)) => current.expose_secret() == other.expose_secret(),
            (None, None) => true,
            _ => false,
        }
    }

    /// Watch token changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<SecretString>> {
        self.inner.subscribe()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("token", &self.is_present().then_some("[REDACTED]"))
            .finish()
    }
}
