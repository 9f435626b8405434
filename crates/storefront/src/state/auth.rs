//! Auth slice: who is signed in.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::User;

/// Session status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Guest,
    Authenticating,
    Authenticated,
}

/// Auth state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub status: AuthStatus,
    pub error: Option<String>,
}

/// Shared auth store. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct AuthStore {
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthStore {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthState::default());
        Self {
            state: Arc::new(sender),
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The signed-in user, if known.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status
    }

    /// A login or user lookup started.
    pub fn begin(&self) {
        self.state.send_modify(|state| {
            state.status = AuthStatus::Authenticating;
            state.error = None;
        });
    }

    /// The session belongs to `user`.
    pub fn authenticated(&self, user: User) {
        self.state.send_modify(|state| {
            state.user = Some(user);
            state.status = AuthStatus::Authenticated;
            state.error = None;
        });
    }

    /// Authentication failed; the shopper continues as a guest.
    pub fn failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| {
            state.user = None;
            state.status = AuthStatus::Guest;
            state.error = Some(message);
        });
    }

    /// Back to guest (logout).
    pub fn guest(&self) {
        self.state.send_replace(AuthState::default());
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}
