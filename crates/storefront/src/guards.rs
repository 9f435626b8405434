//! App-wide "fetch once" guards for auth-gated resources.
//!
//! Several consumers (views, commands) may ask for the current user or the
//! wishlist at the same moment. Exactly one of them wins the guard and issues
//! the request; the rest observe the shared state the winner fills in.
//! Guards live in the application context, so separate contexts (and tests)
//! never see each other's flags.

use std::sync::atomic::{AtomicBool, Ordering};

/// A single-winner flag.
#[derive(Debug, Default)]
pub struct FetchGuard {
    flag: AtomicBool,
}

impl FetchGuard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Claim the guard. Returns `true` only for the caller that flipped it.
    pub fn try_begin(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Allow the next caller to fetch again.
    pub fn release(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Guards shared by every handle of one application.
#[derive(Debug, Default)]
pub struct FetchGuards {
    /// `GET /auth/me`. Released when the lookup fails.
    pub current_user: FetchGuard,
    /// `GET /wishlist`. Released only on logout.
    pub wishlist: FetchGuard,
}

impl FetchGuards {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current_user: FetchGuard::new(),
            wishlist: FetchGuard::new(),
        }
    }

    /// Release every guard (logout).
    pub fn reset_all(&self) {
        self.current_user.release();
        self.wishlist.release();
    }
}
