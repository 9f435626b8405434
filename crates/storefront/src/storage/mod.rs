//! Local persistence for guest carts and wishlists.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the raw string key-value backend (browser local
//!   storage in a web front end, a directory of JSON files for the CLI)
//! - [`LocalStore`] wraps a backend and never fails: unreadable or corrupt
//!   values read as empty, failed writes are logged and dropped
//! - [`CartStorage`] and [`WishlistStorage`] hold the line-item semantics and
//!   emit change events after every mutation
//!
//! A backend that fails its availability probe is replaced by an in-memory
//! store, so guests can keep shopping for the rest of the process.
//!
//! Mutations are read-modify-write cycles under a lock shared by every clone
//! of a [`LocalStore`], so concurrent adds within a process never drop units.

mod cart;
mod wishlist;

pub use cart::CartStorage;
pub use wishlist::WishlistStorage;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use cardshop_core::{LineItem, ProductId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage keys for guest data.
pub mod keys {
    /// Key holding the guest cart (JSON array of cart lines).
    pub const CART: &str = "cardshop_cart";

    /// Key holding the guest wishlist (JSON array of wishlist entries).
    pub const WISHLIST: &str = "cardshop_wishlist";

    /// Key written and removed by the availability probe.
    pub(crate) const PROBE: &str = "cardshop_storage_probe";
}

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage is disabled or not present.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Key contains characters the backend cannot store.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// A previous writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Backends
// =============================================================================

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

/// Storage backed by one `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        // Write to a sibling file first so readers never see a partial snapshot
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Storage that is switched off; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

// =============================================================================
// LocalStore
// =============================================================================

/// Infallible JSON view over a [`KeyValueStore`].
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
    degraded: bool,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    /// Wrap a backend without probing it.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            degraded: false,
            write_lock: Arc::default(),
        }
    }

    /// Wrap a backend, falling back to memory if it fails a write/remove probe.
    #[must_use]
    pub fn with_fallback(backend: Arc<dyn KeyValueStore>) -> Self {
        let probe = backend
            .set(keys::PROBE, "1")
            .and_then(|()| backend.remove(keys::PROBE));

        match probe {
            Ok(()) => Self::new(backend),
            Err(e) => {
                tracing::warn!(error = %e, "Local storage unavailable, using in-memory storage");
                Self {
                    backend: Arc::new(MemoryStore::new()),
                    degraded: true,
                    write_lock: Arc::default(),
                }
            }
        }
    }

    /// In-memory store, handy for tests and headless sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Whether the original backend was replaced by memory storage.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Read and deserialize a value, returning `T::default()` when it is
    /// absent, unreadable, or corrupt.
    pub(crate) fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read local storage");
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Discarding corrupt local storage value");
            T::default()
        })
    }

    /// Serialize and write a value; failures are logged.
    pub(crate) fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize local storage value");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, &raw) {
            tracing::warn!(key, error = %e, "Failed to write local storage");
        }
    }

    /// Read a value, let `f` change it, and write it back if `f` returns
    /// `true`. No other mutation through this store interleaves.
    ///
    /// Returns the value after `f` and whether it was written.
    pub(crate) fn update_json<T, F>(&self, key: &str, f: F) -> (T, bool)
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> bool,
    {
        // The guarded data is `()`, so a poisoned lock holds nothing stale
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut value = self.read_json(key);
        let changed = f(&mut value);
        if changed {
            self.write_json(key, &value);
        }
        (value, changed)
    }

    /// Delete a key; failures are logged.
    pub(crate) fn remove(&self, key: &str) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.backend.remove(key) {
            tracing::warn!(key, error = %e, "Failed to clear local storage");
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// The line for `product_id`, if stored.
fn find_line<T: LineItem>(items: &mut [T], product_id: ProductId) -> Option<&mut T> {
    items.iter_mut().find(|item| item.product_id() == product_id)
}

fn has_line<T: LineItem>(items: &[T], product_id: ProductId) -> bool {
    items.iter().any(|item| item.product_id() == product_id)
}

/// Drop the line for `product_id`. Returns whether one was stored.
fn remove_line<T: LineItem>(items: &mut Vec<T>, product_id: ProductId) -> bool {
    let before = items.len();
    items.retain(|item| item.product_id() != product_id);
    items.len() != before
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}
