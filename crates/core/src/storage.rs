//! Key/value storage for durable client state.
//!
//! Session credentials, the cached user record, and the cart snapshot each
//! live in their own slot. Implementations must be safe to share between
//! tasks; the in-memory one here is used by tests and short-lived clients.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Storage slot names.
pub mod keys {
    /// Access credential.
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// Renewal credential.
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// Cached current-user record (JSON).
    pub const USER: &str = "user";
    /// Versioned cart snapshot (JSON list of line items).
    pub const CART: &str = "storefront_cart_v1";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store could not be encoded.
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string key/value store.
pub trait Storage: Send + Sync {
    /// Read a slot.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot persist the value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a slot. Deleting a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot persist the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write several slots as one update.
    ///
    /// Backends that can persist a batch atomically should override this.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any write fails.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        entries
            .iter()
            .try_for_each(|(key, value)| self.set(key, value))
    }
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            guard.insert((*key).to_owned(), (*value).to_owned());
        }
        Ok(())
    }
}
