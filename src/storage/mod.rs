//! The key-value persistence adapter.
//!
//! Values are stored as JSON text under string keys. Reads fail soft: a missing key, an unreadable
//! backend or content that does not decode all produce the caller's fallback, so a damaged entry
//! can never stop the application from starting. Writes overwrite unconditionally. There is no
//! transaction spanning more than one key.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// A synchronous string-to-string store.
pub trait KeyValueStore {
    /// Returns the raw value at `key`, or `None` if nothing is stored there.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` at `key`, replacing whatever was there.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Deletes `key`. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Reads and decodes the value at `key`, substituting `fallback()` for anything unusable.
pub fn read<T, S, F>(store: &S, key: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
    F: FnOnce() -> T,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return fallback(),
        Err(e) => {
            warn!("Unable to read '{key}', using the default: {e:#}");
            return fallback();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Stored value at '{key}' could not be decoded, using the default: {e}");
            fallback()
        }
    }
}

/// Encodes `value` as JSON and stores it at `key`.
pub fn write<T, S>(store: &mut S, key: &str, value: &T) -> std::result::Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)
        .with_context(|| format!("Unable to serialize the value for '{key}'"))
        .map_err(StoreError::Storage)?;
    store.set(key, json).map_err(StoreError::Storage)?;
    debug!("Wrote '{key}'");
    Ok(())
}

/// The key layout. Everything a user owns is namespaced by their scope key.
pub mod keys {
    use crate::model::ScopeKey;

    /// The process-wide "last signed in" pointer.
    pub const LAST_USER: &str = "cem_last_user";

    pub fn user(scope: &ScopeKey) -> String {
        format!("cem_user_{scope}")
    }

    pub fn transactions(scope: &ScopeKey) -> String {
        format!("cem_expenses::{scope}")
    }

    pub fn categories(scope: &ScopeKey) -> String {
        format!("cem_cats::{scope}")
    }
}
