//! The per-user ledger: categories and transactions kept consistent with each other.
//!
//! Every operation takes a [`UserContext`] and touches only the keys under its scope. Each
//! operation is all-or-nothing for the collection it writes. The one cross-collection side effect,
//! creating a missing expense category before a transaction is written, is two separate writes and
//! is not rolled back if the second one fails.

mod categories;
mod transactions;

use crate::error::StoreError;
use crate::model::{Categories, ScopeKey, UserContext, UserIdentity};
use crate::storage::{self, keys, KeyValueStore};
use tracing::debug;

/// Owns a key-value backend and applies the consistency rules on top of it.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    default_categories: Categories,
}

impl<S: KeyValueStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_categories: Categories::defaults(),
        }
    }

    /// Replaces the category list that a user without stored categories starts from.
    pub fn with_default_categories(mut self, categories: Categories) -> Self {
        self.default_categories = categories;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// The identity that signed in most recently, if any.
    pub fn last_user(&self) -> Option<UserIdentity> {
        storage::read(&self.store, keys::LAST_USER, || None)
    }

    /// Records a sign-in: stores the identity under its scope and points the last-user key at it.
    ///
    /// A blank display name keeps whatever name was stored for that email before.
    pub fn remember_user(&mut self, identity: &UserIdentity) -> Result<UserContext, StoreError> {
        if identity.email().is_empty() {
            return Err(StoreError::validation("email is required"));
        }
        let mut identity = identity.clone();
        let scope = ScopeKey::new(identity.email());
        if identity.display_name().is_empty() {
            if let Some(known) = self.identity(&scope) {
                identity.display_name = known.display_name;
            }
        }
        storage::write(&mut self.store, &keys::user(&scope), &identity)?;
        storage::write(&mut self.store, keys::LAST_USER, &identity)?;
        debug!("Remembered {} as the last user", identity.email());
        Ok(UserContext::new(identity))
    }

    /// Clears the last-user pointer. Stored data is untouched.
    pub fn forget_last_user(&mut self) -> Result<(), StoreError> {
        self.store
            .remove(keys::LAST_USER)
            .map_err(StoreError::Storage)
    }

    /// The identity record stored for `scope`.
    pub fn identity(&self, scope: &ScopeKey) -> Option<UserIdentity> {
        storage::read(&self.store, &keys::user(scope), || None)
    }

    /// Resumes the last signed-in user, if there is one.
    pub fn resume(&self) -> Option<UserContext> {
        self.last_user().map(UserContext::new)
    }
}
