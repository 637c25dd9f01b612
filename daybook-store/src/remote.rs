//! Remote row-store contract.
//!
//! Two collections: `user_profiles` (primary key = user id, holds the
//! per-user `encryption_salt`) and `entries` (one encrypted row per
//! `(user_id, date_key)`, unique constraint used as the upsert conflict
//! target). [`crate::PostgrestRemote`] speaks the production wire protocol;
//! [`crate::MemoryRemote`] is the in-process implementation for tests.

use crate::error::StoreResult;
use crate::types::{AuthUser, EncryptedRow, SaltInsert};
use async_trait::async_trait;

/// Operations the journal store needs from the remote row store.
///
/// Implementations own their auth state. Every row operation is scoped by
/// the caller's user id; backends are expected to reject cross-user access
/// on their side as well.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Authenticates with the identity provider and retains the resulting
    /// auth state for subsequent calls.
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthUser>;

    /// Discards the retained auth state.
    async fn sign_out(&self) -> StoreResult<()>;

    /// Reads the persisted salt for a user, if one exists.
    async fn fetch_salt(&self, user_id: &str) -> StoreResult<Option<String>>;

    /// Persists a salt for a user.
    ///
    /// Must be a plain insert guarded by the profile's uniqueness
    /// constraint: if a salt already exists the call returns
    /// [`SaltInsert::Conflict`] and leaves the stored salt untouched.
    async fn store_salt(&self, user_id: &str, salt: &str) -> StoreResult<SaltInsert>;

    /// Lists every entry row for a user, ordered by `date_key` descending.
    async fn list_rows(&self, user_id: &str) -> StoreResult<Vec<EncryptedRow>>;

    /// Inserts or replaces the row for `(row.user_id, row.date_key)`.
    async fn upsert_row(&self, row: &EncryptedRow) -> StoreResult<()>;

    /// Deletes every entry row owned by a user.
    async fn delete_rows(&self, user_id: &str) -> StoreResult<()>;
}
