//! In-process remote store for tests.
//!
//! Behaves like the production backend at the row level — uniqueness on the
//! profile id and on `(user_id, date_key)`, descending list order — and adds
//! fault-injection switches for exercising failure paths without a network.

use crate::error::{StoreError, StoreResult};
use crate::remote::RemoteStore;
use crate::types::{AuthUser, EncryptedRow, SaltInsert};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

struct MemoryUser {
    password: String,
    user_id: String,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, MemoryUser>,
    salts: HashMap<String, String>,
    /// Keyed by (user_id, date_key); BTreeMap keeps listing deterministic.
    rows: BTreeMap<(String, String), EncryptedRow>,
    signed_in: Option<String>,
    offline: bool,
    upserts_before_failure: Option<u32>,
}

/// Remote store that lives in process memory. For tests.
#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user the identity provider will accept.
    pub fn register_user(&self, email: &str, password: &str, user_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.users.insert(
            email.to_string(),
            MemoryUser {
                password: password.to_string(),
                user_id: user_id.to_string(),
            },
        );
    }

    /// Simulates the remote being unreachable: every operation errors.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Lets the next `n` upserts succeed, then fails every one after.
    pub fn fail_after_upserts(&self, n: u32) {
        self.state.lock().unwrap().upserts_before_failure = Some(n);
    }

    /// Clears a previously set upsert failure point.
    pub fn clear_upsert_failure(&self) {
        self.state.lock().unwrap().upserts_before_failure = None;
    }

    /// Injects a row verbatim, bypassing the upsert path. For corrupt-row
    /// and foreign-user fixtures.
    pub fn insert_raw_row(&self, row: EncryptedRow) {
        let mut state = self.state.lock().unwrap();
        state
            .rows
            .insert((row.user_id.clone(), row.date_key.clone()), row);
    }

    /// Number of rows currently stored for a user.
    pub fn row_count(&self, user_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.rows.keys().filter(|(uid, _)| uid == user_id).count()
    }

    /// The persisted salt for a user, if any.
    pub fn salt_of(&self, user_id: &str) -> Option<String> {
        self.state.lock().unwrap().salts.get(user_id).cloned()
    }

    /// The user id of the currently signed-in user, if any.
    pub fn current_user(&self) -> Option<String> {
        self.state.lock().unwrap().signed_in.clone()
    }

    fn check_online(state: &MemoryState) -> StoreResult<()> {
        if state.offline {
            return Err(StoreError::Remote("remote unreachable (offline)".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthUser> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        let user = state
            .users
            .get(email)
            .filter(|u| u.password == password)
            .ok_or_else(|| StoreError::AuthFailed("invalid email or password".to_string()))?;

        let auth = AuthUser {
            user_id: user.user_id.clone(),
            email: email.to_string(),
        };
        state.signed_in = Some(auth.user_id.clone());
        Ok(auth)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.state.lock().unwrap().signed_in = None;
        Ok(())
    }

    async fn fetch_salt(&self, user_id: &str) -> StoreResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.salts.get(user_id).cloned())
    }

    async fn store_salt(&self, user_id: &str, salt: &str) -> StoreResult<SaltInsert> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        if state.salts.contains_key(user_id) {
            return Ok(SaltInsert::Conflict);
        }
        state.salts.insert(user_id.to_string(), salt.to_string());
        Ok(SaltInsert::Created)
    }

    async fn list_rows(&self, user_id: &str) -> StoreResult<Vec<EncryptedRow>> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        // date_key descending, like the production query.
        Ok(state
            .rows
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .rev()
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn upsert_row(&self, row: &EncryptedRow) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        if let Some(remaining) = state.upserts_before_failure {
            if remaining == 0 {
                return Err(StoreError::Remote("upsert rejected (injected fault)".to_string()));
            }
            state.upserts_before_failure = Some(remaining - 1);
        }

        state
            .rows
            .insert((row.user_id.clone(), row.date_key.clone()), row.clone());
        Ok(())
    }

    async fn delete_rows(&self, user_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        state.rows.retain(|(uid, _), _| uid != user_id);
        Ok(())
    }
}
