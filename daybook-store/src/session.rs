//! Authenticated sessions and key establishment.
//!
//! A [`Session`] is the only holder of the derived journal key. It is
//! created by [`establish_session`] (fresh sign-in) or [`unlock_session`]
//! (restored auth state) and passed explicitly into every store operation.
//! Dropping it zeroizes the key; there is no way to persist or recover the
//! key without re-entering the password.

use crate::error::{StoreError, StoreResult};
use crate::remote::RemoteStore;
use crate::types::{AuthUser, SaltInsert};
use daybook_crypto::{derive_key, CryptoError, DerivedKey, KdfParams, Salt};
use tracing::debug;

/// An unlocked journal session: the user plus their in-memory key.
pub struct Session {
    user_id: String,
    email: String,
    key: DerivedKey,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn key(&self) -> &DerivedKey {
        &self.key
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Signs in and unlocks the journal in one step.
///
/// Rejects empty credentials before touching the network. On success the
/// remote retains its auth state and the returned session holds the key.
pub async fn establish_session<R: RemoteStore>(
    remote: &R,
    email: &str,
    password: &str,
) -> StoreResult<Session> {
    validate_credentials(email, password)?;
    let user = remote.sign_in(email, password).await?;
    unlock(remote, user, password).await
}

/// Unlocks the journal for an already-authenticated user.
///
/// For flows where the remote auth state was restored out-of-band (e.g. a
/// saved token) and only the password needs re-entering.
pub async fn unlock_session<R: RemoteStore>(
    remote: &R,
    user: AuthUser,
    password: &str,
) -> StoreResult<Session> {
    if password.is_empty() {
        return Err(StoreError::Validation("password must not be empty".to_string()));
    }
    unlock(remote, user, password).await
}

async fn unlock<R: RemoteStore>(
    remote: &R,
    user: AuthUser,
    password: &str,
) -> StoreResult<Session> {
    let salt = get_or_create_salt(remote, &user.user_id).await?;

    // Argon2id is memory-hard by design; keep it off the async workers.
    let password = password.to_string();
    let key = tokio::task::spawn_blocking(move || {
        derive_key(&password, &salt, &KdfParams::default())
    })
    .await
    .map_err(|e| {
        StoreError::Crypto(CryptoError::KeyDerivation(format!(
            "derivation task failed: {e}"
        )))
    })??;

    Ok(Session {
        user_id: user.user_id,
        email: user.email,
        key,
    })
}

fn validate_credentials(email: &str, password: &str) -> StoreResult<()> {
    if email.is_empty() {
        return Err(StoreError::Validation("email must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(StoreError::Validation("password must not be empty".to_string()));
    }
    Ok(())
}

/// Reads the user's salt, creating and persisting one on first login.
///
/// The salt is immutable once stored: concurrent first logins race on the
/// profile's uniqueness constraint, and the insert loser re-reads so both
/// sessions derive from the same salt.
async fn get_or_create_salt<R: RemoteStore>(remote: &R, user_id: &str) -> StoreResult<Salt> {
    if let Some(encoded) = remote.fetch_salt(user_id).await? {
        return Ok(Salt::from_base64(&encoded)?);
    }

    let fresh = Salt::random();
    match remote.store_salt(user_id, &fresh.to_base64()).await? {
        SaltInsert::Created => {
            debug!(user_id, "created encryption salt on first login");
            Ok(fresh)
        }
        SaltInsert::Conflict => {
            // Another session stored a salt first; ours must not be used.
            let encoded = remote.fetch_salt(user_id).await?.ok_or_else(|| {
                StoreError::Remote(
                    "salt insert conflicted but no salt is readable".to_string(),
                )
            })?;
            Ok(Salt::from_base64(&encoded)?)
        }
    }
}
