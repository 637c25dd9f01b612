//! Password-based key derivation.
//!
//! A user's journal key is derived from their password and a per-user salt
//! using Argon2id. The salt is persisted remotely (it is not secret); the
//! derived key exists only in process memory and is zeroized on drop.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Derived key length in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Salt length in bytes (128-bit).
pub const SALT_SIZE: usize = 16;

/// Per-user key derivation salt.
///
/// Generated once on first login and persisted under the user's profile.
/// Immutable after that: re-deriving with a different salt makes every
/// previously encrypted row unrecoverable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a cryptographically random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }

    /// Encodes the salt in its transport encoding (standard base64).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decodes a salt from its transport encoding.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidSalt(e.to_string()))?;
        if bytes.len() != SALT_SIZE {
            return Err(CryptoError::InvalidSalt(format!(
                "expected {SALT_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; SALT_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// Argon2id work parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Lanes. Derivation happens on a single worker; keep this at 1.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456, // 19 MiB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// A 256-bit symmetric key derived from a password.
///
/// Never serialized or persisted. Cloning is allowed (a session may hand the
/// key to the cipher), and every copy is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// Derives the journal key from a password and salt.
///
/// Deterministic: the same (password, salt, params) always yields the same
/// key, and the same password under different salts yields unrelated keys.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut out = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey::from_bytes(out))
}

/// Generates a random 256-bit key (not password-derived).
pub fn generate_random_key() -> DerivedKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rng().fill_bytes(&mut bytes);
    DerivedKey::from_bytes(bytes)
}
