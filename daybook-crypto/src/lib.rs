//! Encryption layer for Daybook.
//!
//! Provides per-entry journal encryption using:
//! - Argon2id for key derivation from passwords
//! - ChaCha20-Poly1305 for authenticated encryption
//! - Secure key management with zeroization
//!
//! # Architecture
//!
//! One symmetric key per user, derived from the password and a per-user
//! salt at unlock time. The key is never stored — it lives in memory for
//! the session and is re-derived on the next unlock. Every journal record
//! is sealed individually under a fresh nonce, so a single corrupted row
//! never takes down the rest of the journal.

mod cipher;
mod error;
mod key;

pub use cipher::{decrypt, encrypt, EncryptedData, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, generate_random_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
