//! Authenticated encryption of one journal record at a time.
//!
//! ChaCha20-Poly1305 with a fresh random 96-bit nonce per call. Decryption
//! authenticates before returning anything: a tampered ciphertext, a wrong
//! nonce, or a mismatched key yields an error, never garbage plaintext.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};

/// Nonce length in bytes (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// A sealed record: nonce plus ciphertext (tag included).
///
/// The remote row stores the two parts in separate columns; use
/// [`EncryptedData::from_parts`] to reassemble after transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Reassembles sealed data from wire-decoded nonce and ciphertext.
    pub fn from_parts(nonce: &[u8], ciphertext: Vec<u8>) -> CryptoResult<Self> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: nonce.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(nonce);
        Ok(Self {
            nonce: arr,
            ciphertext,
        })
    }
}

/// Encrypts a plaintext record under the given key.
///
/// A fresh random nonce is drawn for every call. Reusing a nonce under the
/// same key would break confidentiality, so there is no way to supply one.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        nonce: nonce.into(),
        ciphertext,
    })
}

/// Decrypts and authenticates a sealed record.
pub fn decrypt(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(&data.nonce), data.ciphertext.as_ref())
        .map_err(|_| {
            CryptoError::Decryption("authentication failed (wrong key or tampered data)".to_string())
        })
}
