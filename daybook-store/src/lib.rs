//! Encrypted journal store for Daybook.
//!
//! Owns everything between the journal UI and the remote row store:
//! - Session establishment (sign-in, per-user salt, key derivation)
//! - The decrypted in-memory cache, synchronized by full fetch
//! - Append-and-upsert saves under last-writer-wins semantics
//! - One-shot import of the legacy unencrypted local store
//!
//! Entries are encrypted client-side with a key derived from the user's
//! password; the backend only ever sees ciphertext, nonces, and the salt.
//! A row that no longer decrypts (stale key, tampering) is dropped from the
//! cache rather than failing the whole fetch, and the drop count is
//! surfaced for diagnostics.

pub mod config;
pub mod error;
pub mod memory;
pub mod migrate;
pub mod postgrest;
pub mod remote;
pub mod session;
pub mod sync;
pub mod types;

pub use config::RemoteConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryRemote;
pub use migrate::{LegacyStore, MigrationImporter};
pub use postgrest::PostgrestRemote;
pub use remote::RemoteStore;
pub use session::{establish_session, unlock_session, Session};
pub use sync::SyncStore;
pub use types::*;
