//! Shared types for the journal store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An authenticated user as reported by the identity provider.
///
/// Only `user_id` participates in key derivation and row scoping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

/// One encrypted row in the remote `entries` collection.
///
/// At most one row exists per `(user_id, date_key)`; the remote enforces
/// this as the upsert conflict target. `encrypted_data` and `iv` are
/// base64-encoded; the plaintext behind them is the whole day's entry
/// sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedRow {
    pub user_id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date_key: String,
    pub encrypted_data: String,
    pub iv: String,
    pub updated_at: DateTime<Utc>,
}

/// One decrypted journal entry: a timestamp plus the form fields.
///
/// Serialized as a single flat JSON object with `savedAt` among the fields,
/// the shape every client version has written. Field order is preserved.
/// The store treats the payload as opaque — fields are whatever the journal
/// form produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the entry was saved. Absent on rows written by early clients.
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,

    /// Form fields, in the order the form produced them.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl JournalEntry {
    /// Builds an entry from field pairs, stamped with the given time.
    pub fn new<I, K, V>(saved_at: DateTime<Utc>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            saved_at: Some(saved_at),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
                .collect(),
        }
    }

    /// Returns a field's value if it is a string.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// Decrypted read-projection of the remote rows, keyed by date.
///
/// A day holds its entries in save order (oldest first). Rows that failed
/// to decrypt on the last fetch are absent.
pub type EntriesCache = BTreeMap<String, Vec<JournalEntry>>;

/// Outcome of a full fetch: how many entries made it into the cache and how
/// many rows were dropped as undecryptable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Decrypted entries now in the cache.
    pub loaded: usize,
    /// Rows skipped because they could not be decrypted or parsed.
    pub skipped: usize,
}

/// Result of probing the legacy unencrypted store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LegacyScan {
    pub found: bool,
    pub count: usize,
}

/// Outcome of persisting a freshly generated salt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaltInsert {
    /// The salt was stored; this login won the first-login race (or there
    /// was none).
    Created,
    /// Another login already stored a salt for this user; the caller must
    /// re-read and use the persisted one.
    Conflict,
}
