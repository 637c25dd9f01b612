//! The encrypted journal store: decrypted cache + remote rows.
//!
//! One remote row per `(user, day)`; the row's plaintext is the whole day's
//! entry sequence as a JSON array. Saving appends to the day and rewrites
//! its row, so concurrent writers race at row granularity and the last
//! upsert wins. The cache is a read-projection of the rows as of the last
//! successful fetch.

use crate::error::{StoreError, StoreResult};
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::types::{EncryptedRow, EntriesCache, FetchSummary, JournalEntry};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{NaiveDate, Utc};
use daybook_crypto::{decrypt, encrypt, DerivedKey, EncryptedData};
use tracing::{debug, warn};

/// Encrypted journal store bound to one remote backend.
///
/// All operations take the session explicitly; nothing survives it except
/// the cache, which `sign_out` clears.
pub struct SyncStore<R: RemoteStore> {
    remote: R,
    cache: EntriesCache,
    skipped_rows: usize,
}

impl<R: RemoteStore> SyncStore<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            cache: EntriesCache::new(),
            skipped_rows: 0,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Replaces the cache with a freshly decrypted projection of the
    /// user's remote rows.
    ///
    /// A row that cannot be decoded, authenticated, or parsed is logged and
    /// skipped; the rest of the fetch proceeds. The summary (and
    /// [`skipped_rows`](Self::skipped_rows) until the next fetch) exposes
    /// how many rows were dropped.
    pub async fn fetch_all_entries(&mut self, session: &Session) -> StoreResult<FetchSummary> {
        let rows = self.remote.list_rows(session.user_id()).await?;

        self.cache.clear();
        self.skipped_rows = 0;

        let mut summary = FetchSummary::default();
        for row in &rows {
            match decode_row(session.key(), row) {
                Ok(entries) => {
                    summary.loaded += entries.len();
                    self.cache.insert(row.date_key.clone(), entries);
                }
                Err(e) => {
                    warn!(date_key = %row.date_key, error = %e, "skipping undecryptable entry row");
                    summary.skipped += 1;
                }
            }
        }

        self.skipped_rows = summary.skipped;
        debug!(
            loaded = summary.loaded,
            skipped = summary.skipped,
            "journal fetch complete"
        );
        Ok(summary)
    }

    /// Appends an entry to a day and rewrites that day's remote row.
    ///
    /// A day accumulates entries in save order; the row plaintext is always
    /// the full sequence, so the remote keeps exactly one row per day. The
    /// cache is updated only after the upsert succeeds.
    pub async fn append_entry(
        &mut self,
        date_key: &str,
        entry: JournalEntry,
        session: &Session,
    ) -> StoreResult<()> {
        validate_date_key(date_key)?;

        let mut day = self.cache.get(date_key).cloned().unwrap_or_default();
        day.push(entry);

        let row = encode_row(session, date_key, &day)?;
        self.remote.upsert_row(&row).await?;

        self.cache.insert(date_key.to_string(), day);
        Ok(())
    }

    /// Deletes every remote row owned by the session's user and clears the
    /// cache. There is no undo.
    pub async fn delete_all_entries(&mut self, session: &Session) -> StoreResult<()> {
        self.remote.delete_rows(session.user_id()).await?;
        self.cache.clear();
        self.skipped_rows = 0;
        Ok(())
    }

    /// Returns a snapshot of the cache. Later store mutations are not
    /// visible through it.
    pub fn entries(&self) -> EntriesCache {
        self.cache.clone()
    }

    /// Total decrypted entries across all days.
    pub fn entry_count(&self) -> usize {
        self.cache.values().map(Vec::len).sum()
    }

    /// Rows dropped as undecryptable on the last fetch.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Whether a day's cached sequence already holds this exact entry.
    pub(crate) fn day_contains(&self, date_key: &str, entry: &JournalEntry) -> bool {
        self.cache
            .get(date_key)
            .is_some_and(|day| day.contains(entry))
    }

    /// Signs out: revokes the remote auth state, clears the cache, and
    /// consumes the session so the key is dropped and zeroized.
    pub async fn sign_out(&mut self, session: Session) -> StoreResult<()> {
        self.remote.sign_out().await?;
        self.cache.clear();
        self.skipped_rows = 0;
        drop(session);
        Ok(())
    }
}

fn validate_date_key(date_key: &str) -> StoreResult<()> {
    NaiveDate::parse_from_str(date_key, "%Y-%m-%d")
        .map_err(|_| StoreError::Validation(format!("invalid date key: {date_key:?}")))?;
    Ok(())
}

/// Serializes and seals a day's entry sequence into its remote row.
fn encode_row(
    session: &Session,
    date_key: &str,
    entries: &[JournalEntry],
) -> StoreResult<EncryptedRow> {
    let plaintext = serde_json::to_vec(entries)?;
    let sealed = encrypt(session.key(), &plaintext)?;

    Ok(EncryptedRow {
        user_id: session.user_id().to_string(),
        date_key: date_key.to_string(),
        encrypted_data: STANDARD.encode(&sealed.ciphertext),
        iv: STANDARD.encode(sealed.nonce),
        updated_at: Utc::now(),
    })
}

/// Decodes, authenticates, and parses one remote row into its day sequence.
fn decode_row(key: &DerivedKey, row: &EncryptedRow) -> StoreResult<Vec<JournalEntry>> {
    let ciphertext = STANDARD
        .decode(&row.encrypted_data)
        .map_err(|e| StoreError::Remote(format!("bad ciphertext encoding: {e}")))?;
    let nonce = STANDARD
        .decode(&row.iv)
        .map_err(|e| StoreError::Remote(format!("bad iv encoding: {e}")))?;

    let sealed = EncryptedData::from_parts(&nonce, ciphertext)?;
    let plaintext = decrypt(key, &sealed)?;

    decode_day_payload(&plaintext)
}

/// A day's plaintext is a JSON array of entries; rows written before the
/// multi-entry model hold a bare object and count as a one-entry day.
fn decode_day_payload(plaintext: &[u8]) -> StoreResult<Vec<JournalEntry>> {
    let value: serde_json::Value = serde_json::from_slice(plaintext)?;
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        _ => Ok(vec![serde_json::from_value(value)?]),
    }
}
