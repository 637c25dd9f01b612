//! One-shot import of the legacy unencrypted local store.
//!
//! Before encryption, entries lived in a single local JSON file mapping
//! `date_key` to one entry per day. The importer pushes each pair through
//! the encrypted store under the current session's key and deletes the file
//! only after the whole map has been processed. Not transactional: an
//! interrupted run leaves the file in place and is safe to repeat.

use crate::error::StoreResult;
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::sync::SyncStore;
use crate::types::{JournalEntry, LegacyScan};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The legacy unencrypted local store: one JSON file, one entry per day.
pub struct LegacyStore {
    path: PathBuf,
}

impl LegacyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the full legacy map, or `None` if the file does not exist.
    fn load(&self) -> StoreResult<Option<BTreeMap<String, JournalEntry>>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Deletes the legacy file. Missing file counts as already cleared.
    fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Moves legacy unencrypted entries into the encrypted remote store.
pub struct MigrationImporter {
    legacy: LegacyStore,
}

impl MigrationImporter {
    pub fn new(legacy: LegacyStore) -> Self {
        Self { legacy }
    }

    /// Probes the legacy store without mutating it. An absent or malformed
    /// file reads as nothing to import.
    pub fn has_legacy_entries(&self) -> LegacyScan {
        match self.legacy.load() {
            Ok(Some(entries)) => LegacyScan {
                found: !entries.is_empty(),
                count: entries.len(),
            },
            Ok(None) | Err(_) => LegacyScan::default(),
        }
    }

    /// Imports every legacy entry through the encrypted store, then clears
    /// the legacy file.
    ///
    /// Entries are appended sequentially in date order. An entry already
    /// present verbatim in the day's cached sequence is skipped, so a run
    /// interrupted mid-loop can simply be repeated: the file still holds
    /// everything, and previously imported entries are not duplicated.
    /// Assumes the store has been fetched under this session.
    pub async fn import_legacy_entries<R: RemoteStore>(
        &self,
        store: &mut SyncStore<R>,
        session: &Session,
    ) -> StoreResult<usize> {
        let Some(entries) = self.legacy.load()? else {
            return Ok(0);
        };

        let total = entries.len();
        for (date_key, entry) in entries {
            if store.day_contains(&date_key, &entry) {
                debug!(date_key, "legacy entry already imported, skipping");
                continue;
            }
            store.append_entry(&date_key, entry, session).await?;
        }

        self.legacy.clear()?;
        info!(count = total, "legacy journal import complete");
        Ok(total)
    }
}
