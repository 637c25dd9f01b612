use chrono::Utc;
use daybook_store::memory::MemoryRemote;
use daybook_store::session::{establish_session, unlock_session, Session};
use daybook_store::sync::SyncStore;
use daybook_store::types::{AuthUser, EncryptedRow, JournalEntry};
use daybook_store::{RemoteStore, StoreError};
use pretty_assertions::assert_eq;

const EMAIL: &str = "me@example.com";
const PASSWORD: &str = "my journal password";
const USER_ID: &str = "user-1";

fn entry(text: &str) -> JournalEntry {
    JournalEntry::new(
        Utc::now(),
        [("gratitude", text), ("mood", "calm")],
    )
}

async fn setup() -> (SyncStore<MemoryRemote>, Session) {
    let remote = MemoryRemote::new();
    remote.register_user(EMAIL, PASSWORD, USER_ID);

    let store = SyncStore::new(remote);
    let session = establish_session(store.remote(), EMAIL, PASSWORD)
        .await
        .unwrap();
    (store, session)
}

#[tokio::test]
async fn append_then_fetch_roundtrip() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-07", entry("the rain stopped"), &session)
        .await
        .unwrap();

    let summary = store.fetch_all_entries(&session).await.unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.skipped, 0);

    let entries = store.entries();
    let day = &entries["2026-08-07"];
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].field("gratitude"), Some("the rain stopped"));
}

#[tokio::test]
async fn day_accumulates_entries_in_save_order() {
    let (mut store, session) = setup().await;

    for text in ["morning", "afternoon", "evening"] {
        store
            .append_entry("2026-08-07", entry(text), &session)
            .await
            .unwrap();
    }

    // The whole day still occupies a single remote row.
    assert_eq!(store.remote().row_count(USER_ID), 1);

    store.fetch_all_entries(&session).await.unwrap();
    let entries = store.entries();
    let texts: Vec<_> = entries["2026-08-07"]
        .iter()
        .map(|e| e.field("gratitude").unwrap().to_string())
        .collect();
    assert_eq!(texts, ["morning", "afternoon", "evening"]);
}

#[tokio::test]
async fn entry_field_order_survives_the_roundtrip() {
    let (mut store, session) = setup().await;

    let e = JournalEntry::new(
        Utc::now(),
        [("zebra", "last in alphabet"), ("apple", "first"), ("mango", "middle")],
    );
    store.append_entry("2026-08-07", e, &session).await.unwrap();
    store.fetch_all_entries(&session).await.unwrap();

    let entries = store.entries();
    let names: Vec<_> = entries["2026-08-07"][0].fields.keys().cloned().collect();
    assert_eq!(names, ["zebra", "apple", "mango"]);
}

#[tokio::test]
async fn legacy_single_object_row_reads_as_one_entry_day() {
    let (mut store, session) = setup().await;

    // A row written by a pre-multi-entry client: bare object, not an array.
    let salt_b64 = store.remote().salt_of(USER_ID).unwrap();
    let salt = daybook_crypto::Salt::from_base64(&salt_b64).unwrap();
    let key =
        daybook_crypto::derive_key(PASSWORD, &salt, &daybook_crypto::KdfParams::default()).unwrap();

    let plaintext = serde_json::to_vec(&entry("written long ago")).unwrap();
    let sealed = daybook_crypto::encrypt(&key, &plaintext).unwrap();

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    store.remote().insert_raw_row(EncryptedRow {
        user_id: USER_ID.to_string(),
        date_key: "2024-03-15".to_string(),
        encrypted_data: STANDARD.encode(&sealed.ciphertext),
        iv: STANDARD.encode(sealed.nonce),
        updated_at: Utc::now(),
    });

    let summary = store.fetch_all_entries(&session).await.unwrap();
    assert_eq!(summary.loaded, 1);

    let entries = store.entries();
    assert_eq!(entries["2024-03-15"].len(), 1);
    assert_eq!(
        entries["2024-03-15"][0].field("gratitude"),
        Some("written long ago")
    );
}

#[tokio::test]
async fn undecryptable_row_is_skipped_not_fatal() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-05", entry("good day"), &session)
        .await
        .unwrap();
    store
        .append_entry("2026-08-06", entry("better day"), &session)
        .await
        .unwrap();

    // Ciphertext that no key will ever authenticate.
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    store.remote().insert_raw_row(EncryptedRow {
        user_id: USER_ID.to_string(),
        date_key: "2026-08-04".to_string(),
        encrypted_data: STANDARD.encode([0u8; 48]),
        iv: STANDARD.encode([0u8; 12]),
        updated_at: Utc::now(),
    });

    let summary = store.fetch_all_entries(&session).await.unwrap();
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(store.skipped_rows(), 1);

    let entries = store.entries();
    assert!(!entries.contains_key("2026-08-04"));
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn stale_key_drops_every_row_but_reports_the_mismatch() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-07", entry("sealed under the real key"), &session)
        .await
        .unwrap();

    // Unlock with the wrong password: auth state is fine, key is not.
    let stale = unlock_session(
        store.remote(),
        AuthUser {
            user_id: USER_ID.to_string(),
            email: EMAIL.to_string(),
        },
        "not my journal password",
    )
    .await
    .unwrap();

    let summary = store.fetch_all_entries(&stale).await.unwrap();
    assert_eq!(summary.loaded, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(store.entry_count(), 0);
}

#[tokio::test]
async fn entries_snapshot_is_defensive() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-07", entry("original"), &session)
        .await
        .unwrap();

    let mut snapshot = store.entries();
    snapshot
        .get_mut("2026-08-07")
        .unwrap()
        .push(entry("injected into the snapshot"));
    snapshot.insert("1999-01-01".to_string(), vec![entry("phantom day")]);

    let fresh = store.entries();
    assert_eq!(fresh["2026-08-07"].len(), 1);
    assert!(!fresh.contains_key("1999-01-01"));
}

#[tokio::test]
async fn delete_all_is_scoped_to_the_session_user() {
    let remote = MemoryRemote::new();
    remote.register_user(EMAIL, PASSWORD, USER_ID);
    remote.register_user("other@example.com", "other password", "user-2");

    let mut store = SyncStore::new(remote);
    let mine = establish_session(store.remote(), EMAIL, PASSWORD)
        .await
        .unwrap();
    let theirs = establish_session(store.remote(), "other@example.com", "other password")
        .await
        .unwrap();

    store
        .append_entry("2026-08-07", entry("mine"), &mine)
        .await
        .unwrap();
    store
        .append_entry("2026-08-07", entry("theirs"), &theirs)
        .await
        .unwrap();

    store.delete_all_entries(&mine).await.unwrap();

    assert_eq!(store.remote().row_count(USER_ID), 0);
    assert_eq!(store.remote().row_count("user-2"), 1);
    assert_eq!(store.entry_count(), 0);

    // The other user's data still decrypts.
    let summary = store.fetch_all_entries(&theirs).await.unwrap();
    assert_eq!(summary.loaded, 1);
}

#[tokio::test]
async fn remote_failure_propagates() {
    let (mut store, session) = setup().await;
    store.remote().set_offline(true);

    let fetch = store.fetch_all_entries(&session).await;
    assert!(matches!(fetch, Err(StoreError::Remote(_))));

    let append = store
        .append_entry("2026-08-07", entry("unsendable"), &session)
        .await;
    assert!(matches!(append, Err(StoreError::Remote(_))));
}

#[tokio::test]
async fn failed_append_leaves_cache_untouched() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-07", entry("saved"), &session)
        .await
        .unwrap();

    store.remote().set_offline(true);
    let _ = store
        .append_entry("2026-08-07", entry("never saved"), &session)
        .await;

    assert_eq!(store.entries()["2026-08-07"].len(), 1);
}

#[tokio::test]
async fn bad_date_key_is_rejected_before_any_work() {
    let (mut store, session) = setup().await;
    store.remote().set_offline(true);

    // Validation fires before the (offline) remote is ever consulted.
    let result = store
        .append_entry("August 7th", entry("nope"), &session)
        .await;
    assert!(matches!(result, Err(StoreError::Validation(_))));
}

#[tokio::test]
async fn sign_out_clears_cache_and_consumes_session() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-07", entry("before sign-out"), &session)
        .await
        .unwrap();
    assert_eq!(store.entry_count(), 1);

    store.sign_out(session).await.unwrap();
    assert_eq!(store.entry_count(), 0);
    assert_eq!(store.skipped_rows(), 0);
}

#[tokio::test]
async fn fetch_replaces_the_cache_wholesale() {
    let (mut store, session) = setup().await;

    store
        .append_entry("2026-08-07", entry("kept"), &session)
        .await
        .unwrap();
    store.fetch_all_entries(&session).await.unwrap();

    // Row vanishes remotely (another device deleted everything).
    store.remote().delete_rows(USER_ID).await.unwrap();

    store.fetch_all_entries(&session).await.unwrap();
    assert_eq!(store.entry_count(), 0);
}
