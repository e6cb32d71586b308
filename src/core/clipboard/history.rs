use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::storage::{decode_entries, encode_entries, BlobEncoding, PreferenceStore, HISTORY_KEY};
use crate::shared::error::AppResult;
use crate::shared::types::{ClipboardEntry, SourceApp};
use crate::system::automation::PasteInjector;
use crate::system::pasteboard::Pasteboard;

/// Maximum number of clipboard entries kept
pub const MAX_HISTORY_SIZE: usize = 100;

/// Shorter (trimmed) text is never recorded
pub const MIN_TEXT_CHARS: usize = 4;

/// Called with the full list after every mutation
pub type HistoryListener = Arc<dyn Fn(&[ClipboardEntry]) + Send + Sync>;

/// Trim and validate captured text
pub fn normalize(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}

/// Listener hand-off. Snapshots are stamped with the revision taken under the
/// entries lock; one caller at a time drains `pending`, so the listener never
/// sees an older list after a newer one.
#[derive(Default)]
struct Delivery {
    pending: Option<(u64, Vec<ClipboardEntry>)>,
    delivered: u64,
    draining: bool,
}

/// Bounded, de-duplicated, newest-first clipboard history.
///
/// Every mutation is persisted before the lock is released, so the stored
/// blob always reflects the order of mutations.
pub struct HistoryStore {
    storage: Arc<dyn PreferenceStore>,
    pasteboard: Arc<dyn Pasteboard>,
    entries: Mutex<Vec<ClipboardEntry>>,
    /// Bumped while `entries` is held
    revision: AtomicU64,
    listener: Mutex<Option<HistoryListener>>,
    delivery: Mutex<Delivery>,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn PreferenceStore>, pasteboard: Arc<dyn Pasteboard>) -> Self {
        Self {
            storage,
            pasteboard,
            entries: Mutex::new(Vec::new()),
            revision: AtomicU64::new(0),
            listener: Mutex::new(None),
            delivery: Mutex::new(Delivery::default()),
        }
    }

    /// Create the store and restore whatever was persisted
    pub fn open(storage: Arc<dyn PreferenceStore>, pasteboard: Arc<dyn Pasteboard>) -> Self {
        let store = Self::new(storage, pasteboard);
        store.load();
        store
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<ClipboardEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("[ClipboardHistory] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    pub fn set_listener(&self, listener: HistoryListener) {
        let mut slot = match self.listener.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(listener);
    }

    fn lock_delivery(&self) -> MutexGuard<'_, Delivery> {
        match self.delivery.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Next revision; call with the entries lock held
    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Hand a snapshot to the listener without holding the entries lock.
    ///
    /// If another thread is already delivering, the snapshot is parked for it
    /// and this call returns at once. Stale snapshots are dropped.
    fn notify(&self, revision: u64, snapshot: Vec<ClipboardEntry>) {
        {
            let mut delivery = self.lock_delivery();
            let newest_queued = delivery.pending.as_ref().map_or(delivery.delivered, |(queued, _)| *queued);
            if revision <= newest_queued {
                return;
            }
            delivery.pending = Some((revision, snapshot));
            if delivery.draining {
                return;
            }
            delivery.draining = true;
        }

        loop {
            let next = {
                let mut delivery = self.lock_delivery();
                match delivery.pending.take() {
                    Some((revision, snapshot)) => {
                        delivery.delivered = revision;
                        snapshot
                    }
                    None => {
                        delivery.draining = false;
                        return;
                    }
                }
            };

            let listener = match self.listener.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            if let Some(listener) = listener {
                listener(&next);
            }
        }
    }

    fn persist(&self, entries: &[ClipboardEntry]) -> AppResult<()> {
        let blob = encode_entries(entries)?;
        self.storage.write(HISTORY_KEY, &blob)
    }

    fn persist_logged(&self, entries: &[ClipboardEntry]) {
        if let Err(e) = self.persist(entries) {
            log::error!("[ClipboardHistory] Failed to save history: {}", e);
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Unreadable or undecodable data yields an empty history. Returns the
    /// number of entries restored.
    pub fn load(&self) -> usize {
        let (stored, encoding) = match self.storage.read(HISTORY_KEY) {
            Ok(Some(bytes)) => match decode_entries(&bytes) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::warn!("[ClipboardHistory] Discarding unreadable history: {}", e);
                    (Vec::new(), BlobEncoding::Cbor)
                }
            },
            Ok(None) => (Vec::new(), BlobEncoding::Cbor),
            Err(e) => {
                log::warn!("[ClipboardHistory] Failed to read history: {}", e);
                (Vec::new(), BlobEncoding::Cbor)
            }
        };

        let stored_len = stored.len();
        let entries = sanitize(stored);
        let changed = entries.len() != stored_len;

        let count = entries.len();
        let mut guard = self.lock_entries();
        *guard = entries;

        if encoding == BlobEncoding::LegacyJson || changed {
            log::info!(
                "[ClipboardHistory] Migrating stored history ({:?}, {} -> {} entries)",
                encoding,
                stored_len,
                count
            );
            self.persist_logged(&guard);
        }
        drop(guard);

        log::info!("[ClipboardHistory] Loaded {} entries", count);
        count
    }

    pub fn save(&self) -> AppResult<()> {
        let guard = self.lock_entries();
        self.persist(&guard)
    }

    /// Record `text` at the head of the history.
    ///
    /// Returns `None` when the text is too short after trimming. An existing
    /// entry with the same text is replaced by the new one.
    pub fn insert(&self, text: &str, source: &SourceApp) -> Option<ClipboardEntry> {
        let text = normalize(text)?;
        let entry = ClipboardEntry::capture(text, source);

        let (revision, snapshot) = {
            let mut entries = self.lock_entries();
            entries.retain(|existing| existing.text != entry.text);
            entries.insert(0, entry.clone());
            entries.truncate(MAX_HISTORY_SIZE);
            self.persist_logged(&entries);
            (self.next_revision(), entries.clone())
        };

        log::debug!(
            "[ClipboardHistory] Recorded {} chars (history size {})",
            entry.text.chars().count(),
            snapshot.len()
        );
        self.notify(revision, snapshot);
        Some(entry)
    }

    pub fn clear(&self) {
        let revision = {
            let mut entries = self.lock_entries();
            entries.clear();
            self.persist_logged(&entries);
            self.next_revision()
        };
        log::info!("[ClipboardHistory] Cleared history");
        self.notify(revision, Vec::new());
    }

    /// Remove a single entry; false when the id is unknown
    pub fn remove(&self, id: &str) -> bool {
        let (revision, snapshot) = {
            let mut entries = self.lock_entries();
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            if entries.len() == before {
                return false;
            }
            self.persist_logged(&entries);
            (self.next_revision(), entries.clone())
        };
        self.notify(revision, snapshot);
        true
    }

    pub fn get(&self, id: &str) -> Option<ClipboardEntry> {
        self.lock_entries().iter().find(|entry| entry.id == id).cloned()
    }

    /// Snapshot, newest first
    pub fn entries(&self) -> Vec<ClipboardEntry> {
        self.lock_entries().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Put the entry back on the system pasteboard. History is left untouched;
    /// the poller will see the write and move the text to the head.
    pub fn copy_to_system_clipboard(&self, entry: &ClipboardEntry) -> AppResult<()> {
        self.pasteboard.write_text(&entry.text)
    }

    pub async fn paste_into_front_app(&self, entry: &ClipboardEntry, injector: &PasteInjector) -> AppResult<()> {
        injector.inject(&entry.text).await
    }
}

/// Trim, drop short or duplicate texts (first occurrence wins) and cap the list
fn sanitize(stored: Vec<ClipboardEntry>) -> Vec<ClipboardEntry> {
    let mut seen = HashSet::new();
    stored
        .into_iter()
        .filter_map(|mut entry| {
            entry.text = normalize(&entry.text)?;
            seen.insert(entry.text.clone()).then_some(entry)
        })
        .take(MAX_HISTORY_SIZE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::storage::{InMemoryPreferences, RedbPreferences};
    use crate::system::pasteboard::testing::FakePasteboard;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> (HistoryStore, Arc<InMemoryPreferences>) {
        let prefs = Arc::new(InMemoryPreferences::new());
        let store = HistoryStore::new(prefs.clone(), Arc::new(FakePasteboard::new()));
        (store, prefs)
    }

    fn texts(store: &HistoryStore) -> Vec<String> {
        store.entries().into_iter().map(|e| e.text).collect()
    }

    #[test]
    fn normalize_trims_and_counts_chars() {
        assert_eq!(normalize("  hello \n").as_deref(), Some("hello"));
        assert_eq!(normalize("abc"), None);
        assert_eq!(normalize("   ab   "), None);
        assert_eq!(normalize("äöüß").as_deref(), Some("äöüß"));
    }

    #[test]
    fn short_text_is_rejected() {
        let (store, _) = store();
        assert!(store.insert("ab", &SourceApp::unknown()).is_none());
        assert!(store.insert("  abc \n", &SourceApp::unknown()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_moves_to_front_with_fresh_entry() {
        let (store, _) = store();
        let first = store.insert("hello world", &SourceApp::unknown()).unwrap();
        store.insert("another one", &SourceApp::unknown()).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let again = store.insert("  hello world  ", &SourceApp::new("Mail", "com.apple.mail")).unwrap();

        assert_eq!(texts(&store), vec!["hello world", "another one"]);
        assert_ne!(again.id, first.id);
        assert!(again.captured_at > first.captured_at);
        assert_eq!(store.entries()[0].source_app_name.as_deref(), Some("Mail"));
    }

    #[test]
    fn overflow_evicts_oldest() {
        let (store, _) = store();
        for i in 0..(MAX_HISTORY_SIZE + 5) {
            store.insert(&format!("entry number {}", i), &SourceApp::unknown());
        }

        let entries = texts(&store);
        assert_eq!(entries.len(), MAX_HISTORY_SIZE);
        assert_eq!(entries[0], format!("entry number {}", MAX_HISTORY_SIZE + 4));
        assert_eq!(entries[MAX_HISTORY_SIZE - 1], "entry number 5");
    }

    #[test]
    fn clear_is_idempotent_and_persisted() {
        let (store, prefs) = store();
        store.insert("something long", &SourceApp::unknown());

        store.clear();
        assert!(store.is_empty());
        store.clear();
        assert!(store.is_empty());

        let reopened = HistoryStore::open(prefs, Arc::new(FakePasteboard::new()));
        assert!(reopened.is_empty());
    }

    #[test]
    fn remove_by_id() {
        let (store, _) = store();
        let keep = store.insert("keep this one", &SourceApp::unknown()).unwrap();
        let drop_me = store.insert("drop this one", &SourceApp::unknown()).unwrap();

        assert!(store.remove(&drop_me.id));
        assert!(!store.remove(&drop_me.id));
        assert_eq!(store.get(&keep.id), Some(keep));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn save_then_load_reproduces_list_through_redb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.redb");

        let saved = {
            let prefs = Arc::new(RedbPreferences::open(&path).unwrap());
            let store = HistoryStore::new(prefs, Arc::new(FakePasteboard::new()));
            store.insert("first copied text", &SourceApp::new("Notes", "com.apple.Notes"));
            store.insert("second copied text", &SourceApp::unknown());
            store.save().unwrap();
            store.entries()
        };

        let prefs = Arc::new(RedbPreferences::open(&path).unwrap());
        let store = HistoryStore::open(prefs, Arc::new(FakePasteboard::new()));
        assert_eq!(store.entries(), saved);
    }

    #[test]
    fn documented_scenario() {
        let (store, _) = store();

        store.insert("hello world", &SourceApp::unknown());
        assert_eq!(texts(&store), vec!["hello world"]);

        store.insert("ab", &SourceApp::unknown());
        assert_eq!(texts(&store), vec!["hello world"]);

        store.insert("hello world", &SourceApp::unknown());
        assert_eq!(texts(&store), vec!["hello world"]);

        for i in 0..MAX_HISTORY_SIZE {
            store.insert(&format!("distinct text {}", i), &SourceApp::unknown());
        }
        assert_eq!(store.len(), MAX_HISTORY_SIZE);
        assert!(!texts(&store).contains(&"hello world".to_string()));

        store.insert("one more entry", &SourceApp::unknown());
        let entries = texts(&store);
        assert_eq!(entries.len(), MAX_HISTORY_SIZE);
        assert_eq!(entries[0], "one more entry");
        assert!(!entries.contains(&"distinct text 0".to_string()));
    }

    #[test]
    fn legacy_blob_is_normalised_and_rewritten() {
        let prefs = Arc::new(InMemoryPreferences::new());
        prefs
            .write(
                HISTORY_KEY,
                br#"[
                    {"content": "  newest legacy  ", "timestamp": "2024-03-01T00:00:00Z"},
                    {"content": "no"},
                    {"content": "newest legacy", "timestamp": "2024-02-01T00:00:00Z"},
                    {"content": "older legacy", "source_app": "Terminal"}
                ]"#,
            )
            .unwrap();

        let store = HistoryStore::open(prefs.clone(), Arc::new(FakePasteboard::new()));

        assert_eq!(texts(&store), vec!["newest legacy", "older legacy"]);
        let (_, encoding) = decode_entries(&prefs.read(HISTORY_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(encoding, BlobEncoding::Cbor);
    }

    #[test]
    fn garbage_blob_loads_empty() {
        let prefs = Arc::new(InMemoryPreferences::new());
        prefs.write(HISTORY_KEY, b"\xff\xfe garbage").unwrap();

        let store = HistoryStore::open(prefs, Arc::new(FakePasteboard::new()));

        assert!(store.is_empty());
        assert!(store.insert("works afterwards", &SourceApp::unknown()).is_some());
    }

    #[test]
    fn copy_leaves_history_untouched() {
        let pasteboard = Arc::new(FakePasteboard::new());
        let store = HistoryStore::new(Arc::new(InMemoryPreferences::new()), pasteboard.clone());
        store.insert("older entry", &SourceApp::unknown());
        let newest = store.insert("newest entry", &SourceApp::unknown()).unwrap();
        let older = store.entries()[1].clone();

        store.copy_to_system_clipboard(&older).unwrap();

        assert_eq!(pasteboard.contents().as_deref(), Some("older entry"));
        assert_eq!(store.entries()[0], newest);
    }

    #[test]
    fn listener_sees_every_mutation() {
        let (store, _) = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        store.set_listener(Arc::new(move |_entries: &[ClipboardEntry]| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.insert("first entry", &SourceApp::unknown());
        store.insert("no", &SourceApp::unknown());
        store.clear();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn slow_listener_never_ends_on_a_stale_snapshot() {
        use std::sync::mpsc;

        let (store, _) = store();
        let store = Arc::new(store);

        let delivered: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let entered_tx = Mutex::new(Some(entered_tx));
        let release_rx = Mutex::new(release_rx);

        let log = delivered.clone();
        store.set_listener(Arc::new(move |entries: &[ClipboardEntry]| {
            // Hold up the first delivery until the main thread has cleared
            if let Some(tx) = entered_tx.lock().unwrap().take() {
                tx.send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
            }
            log.lock().unwrap().push(entries.iter().map(|e| e.text.clone()).collect());
        }));

        let poller = {
            let store = store.clone();
            std::thread::spawn(move || {
                store.insert("captured by poller", &SourceApp::unknown());
            })
        };

        entered_rx.recv().unwrap();
        store.clear();
        release_tx.send(()).unwrap();
        poller.join().unwrap();

        assert!(store.is_empty());
        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.last(), Some(&Vec::<String>::new()));
    }

    #[test]
    fn out_of_order_snapshot_is_dropped() {
        let (store, _) = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        store.set_listener(Arc::new(move |entries: &[ClipboardEntry]| {
            log.lock().unwrap().push(entries.len());
        }));

        store.notify(2, Vec::new());
        store.notify(1, vec![ClipboardEntry::capture("late arrival".to_string(), &SourceApp::unknown())]);

        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }
}
