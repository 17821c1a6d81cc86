//! Snapshot persistence.
//!
//! The whole ledger is one JSON document, loaded wholesale at startup and
//! written wholesale after every accepted mutation. Backups are the same
//! document.

use crate::error::PersistenceError;
use crate::seed::seed_state;
use crate::state::LedgerState;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default snapshot file name
pub const DEFAULT_DATA_FILE: &str = "msdas_db_v1.json";

/// Serializes the ledger to the snapshot document
///
/// # Errors
///
/// [`PersistenceError::Serialization`] if encoding fails.
pub fn encode(state: &LedgerState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(state)?)
}

/// Parses a snapshot document
///
/// # Errors
///
/// [`PersistenceError::Serialization`] for malformed documents.
pub fn decode(document: &str) -> Result<LedgerState, PersistenceError> {
    Ok(serde_json::from_str(document)?)
}

/// Parses a snapshot document straight from stored bytes
///
/// Bytes that are not UTF-8 fail like any other malformed document.
///
/// # Errors
///
/// [`PersistenceError::Serialization`] for malformed documents.
pub fn decode_bytes(document: &[u8]) -> Result<LedgerState, PersistenceError> {
    Ok(serde_json::from_slice(document)?)
}

/// Where snapshots live
///
/// Object-safe so the environment can hold an `Arc<dyn SnapshotStore>`.
pub trait SnapshotStore: Send + Sync {
    /// Reads the stored document as raw bytes; `None` when nothing has been
    /// written yet
    fn load(&self) -> BoxFuture<'_, Result<Option<Vec<u8>>, PersistenceError>>;

    /// Replaces the stored document
    fn save(&self, document: String) -> BoxFuture<'_, Result<(), PersistenceError>>;

    /// Human-readable location for logs
    fn location(&self) -> String;
}

/// Snapshot stored in a single file
///
/// Writes go to a sibling temp file that is then renamed over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<Vec<u8>>, PersistenceError>> {
        Box::pin(async move {
            match tokio::fs::read(&self.path).await {
                Ok(document) => Ok(Some(document)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(PersistenceError::io(&self.path, e)),
            }
        })
    }

    fn save(&self, document: String) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(async move {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PersistenceError::io(parent, e))?;
            }
            let temp = self.temp_path();
            tokio::fs::write(&temp, document.as_bytes())
                .await
                .map_err(|e| PersistenceError::io(&temp, e))?;
            tokio::fs::rename(&temp, &self.path)
                .await
                .map_err(|e| PersistenceError::io(&self.path, e))?;
            Ok(())
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory snapshot store for tests
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    document: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemorySnapshotStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `document`
    #[must_use]
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
            ..Self::default()
        }
    }

    /// Makes every subsequent `save` fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current document
    pub async fn document(&self) -> Option<String> {
        self.document.lock().await.clone()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<Vec<u8>>, PersistenceError>> {
        Box::pin(async move { Ok(self.document.lock().await.clone().map(String::into_bytes)) })
    }

    fn save(&self, document: String) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PersistenceError::Unavailable(
                    "in-memory store is failing writes".to_string(),
                ));
            }
            *self.document.lock().await = Some(document);
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Serializes snapshot writes and drops stale ones
///
/// Snapshot effects run as independent tasks and may finish out of order; a
/// write whose revision is not newer than the last one written is skipped.
#[derive(Clone)]
pub struct SnapshotWriter {
    store: Arc<dyn SnapshotStore>,
    last_written: Arc<Mutex<u64>>,
}

impl SnapshotWriter {
    /// Writer whose store already holds `revision`
    #[must_use]
    pub fn new(store: Arc<dyn SnapshotStore>, revision: u64) -> Self {
        Self {
            store,
            last_written: Arc::new(Mutex::new(revision)),
        }
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Writes `document` unless a newer revision is already stored
    ///
    /// Returns whether the document was written.
    ///
    /// # Errors
    ///
    /// Propagates the store's write failure.
    pub async fn write(&self, revision: u64, document: String) -> Result<bool, PersistenceError> {
        let mut last = self.last_written.lock().await;
        if revision <= *last {
            tracing::trace!(revision, last = *last, "Skipping stale snapshot");
            return Ok(false);
        }
        self.store.save(document).await?;
        *last = revision;
        tracing::debug!(revision, location = %self.store.location(), "Snapshot written");
        Ok(true)
    }
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("location", &self.store.location())
            .finish_non_exhaustive()
    }
}

/// How the startup state was obtained
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Read the stored snapshot
    Loaded,
    /// Nothing stored; seeded reference data
    Seeded,
    /// Stored snapshot was unreadable; reseeded
    Recovered {
        /// Parse failure
        reason: String,
    },
}

/// Loads the ledger, falling back to seed data when absent or corrupt
///
/// The seed is written back immediately. A failed write-back is logged, not
/// returned, so startup always yields a usable ledger.
///
/// # Errors
///
/// [`PersistenceError::Io`] when the store exists but cannot be read.
pub async fn load_or_seed(
    store: &dyn SnapshotStore,
) -> Result<(LedgerState, LoadOutcome), PersistenceError> {
    let outcome = match store.load().await? {
        None => LoadOutcome::Seeded,
        Some(document) => match decode_bytes(&document) {
            Ok(state) => {
                tracing::info!(
                    location = %store.location(),
                    revision = state.revision,
                    tickets = state.tickets.len(),
                    "Loaded snapshot"
                );
                return Ok((state, LoadOutcome::Loaded));
            },
            Err(error) => {
                tracing::warn!(
                    location = %store.location(),
                    %error,
                    "Snapshot unreadable, reseeding"
                );
                LoadOutcome::Recovered {
                    reason: error.to_string(),
                }
            },
        },
    };

    let state = seed_state();
    match encode(&state) {
        Ok(document) => {
            if let Err(error) = store.save(document).await {
                tracing::warn!(location = %store.location(), %error, "Could not write seed snapshot");
            }
        },
        Err(error) => tracing::warn!(%error, "Could not encode seed snapshot"),
    }
    tracing::info!(location = %store.location(), ?outcome, "Seeded ledger");
    Ok((state, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_snapshot_is_seeded_and_written() {
        let store = InMemorySnapshotStore::new();

        let (state, outcome) = load_or_seed(&store).await.unwrap();

        assert_eq!(outcome, LoadOutcome::Seeded);
        assert_eq!(state, seed_state());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_recovered() {
        let store = InMemorySnapshotStore::with_document("{ not json");

        let (state, outcome) = load_or_seed(&store).await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Recovered { .. }));
        assert_eq!(state.shows.len(), 2);
        let rewritten = store.document().await.unwrap();
        assert_eq!(decode(&rewritten).unwrap(), seed_state());
    }

    #[tokio::test]
    async fn seeding_survives_a_failing_store() {
        let store = InMemorySnapshotStore::new();
        store.set_fail_writes(true);

        let (_, outcome) = load_or_seed(&store).await.unwrap();

        assert_eq!(outcome, LoadOutcome::Seeded);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn writer_skips_stale_revisions() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let writer = SnapshotWriter::new(store.clone(), 0);

        assert!(writer.write(2, "two".into()).await.unwrap());
        assert!(!writer.write(1, "one".into()).await.unwrap());

        assert_eq!(store.document().await.as_deref(), Some("two"));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn binary_garbage_is_a_decode_error() {
        let garbage = [0xff, 0xfe, 0x00, b'{'];
        assert!(matches!(
            decode_bytes(&garbage),
            Err(PersistenceError::Serialization(_))
        ));
    }

    #[test]
    fn document_round_trips() {
        let mut state = seed_state();
        state.revision = 7;

        let back = decode(&encode(&state).unwrap()).unwrap();

        assert_eq!(back, state);
    }
}
