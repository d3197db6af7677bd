//! Persistent candidate store
//!
//! The writer thread owns a single [`Store`] handle exclusively; no other
//! component touches it. The trait exposes exactly what the pipeline needs:
//! a staged insert-if-absent and an atomic batch commit.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Store failure taxonomy.
///
/// Transient errors (lock contention, busy database) are worth retrying with
/// backoff; fatal errors mean durability can no longer be guaranteed and the
/// run must abort.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient store error: {0}")]
    Transient(String),
    #[error("fatal store error: {0}")]
    Fatal(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StoreError::Transient(e.to_string())
            }
            _ => StoreError::Fatal(e.to_string()),
        }
    }
}

/// Durable set of committed candidates.
///
/// Staged inserts become durable only at `commit_batch`; a batch is atomic,
/// so a failed commit leaves no partial state behind.
pub trait Store: Send {
    /// Insert the candidate unless already present (staged, not yet durable).
    /// Returns `true` when the candidate already existed and nothing was
    /// inserted.
    fn exists_or_insert(&mut self, candidate: &str) -> Result<bool, StoreError>;

    /// Atomically commit all staged inserts.
    fn commit_batch(&mut self) -> Result<(), StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS passwords (
    password TEXT PRIMARY KEY,
    created TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_created ON passwords(created);
";

/// SQLite-backed store.
///
/// Staged inserts run inside an open transaction; `commit_batch` commits it.
/// `INSERT OR IGNORE` against the primary key gives the existence check for
/// free via the change count.
pub struct SqliteStore {
    conn: Connection,
    in_tx: bool,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open database {:?}: {}", path, e))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self { conn, in_tx: false })
    }

    #[cfg(test)]
    fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, in_tx: false })
    }

    /// Number of committed candidates.
    pub fn len(&self) -> Result<u64, StoreError> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM passwords", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Store for SqliteStore {
    fn exists_or_insert(&mut self, candidate: &str) -> Result<bool, StoreError> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN")?;
            self.in_tx = true;
        }

        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO passwords (password) VALUES (?1)")?;
        let inserted = stmt.execute([candidate])?;

        Ok(inserted == 0)
    }

    fn commit_batch(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT")?;
            self.in_tx = false;
        }
        Ok(())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // An uncommitted batch must not become durable
        if self.in_tx {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    committed: hashbrown::HashSet<String, ahash::RandomState>,
    pending: hashbrown::HashSet<String, ahash::RandomState>,
}

/// In-memory store with the same staging semantics as [`SqliteStore`].
///
/// Cloned handles share state, which lets tests hold a handle for inspection
/// while the writer owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed_len(&self) -> usize {
        self.inner.lock().unwrap().committed.len()
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.inner.lock().unwrap().committed.contains(candidate)
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    pub fn committed(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .committed
            .iter()
            .cloned()
            .collect()
    }
}

impl Store for MemoryStore {
    fn exists_or_insert(&mut self, candidate: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.committed.contains(candidate) || inner.pending.contains(candidate) {
            return Ok(true);
        }
        inner.pending.insert(candidate.to_string());
        Ok(false)
    }

    fn commit_batch(&mut self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let pending: Vec<String> = inner.pending.drain().collect();
        inner.committed.extend(pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_exists_or_insert() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert!(!store.exists_or_insert("Password1!").unwrap());
        assert!(store.exists_or_insert("Password1!").unwrap());
        assert!(!store.exists_or_insert("Hunter2$").unwrap());

        store.commit_batch().unwrap();
        assert_eq!(store.len().unwrap(), 2);

        // Committed rows still report as existing
        assert!(store.exists_or_insert("Password1!").unwrap());
    }

    #[test]
    fn test_sqlite_batch_is_atomic_until_commit() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert!(!store.exists_or_insert("staged").unwrap());
        // Staged inserts are visible to the same connection but only become
        // durable at commit
        store.commit_batch().unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("passwords.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            assert!(!store.exists_or_insert("Durable1!").unwrap());
            store.commit_batch().unwrap();
        }

        let mut store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.exists_or_insert("Durable1!").unwrap());
    }

    #[test]
    fn test_sqlite_uncommitted_batch_rolls_back_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("passwords.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            assert!(!store.exists_or_insert("committed").unwrap());
            store.commit_batch().unwrap();
            assert!(!store.exists_or_insert("abandoned").unwrap());
            // Dropped without commit_batch
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_memory_store_staging() {
        let store = MemoryStore::new();
        let mut handle = store.clone();

        assert!(!handle.exists_or_insert("one").unwrap());
        assert!(handle.exists_or_insert("one").unwrap());
        assert_eq!(store.committed_len(), 0);
        assert_eq!(store.pending_len(), 1);

        handle.commit_batch().unwrap();
        assert_eq!(store.committed_len(), 1);
        assert_eq!(store.pending_len(), 0);
        assert!(store.contains("one"));
    }

    #[test]
    fn test_error_classification() {
        let transient = StoreError::Transient("busy".into());
        let fatal = StoreError::Fatal("corrupt".into());

        assert!(transient.is_transient());
        assert!(!fatal.is_transient());
    }
}
