use std::path::PathBuf;
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Document, Nid};
use crate::index::key::IndexKey;
use crate::index::posting::{Posting, PostingId};
use crate::storage::snapshot::Snapshot;
use crate::storage::tables::Tables;
use crate::storage::{Storage, StorageTransaction, TransactionMode};

struct Shared {
    tables: RwLock<Arc<Tables>>,
    writer: Arc<Mutex<()>>,
    snapshot_path: Option<PathBuf>,
}

/// Copy-on-write table storage.
///
/// Readers pin the last committed `Arc<Tables>`; the single writer holds the
/// writer lock, mutates a private copy and swaps it in on commit. With a
/// snapshot path configured, each commit is persisted before it is published.
///
/// Every read-write transaction clones the whole collection when it begins,
/// and every persisted commit rewrites the whole snapshot file. Both costs grow
/// with the collection, not with the size of the write, so batch writes into
/// one transaction rather than committing per document.
#[derive(Clone)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_snapshot_path(None)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_snapshot_path(config.snapshot_path())
    }

    pub fn with_snapshot_path(snapshot_path: Option<PathBuf>) -> Self {
        MemoryStorage {
            shared: Arc::new(Shared {
                tables: RwLock::new(Arc::new(Tables::new())),
                writer: Arc::new(Mutex::new(())),
                snapshot_path,
            }),
        }
    }

    /// Committed state, for diagnostics.
    pub fn committed(&self) -> Arc<Tables> {
        self.shared.tables.read().clone()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Transaction = MemoryTransaction;

    async fn open(&self) -> Result<()> {
        let Some(path) = &self.shared.snapshot_path else {
            return Ok(());
        };

        match Snapshot::load(path).await? {
            Some(snapshot) => {
                tracing::info!(
                    "Loaded snapshot {:?} saved at {} ({} records)",
                    path,
                    snapshot.saved_at,
                    snapshot.tables.record_count()
                );
                *self.shared.tables.write() = Arc::new(snapshot.tables);
            }
            None => tracing::info!("No snapshot at {:?}, starting empty", path),
        }
        Ok(())
    }

    async fn begin(&self, mode: TransactionMode) -> Result<MemoryTransaction> {
        let state = match mode {
            TransactionMode::ReadOnly => TxnState::ReadOnly(self.committed()),
            TransactionMode::ReadWrite => {
                let guard = self.shared.writer.clone().lock_owned().await;
                let tables = Tables::clone(&self.committed());
                TxnState::ReadWrite {
                    tables,
                    shared: self.shared.clone(),
                    _guard: guard,
                }
            }
        };

        Ok(MemoryTransaction { mode, state })
    }
}

enum TxnState {
    ReadOnly(Arc<Tables>),
    ReadWrite {
        tables: Tables,
        shared: Arc<Shared>,
        _guard: OwnedMutexGuard<()>,
    },
}

pub struct MemoryTransaction {
    mode: TransactionMode,
    state: TxnState,
}

impl MemoryTransaction {
    fn tables(&self) -> &Tables {
        match &self.state {
            TxnState::ReadOnly(tables) => tables,
            TxnState::ReadWrite { tables, .. } => tables,
        }
    }

    fn tables_mut(&mut self) -> Result<&mut Tables> {
        match &mut self.state {
            TxnState::ReadWrite { tables, .. } => Ok(tables),
            TxnState::ReadOnly(_) => Err(Error::new(
                ErrorKind::InvalidState,
                "Transaction is read-only".to_string(),
            )),
        }
    }
}

#[async_trait]
impl StorageTransaction for MemoryTransaction {
    fn mode(&self) -> TransactionMode {
        self.mode
    }

    async fn add_record(&mut self, document: Document) -> Result<Nid> {
        self.tables_mut()?.add_record(document)
    }

    async fn get_record(&self, nid: Nid) -> Result<Option<Document>> {
        Ok(self.tables().get_record(nid).cloned())
    }

    async fn record_nid(&self, id: &str) -> Result<Option<Nid>> {
        Ok(self.tables().record_nid(id))
    }

    async fn contains_record(&self, nid: Nid) -> Result<bool> {
        Ok(self.tables().contains_record(nid))
    }

    async fn record_nids(&self) -> Result<Vec<Nid>> {
        Ok(self.tables().record_nids())
    }

    async fn delete_record(&mut self, nid: Nid) -> Result<()> {
        self.tables_mut()?.delete_record(nid);
        Ok(())
    }

    async fn add_posting(&mut self, posting: Posting) -> Result<PostingId> {
        Ok(self.tables_mut()?.add_posting(posting))
    }

    async fn postings_by_key(&self, key: &IndexKey) -> Result<Vec<Posting>> {
        Ok(self.tables().postings_by_key(key))
    }

    async fn postings_with_prefix(&self, prefix: &IndexKey) -> Result<Vec<Posting>> {
        Ok(self.tables().postings_with_prefix(prefix))
    }

    async fn posting_ids_by_nid(&self, nid: Nid) -> Result<Vec<PostingId>> {
        Ok(self.tables().posting_ids_by_nid(nid))
    }

    async fn delete_posting(&mut self, id: PostingId) -> Result<()> {
        self.tables_mut()?.delete_posting(id);
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        Ok(self.tables().get_metadata(key).map(str::to_string))
    }

    async fn put_metadata(&mut self, key: &str, value: String) -> Result<()> {
        self.tables_mut()?.put_metadata(key, value);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.tables_mut()?.clear();
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let TxnState::ReadWrite { tables, shared, _guard } = self.state else {
            return Ok(());
        };

        let tables = match &shared.snapshot_path {
            Some(path) => {
                let snapshot = Snapshot::new(tables);
                snapshot.save(path).await?;
                tracing::debug!("Persisted snapshot to {:?}", path);
                snapshot.tables
            }
            None => tables,
        };

        *shared.tables.write() = Arc::new(tables);
        Ok(())
    }

    fn abort(self) {
        // dropping the private copy releases the writer lock
    }
}
