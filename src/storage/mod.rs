pub mod tables;
pub mod memory;
pub mod snapshot;

use async_trait::async_trait;
use crate::core::error::Result;
use crate::core::types::{Document, Nid};
use crate::index::key::IndexKey;
use crate::index::posting::{Posting, PostingId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// Backend owning the records, postings and metadata tables.
#[async_trait]
pub trait Storage: Send + Sync {
    type Transaction: StorageTransaction;

    /// Creates (or loads) the tables. Called once per collection before the
    /// first transaction.
    async fn open(&self) -> Result<()>;

    async fn begin(&self, mode: TransactionMode) -> Result<Self::Transaction>;
}

/// Table access within one transaction. Writes made through a transaction
/// are visible to its own reads and published only by `commit`.
#[async_trait]
pub trait StorageTransaction: Send + Sync {
    fn mode(&self) -> TransactionMode;

    // records
    /// Stores a record under a freshly allocated nid. Fails `AlreadyExists`
    /// when the id is taken.
    async fn add_record(&mut self, document: Document) -> Result<Nid>;
    async fn get_record(&self, nid: Nid) -> Result<Option<Document>>;
    async fn record_nid(&self, id: &str) -> Result<Option<Nid>>;
    async fn contains_record(&self, nid: Nid) -> Result<bool>;
    async fn record_nids(&self) -> Result<Vec<Nid>>;
    async fn delete_record(&mut self, nid: Nid) -> Result<()>;

    // postings
    async fn add_posting(&mut self, posting: Posting) -> Result<PostingId>;
    async fn postings_by_key(&self, key: &IndexKey) -> Result<Vec<Posting>>;
    async fn postings_with_prefix(&self, prefix: &IndexKey) -> Result<Vec<Posting>>;
    async fn posting_ids_by_nid(&self, nid: Nid) -> Result<Vec<PostingId>>;
    async fn delete_posting(&mut self, id: PostingId) -> Result<()>;

    // metadata
    async fn get_metadata(&self, key: &str) -> Result<Option<String>>;
    async fn put_metadata(&mut self, key: &str, value: String) -> Result<()>;

    /// Empties all three tables.
    async fn clear(&mut self) -> Result<()>;

    async fn commit(self) -> Result<()>
    where
        Self: Sized;

    /// Discards every write made through this transaction.
    fn abort(self)
    where
        Self: Sized;
}
