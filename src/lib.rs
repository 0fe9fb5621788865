pub mod core;
pub mod storage;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod search;
pub mod query;

pub use crate::core::config::{Config, HighlightConfig};
pub use crate::core::data_struct::DataStruct;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{Document, FieldValue, Nid};
pub use crate::query::ast::{Occur, Query};
pub use crate::schema::schema::{FieldType, Schema};
pub use crate::search::results::{
    AggregateOptions, AggregateResult, Bucket, HighlightRequest, PaginationInfo, PaginationOptions,
    SearchNode, SearchOptions, SearchResult,
};
pub use crate::storage::memory::MemoryStorage;
pub use crate::storage::{Storage, StorageTransaction, TransactionMode};

/*
┌──────────────────────────────── DOCSTRUCT ARCHITECTURE ────────────────────────────────┐

┌──────────────────────────────────── CORE LAYER ─────────────────────────────────────────┐
│  struct DataStruct<S: Storage = MemoryStorage>                                          │
│  │ config: Config                          // name, snapshot dir, page sizes            │
│  │ schema: Schema                          // field name -> FieldType                   │
│  │ indexes: HashMap<String, InvertedIndex> // one strategy per field                    │
│  │ storage: S                              // records / postings / metadata tables      │
│  │ initialized: OnceCell<()>               // lazy storage.open()                       │
│  insert / delete / batch_write / search / aggregate / get_all / has / clear             │
└─────────────────────────────────────────────────────────────────────────────────────────┘
            │ query tree                                   │ transaction
            ▼                                              ▼
┌──────────── SEARCH LAYER ───────────────┐   ┌─────────────── STORAGE LAYER ─────────────┐
│ QueryExecutor  match/exists/all/boost/  │   │ trait Storage { open, begin }             │
│                boolean(must/should/     │   │ trait StorageTransaction                  │
│                must_not)                │   │ MemoryStorage (copy-on-write Tables)      │
│ Match          scores + highlights,     │   │   readers: Arc<Tables> snapshot           │
│                and/or/exclude/boost     │   │   writer:  owned Mutex guard + copy       │
│ highlight()    bounded excerpts         │   │ Snapshot  crc32 | lz4(bincode(Tables))    │
└─────────────────────────────────────────┘   └───────────────────────────────────────────┘
            │ leaves
            ▼
┌──────────────────────────────────── INDEX LAYER ────────────────────────────────────────┐
│ enum InvertedIndex { String, Integer, FullText, Boolean }                               │
│ IndexKey = field ‖ 0x00 ‖ encoded value      Posting { nid, key, position }             │
│ FullText -> GeneralTokenizer (word bounds, lowercase, CJK bigrams)                      │
└─────────────────────────────────────────────────────────────────────────────────────────┘
*/
