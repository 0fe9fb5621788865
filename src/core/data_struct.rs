use std::collections::{BTreeMap, HashMap, HashSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::{Document, FieldValue, Nid};
use crate::index::inverted::InvertedIndex;
use crate::query::ast::Query;
use crate::schema::schema::Schema;
use crate::search::executor::QueryExecutor;
use crate::search::highlight::highlight;
use crate::search::matches::Match;
use crate::search::results::{
    AggregateOptions, AggregateResult, Bucket, PaginationInfo, SearchNode, SearchOptions, SearchResult,
};
use crate::storage::memory::MemoryStorage;
use crate::storage::{Storage, StorageTransaction, TransactionMode};

/// A schema-typed document collection.
///
/// Owns one inverted index per schema field and the storage holding the
/// records, postings and metadata tables. Every operation runs inside a
/// transaction obtained from [`DataStruct::readonly`] or
/// [`DataStruct::readwrite`]; nothing is visible to other transactions until
/// the caller commits it.
pub struct DataStruct<S: Storage = MemoryStorage> {
    config: Config,
    schema: Schema,
    indexes: HashMap<String, InvertedIndex>,
    storage: S,
    initialized: OnceCell<()>,
}

impl DataStruct<MemoryStorage> {
    /// In-memory collection, persisted to `config.snapshot_path()` when set.
    pub fn new(schema: Schema, config: Config) -> Self {
        let storage = MemoryStorage::from_config(&config);
        Self::with_storage(schema, config, storage)
    }
}

impl<S: Storage> DataStruct<S> {
    pub fn with_storage(schema: Schema, config: Config, storage: S) -> Self {
        let indexes = schema
            .fields
            .iter()
            .map(|field| (field.name.clone(), InvertedIndex::new(&field.name, field.field_type)))
            .collect();

        DataStruct {
            config,
            schema,
            indexes,
            storage,
            initialized: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn readonly(&self) -> Result<S::Transaction> {
        self.ensure_initialized().await?;
        self.storage.begin(TransactionMode::ReadOnly).await
    }

    pub async fn readwrite(&self) -> Result<S::Transaction> {
        self.ensure_initialized().await?;
        self.storage.begin(TransactionMode::ReadWrite).await
    }

    // concurrent first callers all await the same open()
    async fn ensure_initialized(&self) -> Result<()> {
        self.initialized
            .get_or_try_init(|| async {
                self.storage.open().await?;
                tracing::info!(
                    "Initialized collection '{}' with {} fields",
                    self.config.name,
                    self.schema.len()
                );
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    pub async fn insert(&self, txn: &mut S::Transaction, document: Document) -> Result<()> {
        if let Some(field) = document.fields.keys().find(|f| !self.indexes.contains_key(*f)) {
            return Err(Error::unknown_field(field));
        }
        for (field, values) in &document.fields {
            if let Some(index) = self.indexes.get(field) {
                index.validate(values)?;
            }
        }

        let fields = document.fields.clone();
        let nid = txn.add_record(document).await?;

        for (field, values) in &fields {
            if let Some(index) = self.indexes.get(field) {
                index.insert(txn, nid, values).await?;
            }
        }

        tracing::debug!("Inserted nid {} with {} fields", nid, fields.len());
        Ok(())
    }

    /// Removes the record and every posting of its nid. Unknown ids are a no-op.
    pub async fn delete(&self, txn: &mut S::Transaction, id: &str) -> Result<()> {
        let Some(nid) = txn.record_nid(id).await? else {
            return Ok(());
        };

        txn.delete_record(nid).await?;
        let postings = txn.posting_ids_by_nid(nid).await?;
        let removed = postings.len();
        for posting in postings {
            txn.delete_posting(posting).await?;
        }

        tracing::debug!("Deleted '{}' (nid {}, {} postings)", id, nid, removed);
        Ok(())
    }

    /// All deletes, then all inserts, in one transaction.
    pub async fn batch_write(
        &self,
        txn: &mut S::Transaction,
        deletes: &[String],
        inserts: Vec<Document>,
    ) -> Result<()> {
        let (deleted, inserted) = (deletes.len(), inserts.len());
        for id in deletes {
            self.delete(txn, id).await?;
        }
        for document in inserts {
            self.insert(txn, document).await?;
        }

        tracing::debug!("Batch write: {} deletes, {} inserts", deleted, inserted);
        Ok(())
    }

    pub async fn match_all(&self, txn: &S::Transaction) -> Result<Match> {
        QueryExecutor::new(&self.indexes).match_all(txn).await
    }

    /// Evaluates a query tree; only live records survive.
    pub async fn query(&self, txn: &S::Transaction, query: &Query) -> Result<Match> {
        QueryExecutor::new(&self.indexes).execute(txn, query).await
    }

    pub async fn search(&self, txn: &S::Transaction, query: &Query, options: &SearchOptions) -> Result<SearchResult> {
        let (skip, limit) = options.pagination.resolve(self.config.search_limit);
        let matched = self.query(txn, query).await?;

        let mut nodes = Vec::new();
        for nid in matched.to_vec().into_iter().skip(skip).take(limit) {
            nodes.push(self.result_node(txn, &matched, nid, options).await?);
        }

        tracing::debug!("Search matched {} documents, returning {}", matched.size(), nodes.len());
        Ok(SearchResult {
            pagination: PaginationInfo::new(matched.size(), skip, limit),
            nodes,
        })
    }

    /// Buckets matched documents by each distinct value of `field`.
    ///
    /// Documents are visited in score order, so bucket order is the order in
    /// which values are first seen. A document holding several values lands
    /// in several buckets. A bucket's score is the score of its first member.
    pub async fn aggregate(
        &self,
        txn: &S::Transaction,
        query: &Query,
        field: &str,
        options: &AggregateOptions,
    ) -> Result<AggregateResult> {
        if !self.schema.contains(field) {
            return Err(Error::unknown_field(field));
        }

        let (skip, limit) = options.pagination.resolve(self.config.search_limit);
        let (hit_skip, hit_limit) = match &options.hits {
            Some(hits) => hits.pagination.resolve(self.config.hits_limit),
            None => (0, 0),
        };
        let hit_options = options.hits.clone().unwrap_or_default();

        let matched = self.query(txn, query).await?;

        let mut buckets: Vec<BucketBuilder> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for nid in matched.to_vec() {
            let Some(record) = txn.get_record(nid).await? else {
                continue;
            };

            let mut seen = HashSet::new();
            for value in record.get_field(field) {
                if !seen.insert(value.as_str()) {
                    continue;
                }

                let position = *positions.entry(value.clone()).or_insert_with(|| {
                    buckets.push(BucketBuilder::new(value));
                    buckets.len() - 1
                });
                // members of buckets outside the page are never reported
                if position < skip || position >= skip.saturating_add(limit) {
                    continue;
                }

                let bucket = &mut buckets[position];
                let member = bucket.nids.len();
                bucket.nids.push(nid);
                if member >= hit_skip && member < hit_skip.saturating_add(hit_limit) {
                    bucket.hits.push(self.result_node(txn, &matched, nid, &hit_options).await?);
                }
            }
        }

        let total = buckets.len();
        let page = buckets
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|bucket| {
                let count = bucket.nids.len();
                Bucket {
                    score: bucket.nids.first().and_then(|nid| matched.score(*nid)).unwrap_or(0.0),
                    count,
                    hits: options.hits.as_ref().map(|_| SearchResult {
                        pagination: PaginationInfo::new(count, hit_skip, hit_limit),
                        nodes: bucket.hits,
                    }),
                    key: bucket.key,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Aggregate on '{}' matched {} documents into {} buckets",
            field,
            matched.size(),
            total
        );
        Ok(AggregateResult {
            buckets: page,
            pagination: PaginationInfo::new(total, skip, limit),
        })
    }

    /// Stored documents for the ids that exist, in request order.
    pub async fn get_all(&self, txn: &S::Transaction, ids: &[String]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(nid) = txn.record_nid(id).await? else {
                continue;
            };
            if let Some(document) = txn.get_record(nid).await? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    pub async fn has(&self, txn: &S::Transaction, id: &str) -> Result<bool> {
        Ok(txn.record_nid(id).await?.is_some())
    }

    /// Empties records, postings and metadata.
    pub async fn clear(&self, txn: &mut S::Transaction) -> Result<()> {
        txn.clear().await?;
        tracing::debug!("Cleared collection '{}'", self.config.name);
        Ok(())
    }

    pub async fn get_metadata<T: DeserializeOwned>(&self, txn: &S::Transaction, key: &str) -> Result<Option<T>> {
        match txn.get_metadata(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_metadata<T: Serialize>(&self, txn: &mut S::Transaction, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        txn.put_metadata(key, raw).await
    }

    async fn result_node(
        &self,
        txn: &S::Transaction,
        matched: &Match,
        nid: Nid,
        options: &SearchOptions,
    ) -> Result<SearchNode> {
        let Some(record) = txn.get_record(nid).await? else {
            tracing::error!("Record not found for matched nid {}", nid);
            return Err(Error::record_not_found(nid.value()));
        };

        let fields = options.fields.as_ref().map(|fields| {
            fields
                .iter()
                .map(|field| (field.clone(), FieldValue::from_values(record.get_field(field))))
                .collect::<BTreeMap<_, _>>()
        });

        let highlights = options.highlights.as_ref().map(|requests| {
            let mut highlights = BTreeMap::new();
            for request in requests {
                let Some(by_value) = matched.highlighters(nid, &request.field) else {
                    continue;
                };

                let raw_values = record.get_field(&request.field);
                let excerpts: Vec<String> = by_value
                    .iter()
                    .filter_map(|(index, ranges)| {
                        let Some(raw) = raw_values.get(*index) else {
                            tracing::warn!(
                                "Highlight source {}[{}] missing for nid {}",
                                request.field,
                                index,
                                nid
                            );
                            return None;
                        };
                        highlight(raw, &request.before, &request.end, ranges, self.config.highlight)
                    })
                    .filter(|excerpt| !excerpt.is_empty())
                    .collect();
                highlights.insert(request.field.clone(), excerpts);
            }
            highlights
        });

        Ok(SearchNode {
            id: record.id,
            score: matched.score(nid).unwrap_or(0.0),
            fields,
            highlights,
        })
    }
}

struct BucketBuilder {
    key: String,
    nids: Vec<Nid>,
    hits: Vec<SearchNode>,
}

impl BucketBuilder {
    fn new(key: &str) -> Self {
        BucketBuilder {
            key: key.to_string(),
            nids: Vec::new(),
            hits: Vec::new(),
        }
    }
}
