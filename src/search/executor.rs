use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::inverted::InvertedIndex;
use crate::query::ast::{Occur, Query};
use crate::search::matches::Match;
use crate::storage::StorageTransaction;

type MatchFuture<'b> = Pin<Box<dyn Future<Output = Result<Match>> + Send + 'b>>;

/// Recursive interpreter of a query tree over the per-field indexes.
pub struct QueryExecutor<'a> {
    indexes: &'a HashMap<String, InvertedIndex>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(indexes: &'a HashMap<String, InvertedIndex>) -> Self {
        QueryExecutor { indexes }
    }

    /// Evaluates `query`, then drops every nid whose record is gone.
    pub async fn execute<T: StorageTransaction>(&self, txn: &T, query: &Query) -> Result<Match> {
        let raw = self.execute_raw(txn, query).await?;
        raw.async_filter(|nid| txn.contains_record(nid)).await
    }

    /// Every live record, score 1.
    pub async fn match_all<T: StorageTransaction>(&self, txn: &T) -> Result<Match> {
        Ok(txn
            .record_nids()
            .await?
            .into_iter()
            .map(|nid| (nid, 1.0))
            .collect())
    }

    fn execute_raw<'b, T: StorageTransaction>(&'b self, txn: &'b T, query: &'b Query) -> MatchFuture<'b> {
        Box::pin(async move {
            match query {
                Query::Match { field, value } => self.index(field)?.match_value(txn, value).await,
                Query::Exists { field } => self.index(field)?.all(txn).await,
                Query::All => self.match_all(txn).await,
                Query::Boost { query, boost } => Ok(self.execute_raw(txn, query).await?.boost(*boost)),
                Query::Boolean { occur, queries } => {
                    if queries.is_empty() {
                        return Err(Error::new(
                            ErrorKind::InvalidInput,
                            format!("Boolean '{:?}' query without subqueries", occur),
                        ));
                    }

                    let mut weights = Vec::with_capacity(queries.len());
                    for sub in queries {
                        weights.push(self.execute_raw(txn, sub).await?);
                    }

                    match occur {
                        Occur::Must => Ok(fold(weights, Match::and)),
                        Occur::Should => Ok(fold(weights, Match::or)),
                        // excluded only when a document matches every subquery
                        Occur::MustNot => {
                            let total = fold(weights, Match::and);
                            Ok(self.match_all(txn).await?.exclude(&total))
                        }
                    }
                }
            }
        })
    }

    fn index(&self, field: &str) -> Result<&'a InvertedIndex> {
        self.indexes
            .get(field)
            .ok_or_else(|| Error::unknown_field(field))
    }
}

fn fold(weights: Vec<Match>, combine: fn(Match, Match) -> Match) -> Match {
    weights.into_iter().reduce(combine).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Document, Nid};
    use crate::schema::schema::FieldType;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{Storage, TransactionMode};

    async fn fixture() -> (MemoryStorage, HashMap<String, InvertedIndex>) {
        let mut indexes = HashMap::new();
        indexes.insert("tag".to_string(), InvertedIndex::new("tag", FieldType::String));
        indexes.insert("size".to_string(), InvertedIndex::new("size", FieldType::Integer));

        let storage = MemoryStorage::new();
        storage.open().await.unwrap();
        let mut txn = storage.begin(TransactionMode::ReadWrite).await.unwrap();
        for (id, tags, size) in [("a", vec!["x", "y"], "1"), ("b", vec!["x"], "2"), ("c", vec!["z"], "1")] {
            let doc = Document::new(id).with_values("tag", tags).with_field("size", size);
            let nid = txn.add_record(doc.clone()).await.unwrap();
            for (field, index) in &indexes {
                index.insert(&mut txn, nid, doc.get_field(field)).await.unwrap();
            }
        }
        txn.commit().await.unwrap();
        (storage, indexes)
    }

    fn nids(m: &Match) -> Vec<u64> {
        let mut out: Vec<u64> = m.to_vec().into_iter().map(|n| n.value()).collect();
        out.sort();
        out
    }

    #[tokio::test]
    async fn boolean_occurrences() {
        let (storage, indexes) = fixture().await;
        let txn = storage.begin(TransactionMode::ReadOnly).await.unwrap();
        let executor = QueryExecutor::new(&indexes);

        let must = Query::must(vec![Query::match_value("tag", "x"), Query::match_value("size", "1")]);
        let result = executor.execute(&txn, &must).await.unwrap();
        assert_eq!(nids(&result), vec![1]);
        assert_eq!(result.score(Nid(1)), Some(2.0));

        let should = Query::should(vec![Query::match_value("tag", "y"), Query::match_value("tag", "z")]);
        assert_eq!(nids(&executor.execute(&txn, &should).await.unwrap()), vec![1, 3]);

        // only "a" has both x and y
        let must_not = Query::must_not(vec![Query::match_value("tag", "x"), Query::match_value("tag", "y")]);
        assert_eq!(nids(&executor.execute(&txn, &must_not).await.unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn boost_scales_scores() {
        let (storage, indexes) = fixture().await;
        let txn = storage.begin(TransactionMode::ReadOnly).await.unwrap();
        let executor = QueryExecutor::new(&indexes);

        let result = executor
            .execute(&txn, &Query::boost(Query::exists("tag"), 2.5))
            .await
            .unwrap();
        assert_eq!(result.size(), 3);
        assert_eq!(result.score(Nid(2)), Some(2.5));
    }

    #[tokio::test]
    async fn rejects_unknown_field_and_empty_boolean() {
        let (storage, indexes) = fixture().await;
        let txn = storage.begin(TransactionMode::ReadOnly).await.unwrap();
        let executor = QueryExecutor::new(&indexes);

        let err = executor.execute(&txn, &Query::exists("missing")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownField);

        let err = executor.execute(&txn, &Query::should(vec![])).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn drops_postings_of_deleted_records() {
        let (storage, indexes) = fixture().await;
        let mut txn = storage.begin(TransactionMode::ReadWrite).await.unwrap();
        // record gone but postings left behind
        txn.delete_record(Nid(2)).await.unwrap();

        let executor = QueryExecutor::new(&indexes);
        let result = executor.execute(&txn, &Query::match_value("tag", "x")).await.unwrap();
        assert_eq!(nids(&result), vec![1]);
    }
}
