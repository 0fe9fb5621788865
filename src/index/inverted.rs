use std::collections::BTreeSet;
use crate::core::error::Result;
use crate::core::types::Nid;
use crate::index::boolean::BooleanIndex;
use crate::index::full_text::FullTextIndex;
use crate::index::integer::IntegerIndex;
use crate::index::key::IndexKey;
use crate::index::posting::Posting;
use crate::index::string::StringIndex;
use crate::schema::schema::FieldType;
use crate::search::matches::Match;
use crate::storage::StorageTransaction;

/// Per-field inverted index, one variant per field type.
///
/// Built once per schema field when the collection is created; every posting
/// it writes is keyed under the field's prefix.
pub enum InvertedIndex {
    String(StringIndex),
    Integer(IntegerIndex),
    FullText(FullTextIndex),
    Boolean(BooleanIndex),
}

impl InvertedIndex {
    pub fn new(field: &str, field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => InvertedIndex::String(StringIndex::new(field)),
            FieldType::Integer => InvertedIndex::Integer(IntegerIndex::new(field)),
            FieldType::FullText => InvertedIndex::FullText(FullTextIndex::new(field)),
            FieldType::Boolean => InvertedIndex::Boolean(BooleanIndex::new(field)),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            InvertedIndex::String(index) => &index.field,
            InvertedIndex::Integer(index) => &index.field,
            InvertedIndex::FullText(index) => &index.field,
            InvertedIndex::Boolean(index) => &index.field,
        }
    }

    /// Checks values before anything is written; only integer fields can
    /// reject input.
    pub fn validate(&self, values: &[String]) -> Result<()> {
        match self {
            InvertedIndex::Integer(index) => index.validate(values),
            _ => Ok(()),
        }
    }

    /// Indexes every value a document holds for this field.
    pub async fn insert<T: StorageTransaction>(&self, txn: &mut T, nid: Nid, values: &[String]) -> Result<()> {
        match self {
            InvertedIndex::String(index) => index.insert(txn, nid, values).await,
            InvertedIndex::Integer(index) => index.insert(txn, nid, values).await,
            InvertedIndex::FullText(index) => index.insert(txn, nid, values).await,
            InvertedIndex::Boolean(index) => index.insert(txn, nid, values).await,
        }
    }

    /// Documents whose values satisfy this field type's term semantics.
    pub async fn match_value<T: StorageTransaction>(&self, txn: &T, value: &str) -> Result<Match> {
        match self {
            InvertedIndex::String(index) => index.match_value(txn, value).await,
            InvertedIndex::Integer(index) => index.match_value(txn, value).await,
            InvertedIndex::FullText(index) => index.match_value(txn, value).await,
            InvertedIndex::Boolean(index) => index.match_value(txn, value).await,
        }
    }

    /// Every document holding at least one indexed value, score 1.
    pub async fn all<T: StorageTransaction>(&self, txn: &T) -> Result<Match> {
        match_prefix(txn, &IndexKey::field_prefix(self.field())).await
    }
}

/// Writes one posting per distinct key.
pub(crate) async fn insert_keys<T, I>(txn: &mut T, nid: Nid, keys: I) -> Result<()>
where
    T: StorageTransaction,
    I: IntoIterator<Item = IndexKey>,
{
    let distinct: BTreeSet<IndexKey> = keys.into_iter().collect();
    for key in distinct {
        txn.add_posting(Posting::new(nid, key)).await?;
    }
    Ok(())
}

/// Exact key lookup, every hit scored 1.
pub(crate) async fn match_key<T: StorageTransaction>(txn: &T, key: &IndexKey) -> Result<Match> {
    let nids: BTreeSet<Nid> = txn
        .postings_by_key(key)
        .await?
        .into_iter()
        .map(|posting| posting.nid)
        .collect();

    Ok(nids.into_iter().map(|nid| (nid, 1.0)).collect())
}

pub(crate) async fn match_prefix<T: StorageTransaction>(txn: &T, prefix: &IndexKey) -> Result<Match> {
    let nids: BTreeSet<Nid> = txn
        .postings_with_prefix(prefix)
        .await?
        .into_iter()
        .map(|posting| posting.nid)
        .collect();

    Ok(nids.into_iter().map(|nid| (nid, 1.0)).collect())
}
