use crate::core::error::Result;
use crate::core::types::Nid;
use crate::index::inverted::{insert_keys, match_key};
use crate::index::key::IndexKey;
use crate::search::matches::Match;
use crate::storage::StorageTransaction;

/// Exact-value index: one posting per distinct non-empty string.
pub struct StringIndex {
    pub field: String,
}

impl StringIndex {
    pub fn new(field: &str) -> Self {
        StringIndex { field: field.to_string() }
    }

    pub async fn insert<T: StorageTransaction>(&self, txn: &mut T, nid: Nid, values: &[String]) -> Result<()> {
        let keys = values
            .iter()
            .filter(|value| !value.is_empty())
            .map(|value| IndexKey::for_string(&self.field, value));
        insert_keys(txn, nid, keys).await
    }

    pub async fn match_value<T: StorageTransaction>(&self, txn: &T, value: &str) -> Result<Match> {
        match_key(txn, &IndexKey::for_string(&self.field, value)).await
    }
}
