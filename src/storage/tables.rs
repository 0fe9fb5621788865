use std::collections::{BTreeMap, BTreeSet, HashMap};
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};
use crate::core::types::{Document, Nid};
use crate::index::key::IndexKey;
use crate::index::posting::{Posting, PostingId};

/// The three logical tables plus their secondary indexes.
///
/// `records` is keyed by nid with a unique index on the document id;
/// `postings` is keyed by posting id with indexes on key and nid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    records: BTreeMap<Nid, Document>,
    record_ids: HashMap<String, Nid>,
    last_nid: u64,

    postings: BTreeMap<PostingId, Posting>,
    postings_by_key: BTreeMap<IndexKey, BTreeSet<PostingId>>,
    postings_by_nid: BTreeMap<Nid, BTreeSet<PostingId>>,
    last_posting: u64,

    metadata: BTreeMap<String, String>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, document: Document) -> Result<Nid> {
        if self.record_ids.contains_key(&document.id) {
            return Err(Error::already_exists(&document.id));
        }

        // nids are never reused, not even after clear()
        self.last_nid += 1;
        let nid = Nid(self.last_nid);
        self.record_ids.insert(document.id.clone(), nid);
        self.records.insert(nid, document);
        Ok(nid)
    }

    pub fn get_record(&self, nid: Nid) -> Option<&Document> {
        self.records.get(&nid)
    }

    pub fn record_nid(&self, id: &str) -> Option<Nid> {
        self.record_ids.get(id).copied()
    }

    pub fn contains_record(&self, nid: Nid) -> bool {
        self.records.contains_key(&nid)
    }

    pub fn record_nids(&self) -> Vec<Nid> {
        self.records.keys().copied().collect()
    }

    pub fn delete_record(&mut self, nid: Nid) -> Option<Document> {
        let document = self.records.remove(&nid)?;
        self.record_ids.remove(&document.id);
        Some(document)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn add_posting(&mut self, posting: Posting) -> PostingId {
        self.last_posting += 1;
        let id = PostingId(self.last_posting);

        self.postings_by_key
            .entry(posting.key.clone())
            .or_default()
            .insert(id);
        self.postings_by_nid
            .entry(posting.nid)
            .or_default()
            .insert(id);
        self.postings.insert(id, posting);
        id
    }

    pub fn postings_by_key(&self, key: &IndexKey) -> Vec<Posting> {
        self.postings_by_key
            .get(key)
            .map(|ids| self.collect_postings(ids))
            .unwrap_or_default()
    }

    pub fn postings_with_prefix(&self, prefix: &IndexKey) -> Vec<Posting> {
        self.postings_by_key
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .flat_map(|(_, ids)| self.collect_postings(ids))
            .collect()
    }

    pub fn posting_ids_by_nid(&self, nid: Nid) -> Vec<PostingId> {
        self.postings_by_nid
            .get(&nid)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn delete_posting(&mut self, id: PostingId) -> Option<Posting> {
        let posting = self.postings.remove(&id)?;

        if let Some(ids) = self.postings_by_key.get_mut(&posting.key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.postings_by_key.remove(&posting.key);
            }
        }
        if let Some(ids) = self.postings_by_nid.get_mut(&posting.nid) {
            ids.remove(&id);
            if ids.is_empty() {
                self.postings_by_nid.remove(&posting.nid);
            }
        }

        Some(posting)
    }

    pub fn posting_count(&self) -> usize {
        self.postings.len()
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn put_metadata(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.record_ids.clear();
        self.postings.clear();
        self.postings_by_key.clear();
        self.postings_by_nid.clear();
        self.metadata.clear();
    }

    fn collect_postings(&self, ids: &BTreeSet<PostingId>) -> Vec<Posting> {
        ids.iter()
            .filter_map(|id| self.postings.get(id).cloned())
            .collect()
    }
}
