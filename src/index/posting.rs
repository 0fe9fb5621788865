use std::ops::Range;
use serde::{Serialize, Deserialize};
use crate::core::types::Nid;
use crate::index::key::IndexKey;

/// Primary key of a row in the postings table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostingId(pub u64);

/// Where a term sits inside a multi-valued field (kept for highlighting)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingPosition {
    pub index: usize,              // Index of the value within the field
    pub length: usize,             // Byte length of that value
    pub ranges: Vec<Range<usize>>, // Every occurrence of the term in the value
}

/// One row of the postings table: `key` points at document `nid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub nid: Nid,
    pub key: IndexKey,
    pub position: Option<PostingPosition>,
}

impl Posting {
    pub fn new(nid: Nid, key: IndexKey) -> Self {
        Posting { nid, key, position: None }
    }

    pub fn with_position(mut self, position: PostingPosition) -> Self {
        self.position = Some(position);
        self
    }
}
