use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use crate::analysis::tokenizer::{GeneralTokenizer, Tokenizer};
use crate::core::error::Result;
use crate::core::types::Nid;
use crate::index::key::IndexKey;
use crate::index::posting::{Posting, PostingPosition};
use crate::search::matches::Match;
use crate::storage::StorageTransaction;

/// Tokenized text index.
///
/// Each value is tokenized separately; a posting is written per distinct
/// term per value and remembers where every occurrence sits, which is what
/// highlighting reads back. A document whose text yields no terms at all
/// still gets one bare posting under the field prefix, so presence scans
/// find it while term lookups never do.
pub struct FullTextIndex {
    pub field: String,
    tokenizer: Box<dyn Tokenizer>,
}

impl FullTextIndex {
    pub fn new(field: &str) -> Self {
        Self::with_tokenizer(field, Box::new(GeneralTokenizer))
    }

    pub fn with_tokenizer(field: &str, tokenizer: Box<dyn Tokenizer>) -> Self {
        FullTextIndex {
            field: field.to_string(),
            tokenizer,
        }
    }

    pub async fn insert<T: StorageTransaction>(&self, txn: &mut T, nid: Nid, values: &[String]) -> Result<()> {
        let mut indexed_terms = false;
        for (index, value) in values.iter().enumerate() {
            let mut occurrences: BTreeMap<String, Vec<Range<usize>>> = BTreeMap::new();
            for token in self.tokenizer.tokenize(value) {
                let range = token.range();
                occurrences.entry(token.term).or_default().push(range);
            }

            for (term, ranges) in occurrences {
                let posting = Posting::new(nid, IndexKey::for_string(&self.field, &term))
                    .with_position(PostingPosition {
                        index,
                        length: value.len(),
                        ranges,
                    });
                txn.add_posting(posting).await?;
                indexed_terms = true;
            }
        }

        if !indexed_terms && values.iter().any(|value| !value.is_empty()) {
            txn.add_posting(Posting::new(nid, IndexKey::field_prefix(&self.field))).await?;
        }
        Ok(())
    }

    /// Documents containing any query term; each distinct term found adds 1
    /// to the document's score.
    pub async fn match_value<T: StorageTransaction>(&self, txn: &T, value: &str) -> Result<Match> {
        let terms: BTreeSet<String> = self
            .tokenizer
            .tokenize(value)
            .into_iter()
            .map(|token| token.term)
            .collect();

        let mut result = Match::new();
        for term in terms {
            let postings = txn
                .postings_by_key(&IndexKey::for_string(&self.field, &term))
                .await?;

            let mut scored = BTreeSet::new();
            for posting in postings {
                if scored.insert(posting.nid) {
                    result.add_score(posting.nid, 1.0);
                }
                if let Some(position) = posting.position {
                    // ranges past the recorded value length cannot be sliced
                    let length = position.length;
                    let ranges = position.ranges.into_iter().filter(|r| r.end <= length);
                    result.add_highlighter(posting.nid, &self.field, position.index, ranges);
                }
            }
        }

        tracing::trace!("Full-text match on '{}' hit {} documents", self.field, result.size());
        Ok(result)
    }
}
