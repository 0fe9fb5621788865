use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::ops::Range;
use crate::core::error::Result;
use crate::core::types::Nid;

/// Highlight ranges of one field, grouped by the index of the value they fall in
pub type FieldHighlights = BTreeMap<usize, Vec<Range<usize>>>;

/// Scored set of nids produced while evaluating one query.
///
/// Scores combine additively across `and`/`or`; highlight ranges are carried
/// along for every surviving nid.
#[derive(Debug, Clone, Default)]
pub struct Match {
    scores: HashMap<Nid, f32>,
    highlighters: HashMap<Nid, HashMap<String, FieldHighlights>>,
}

impl Match {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_score(&mut self, nid: Nid, score: f32) {
        *self.scores.entry(nid).or_insert(0.0) += score;
    }

    pub fn add_highlighter<I>(&mut self, nid: Nid, field: &str, index: usize, ranges: I)
    where
        I: IntoIterator<Item = Range<usize>>,
    {
        self.highlighters
            .entry(nid)
            .or_default()
            .entry(field.to_string())
            .or_default()
            .entry(index)
            .or_default()
            .extend(ranges);
    }

    /// Intersection; scores of surviving nids are summed.
    pub fn and(mut self, mut other: Match) -> Match {
        let mut result = Match::new();

        for (nid, score) in self.scores {
            if let Some(other_score) = other.scores.get(&nid) {
                result.scores.insert(nid, score + other_score);
                result.merge_highlighters_of(nid, &mut self.highlighters, &mut other.highlighters);
            }
        }

        result
    }

    /// Union; scores of nids present on both sides are summed.
    pub fn or(mut self, mut other: Match) -> Match {
        let mut result = Match::new();

        for (nid, score) in self.scores.drain().chain(other.scores.drain()) {
            *result.scores.entry(nid).or_insert(0.0) += score;
        }
        let nids: Vec<Nid> = result.scores.keys().copied().collect();
        for nid in nids {
            result.merge_highlighters_of(nid, &mut self.highlighters, &mut other.highlighters);
        }

        result
    }

    /// Every nid of `self` that is absent from `other`, scores unchanged.
    pub fn exclude(mut self, other: &Match) -> Match {
        self.scores.retain(|nid, _| !other.scores.contains_key(nid));
        let scores = &self.scores;
        self.highlighters.retain(|nid, _| scores.contains_key(nid));
        self
    }

    pub fn boost(mut self, factor: f32) -> Match {
        for score in self.scores.values_mut() {
            *score *= factor;
        }
        self
    }

    /// Nids by descending score, ties broken by ascending nid.
    pub fn to_vec(&self) -> Vec<Nid> {
        let mut ranked: Vec<(Nid, f32)> = self.scores.iter().map(|(n, s)| (*n, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().map(|(nid, _)| nid).collect()
    }

    pub fn size(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn contains(&self, nid: Nid) -> bool {
        self.scores.contains_key(&nid)
    }

    pub fn score(&self, nid: Nid) -> Option<f32> {
        self.scores.get(&nid).copied()
    }

    pub fn highlighters(&self, nid: Nid, field: &str) -> Option<&FieldHighlights> {
        self.highlighters.get(&nid)?.get(field)
    }

    /// Keeps only the nids for which `predicate` resolves to true.
    pub async fn async_filter<F, Fut>(mut self, mut predicate: F) -> Result<Match>
    where
        F: FnMut(Nid) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut rejected = Vec::new();
        for nid in self.scores.keys().copied().collect::<Vec<_>>() {
            if !predicate(nid).await? {
                rejected.push(nid);
            }
        }

        for nid in rejected {
            self.scores.remove(&nid);
            self.highlighters.remove(&nid);
        }
        Ok(self)
    }

    fn merge_highlighters_of(
        &mut self,
        nid: Nid,
        left: &mut HashMap<Nid, HashMap<String, FieldHighlights>>,
        right: &mut HashMap<Nid, HashMap<String, FieldHighlights>>,
    ) {
        for fields in [left.remove(&nid), right.remove(&nid)].into_iter().flatten() {
            for (field, values) in fields {
                for (index, ranges) in values {
                    self.add_highlighter(nid, &field, index, ranges);
                }
            }
        }
    }
}

impl FromIterator<(Nid, f32)> for Match {
    fn from_iter<I: IntoIterator<Item = (Nid, f32)>>(iter: I) -> Self {
        let mut result = Match::new();
        for (nid, score) in iter {
            result.add_score(nid, score);
        }
        result
    }
}
