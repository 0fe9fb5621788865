use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::core::types::FieldValue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl PaginationOptions {
    pub fn new(skip: usize, limit: usize) -> Self {
        PaginationOptions {
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    /// Concrete `(skip, limit)` with `default_limit` filling a missing limit.
    pub fn resolve(&self, default_limit: usize) -> (usize, usize) {
        (self.skip.unwrap_or(0), self.limit.unwrap_or(default_limit))
    }
}

/// Field to excerpt, with the markers wrapped around each match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRequest {
    pub field: String,
    pub before: String,
    pub end: String,
}

impl HighlightRequest {
    pub fn new(field: &str, before: &str, end: &str) -> Self {
        HighlightRequest {
            field: field.to_string(),
            before: before.to_string(),
            end: end.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(default)]
    pub pagination: PaginationOptions,
    pub fields: Option<Vec<String>>,
    pub highlights: Option<Vec<HighlightRequest>>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paginate(mut self, skip: usize, limit: usize) -> Self {
        self.pagination = PaginationOptions::new(skip, limit);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_highlight(mut self, field: &str, before: &str, end: &str) -> Self {
        self.highlights
            .get_or_insert_with(Vec::new)
            .push(HighlightRequest::new(field, before, end));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    /// Total before slicing
    pub count: usize,
    pub has_more: bool,
    pub limit: usize,
    pub skip: usize,
}

impl PaginationInfo {
    pub fn new(count: usize, skip: usize, limit: usize) -> Self {
        PaginationInfo {
            count,
            has_more: count > skip.saturating_add(limit),
            limit,
            skip,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNode {
    pub id: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub pagination: PaginationInfo,
    pub nodes: Vec<SearchNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    #[serde(default)]
    pub pagination: PaginationOptions,
    /// Per-bucket sample of hydrated nodes; omitted when `None`
    pub hits: Option<SearchOptions>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paginate(mut self, skip: usize, limit: usize) -> Self {
        self.pagination = PaginationOptions::new(skip, limit);
        self
    }

    pub fn with_hits(mut self, hits: SearchOptions) -> Self {
        self.hits = Some(hits);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: String,
    pub score: f32,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits: Option<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub buckets: Vec<Bucket>,
    pub pagination: PaginationInfo,
}
