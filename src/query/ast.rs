use serde::{Serialize, Deserialize};
use serde_json::Value;
use crate::core::error::{Error, ErrorKind, Result};

const QUERY_KINDS: [&str; 5] = ["match", "exists", "all", "boost", "boolean"];

/// Query tree evaluated against a collection.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"match","field":"title","match":"hello"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// Term/equality match on one field
    Match {
        field: String,
        #[serde(rename = "match")]
        value: String,
    },
    /// Documents holding any value for the field
    Exists { field: String },
    All,
    Boost { query: Box<Query>, boost: f32 },
    Boolean { occur: Occur, queries: Vec<Query> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    Must,        // Intersection of all subqueries
    Should,      // Union of all subqueries
    MustNot,     // Everything except documents matching every subquery
}

impl Query {
    pub fn match_value(field: &str, value: &str) -> Self {
        Query::Match {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn exists(field: &str) -> Self {
        Query::Exists { field: field.to_string() }
    }

    pub fn all() -> Self {
        Query::All
    }

    pub fn boost(query: Query, boost: f32) -> Self {
        Query::Boost {
            query: Box::new(query),
            boost,
        }
    }

    pub fn boolean(occur: Occur, queries: Vec<Query>) -> Self {
        Query::Boolean { occur, queries }
    }

    pub fn must(queries: Vec<Query>) -> Self {
        Self::boolean(Occur::Must, queries)
    }

    pub fn should(queries: Vec<Query>) -> Self {
        Self::boolean(Occur::Should, queries)
    }

    pub fn must_not(queries: Vec<Query>) -> Self {
        Self::boolean(Occur::MustNot, queries)
    }

    /// Parses a host-supplied query tree. Node kinds this engine does not know
    /// fail `UnsupportedQuery` rather than a generic parse error.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        check_kinds(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn check_kinds(node: &Value) -> Result<()> {
    let kind = node
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::new(ErrorKind::Parse, "Query node without a 'type'".to_string()))?;

    if !QUERY_KINDS.contains(&kind) {
        return Err(Error::unsupported_query(kind));
    }

    if let Some(inner) = node.get("query") {
        check_kinds(inner)?;
    }
    if let Some(Value::Array(children)) = node.get("queries") {
        for child in children {
            check_kinds(child)?;
        }
    }
    Ok(())
}
