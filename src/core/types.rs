use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;

/// Internal surrogate id, the join key between records and postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nid(pub u64);

impl Nid {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Nid {
    fn from(id: u64) -> Self {
        Nid(id)
    }
}

impl fmt::Display for Nid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hydrated field value: a scalar when the field holds exactly one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    pub fn from_values(values: &[String]) -> Self {
        match values {
            [] => FieldValue::Single(String::new()),
            [single] => FieldValue::Single(single.clone()),
            many => FieldValue::Multiple(many.to_vec()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Multiple(_) => None,
        }
    }
}

/// A document: unique id plus multi-valued string fields.
/// Absent fields are equivalent to an empty value list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Appends a value to a field, keeping earlier values.
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_field(name, value);
        self
    }

    pub fn with_values<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.fields
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn get_field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
