use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Nid;
use crate::index::inverted::{insert_keys, match_key};
use crate::index::key::IndexKey;
use crate::search::matches::Match;
use crate::storage::StorageTransaction;

/// Exact-value index over values parsed as `i64`.
pub struct IntegerIndex {
    pub field: String,
}

impl IntegerIndex {
    pub fn new(field: &str) -> Self {
        IntegerIndex { field: field.to_string() }
    }

    /// Fails `InvalidInput` on the first value that is not an integer.
    pub fn validate(&self, values: &[String]) -> Result<()> {
        self.keys(values).map(|_| ())
    }

    pub async fn insert<T: StorageTransaction>(&self, txn: &mut T, nid: Nid, values: &[String]) -> Result<()> {
        let keys = self.keys(values)?;
        insert_keys(txn, nid, keys).await
    }

    fn keys(&self, values: &[String]) -> Result<Vec<IndexKey>> {
        values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .map(|value| {
                parse_integer(value)
                    .map(|parsed| IndexKey::for_integer(&self.field, parsed))
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidInput,
                            format!("Field '{}' expects an integer, got '{}'", self.field, value),
                        )
                    })
            })
            .collect()
    }

    /// A value that is not an integer can equal nothing: empty match.
    pub async fn match_value<T: StorageTransaction>(&self, txn: &T, value: &str) -> Result<Match> {
        match parse_integer(value) {
            Some(parsed) => match_key(txn, &IndexKey::for_integer(&self.field, parsed)).await,
            None => Ok(Match::new()),
        }
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_the_first_non_integer() {
        let index = IntegerIndex::new("size");
        assert!(index.validate(&["12".to_string(), " ".to_string(), "-3".to_string()]).is_ok());

        let err = index.validate(&["1".to_string(), "big".to_string()]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn parses_trimmed_signed_values() {
        assert_eq!(parse_integer(" -42 "), Some(-42));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("4.2"), None);
        assert_eq!(parse_integer("abc"), None);
    }
}
