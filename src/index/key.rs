use serde::{Serialize, Deserialize};

const FIELD_SEPARATOR: u8 = 0x00;

/// Lookup key of a posting: `field name ‖ 0x00 ‖ encoded value`.
///
/// All keys of one field share the field prefix, so an existence query is a
/// prefix scan over the key index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexKey(Vec<u8>);

impl IndexKey {
    /// The prefix shared by every key of `field`.
    pub fn field_prefix(field: &str) -> Self {
        let mut bytes = Vec::with_capacity(field.len() + 1);
        bytes.extend_from_slice(field.as_bytes());
        bytes.push(FIELD_SEPARATOR);
        IndexKey(bytes)
    }

    pub fn for_string(field: &str, value: &str) -> Self {
        Self::field_prefix(field).append(value.as_bytes())
    }

    /// Big-endian with the sign bit flipped, so byte order matches numeric order.
    pub fn for_integer(field: &str, value: i64) -> Self {
        let ordered = (value as u64) ^ (1 << 63);
        Self::field_prefix(field).append(&ordered.to_be_bytes())
    }

    pub fn for_boolean(field: &str, value: bool) -> Self {
        Self::field_prefix(field).append(&[value as u8])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &IndexKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    fn append(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}
