use std::ops::Range;
use serde::{Serialize, Deserialize};

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub term: String,      // Lowercased term used as the lookup key
    pub start: usize,      // Byte offset in original text
    pub end: usize,        // Exclusive end byte offset in original text
}

impl Token {
    pub fn new(term: String, start: usize, end: usize) -> Self {
        Token { term, start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
