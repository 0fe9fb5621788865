use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Insert of an id that already has a live record
    AlreadyExists,
    /// Document or query field not declared in the schema
    UnknownField,
    UnsupportedQuery,
    /// A match references a nid whose record is gone
    RecordNotFound,
    Io,
    Parse,
    InvalidInput,
    InvalidState,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn already_exists(id: &str) -> Self {
        Error::new(ErrorKind::AlreadyExists, format!("Document '{}' already exists", id))
    }

    pub fn unknown_field(field: &str) -> Self {
        Error::new(ErrorKind::UnknownField, format!("Field '{}' not found in schema", field))
    }

    pub fn unsupported_query(kind: &str) -> Self {
        Error::new(ErrorKind::UnsupportedQuery, format!("Query type '{}' not supported", kind))
    }

    pub fn record_not_found(nid: u64) -> Self {
        Error::new(ErrorKind::RecordNotFound, format!("Record not found for nid {}", nid))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: format!("JSON error: {}", err),
        }
    }
}

impl From<lz4_flex::block::DecompressError> for Error {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: format!("Snapshot decompression failed: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
