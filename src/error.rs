use thiserror::Error;

use crate::editor::NodeId;
use crate::schema::SchemaKind;

/// Failure to read a persisted schema record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("schema record is not a map")]
    NotARecord,
    #[error("schema record has no `type` discriminator")]
    MissingType,
    #[error("schema record has no string `name`")]
    MissingName,
    #[error("unknown schema type `{0}`")]
    UnknownType(String),
    #[error("{kind} schema is missing required field `{field}`")]
    MissingField { kind: SchemaKind, field: &'static str },
    #[error("{kind} schema has an invalid `{field}`")]
    InvalidField { kind: SchemaKind, field: &'static str },
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("struct field `{name}`: {source}")]
    Field {
        name: String,
        #[source]
        source: Box<ParseError>,
    },
    #[error("array element type: {0}")]
    ElementType(#[source] Box<ParseError>),
}

/// Rejected path-addressed read or mutation. The value tree is untouched
/// whenever one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path key must be a string or an integer, got {0}")]
    InvalidKeyType(String),
    #[error("expected a map at depth {depth}")]
    NotAMap { depth: usize },
    #[error("expected a list at depth {depth}")]
    NotAList { depth: usize },
    #[error("no field `{name}` at depth {depth}")]
    MissingField { depth: usize, name: String },
    #[error("index {index} out of range for list of length {len} at depth {depth}")]
    IndexOutOfRange { depth: usize, index: usize, len: usize },
    #[error("invalid insert position {0}")]
    InvalidPosition(i64),
    #[error("append key at depth {depth} is only valid as the last key of a write")]
    MisplacedAppend { depth: usize },
    #[error("list already holds the maximum of {max} elements")]
    ArrayFull { max: u32 },
}

/// Rejected schema-editor operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no editor node {0:?}")]
    UnknownNode(NodeId),
    #[error("{op} is not supported by {kind} nodes")]
    UnsupportedKind { op: &'static str, kind: SchemaKind },
    #[error("node {0:?} has no field name")]
    Unnamed(NodeId),
    #[error("index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid pattern `{0}`")]
    InvalidPattern(String),
    #[error("{value} is not a valid {kind} bound")]
    InvalidBound { kind: SchemaKind, value: String },
    #[error("node {0:?} no longer addresses a schema slot")]
    Detached(NodeId),
}

/// Failure to load or store a resource dump on disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {message}")]
    Decode { path: String, message: String },
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
