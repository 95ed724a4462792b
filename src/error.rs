//! Error types for cfigen operations.

use thiserror::Error;

/// Errors raised while generating a CFI.
///
/// These are returned synchronously at the point of violation and carry
/// enough context to report the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CfiError {
    /// The node is absent or of the wrong kind for the requested operation.
    #[error("{message} (node: {node})")]
    NodeType { node: String, message: String },

    /// A character offset outside `[0, length]`.
    #[error("{message} (offset: {value}, bound: {bound})")]
    OutOfRange {
        value: i64,
        bound: i64,
        message: String,
    },

    /// No container-document entry matches the lookup key.
    #[error("no itemref references the content document {key:?}")]
    ReferenceNotFound { key: String },

    /// A required argument is missing.
    #[error("{0}")]
    Precondition(String),
}

/// Errors that can occur while reading documents or EPUB archives.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error(transparent)]
    Cfi(#[from] CfiError),
}

pub type Result<T> = std::result::Result<T, Error>;
