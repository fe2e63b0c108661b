use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed catalog: {0}")]
    MalformedCatalog(#[from] MalformedCatalogError),

    #[error("no face detected")]
    NoFaceDetected,

    #[error("ranking produced no displayable entries")]
    EmptyCatalogResult,

    #[error("confirmation prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Structural problem in the persisted catalog. Fatal for the whole load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedCatalogError {
    #[error("catalog is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("catalog root is not a list")]
    NotAList,

    #[error("group {group} is not a list")]
    GroupNotAList { group: usize },

    #[error("group {group} is empty")]
    EmptyGroup { group: usize },

    #[error("group {group}: final element is not a list of members")]
    MissingNestedList { group: usize },
}

/// One stored entry, or one of its embeddings, could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryDecodeError {
    #[error("expected [name, embedding, embedding], got {found}")]
    BadShape { found: String },

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("byte length {0} is not a multiple of 4")]
    Misaligned(usize),

    #[error("embedding is empty")]
    Empty,
}

/// An entry that could not be compared against the query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    VectorDimension { expected: usize, actual: usize },

    #[error("zero-magnitude vector")]
    ZeroMagnitude,

    #[error("no embedding stored for this category")]
    MissingEmbedding,
}
