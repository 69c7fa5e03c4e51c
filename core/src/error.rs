use crate::index::DocId;
use thiserror::Error;

/// Errors raised by index construction, persistence and lookup.
///
/// A term missing from the dictionary is not an error: lookups return an
/// empty postings list instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record in {file}: {detail}")]
    MalformedRecord { file: String, detail: String },

    #[error("document not found: {0}")]
    DocNotFound(DocId),

    #[error("unreadable index manifest: {0}")]
    Meta(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(file: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::MalformedRecord { file: file.into(), detail: detail.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::DocNotFound(_))
    }
}
