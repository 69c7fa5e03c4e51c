use crate::postings::PostingsList;
use crate::Result;
use serde::{Deserialize, Serialize};

pub type DocId = u32;
pub type Position = u32;

/// Per-document metadata kept alongside the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocInfo {
    pub filename: String,
    /// Total token count, used as the document length when scoring.
    pub word_count: u32,
}

/// Lazily evaluated, restartable enumeration of the dictionary's terms.
pub type Terms<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Lookup contract shared by the in-memory and on-disk backends. The query
/// evaluator only ever talks to this trait.
pub trait Index: Send + Sync {
    /// Postings for `term`, or an empty list when the term is unknown.
    ///
    /// With `skip_positions` the entries carry doc ids only and a zero
    /// score; otherwise positions are filled and scores are tf-idf.
    fn postings(&self, term: &str, skip_positions: bool) -> Result<PostingsList>;

    /// All distinct terms in ascending byte order.
    fn dictionary(&self) -> Result<Terms<'_>>;

    fn doc_name(&self, doc_id: DocId) -> Result<String>;

    fn doc_word_count(&self, doc_id: DocId) -> Result<u32>;

    fn num_docs(&self) -> usize;

    /// Flushes in-memory state to disk. Backends with nothing to flush
    /// return immediately.
    fn cleanup(&mut self) -> Result<()>;
}
