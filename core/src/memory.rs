use crate::index::{DocId, DocInfo, Index, Position, Terms};
use crate::persist::{write_index, IndexPaths};
use crate::postings::PostingsList;
use crate::scoring::tf_idf;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Inverted index accumulated in memory during the build pass.
///
/// Owns every postings list and the document table until it is persisted
/// with [`Index::cleanup`] or [`write_index`].
#[derive(Debug, Default)]
pub struct MemoryIndex {
    terms: BTreeMap<String, PostingsList>,
    docs: HashMap<DocId, DocInfo>,
    doc_order: Vec<DocId>,
    store: Option<IndexPaths>,
}

impl MemoryIndex {
    pub fn new() -> Self { Self::default() }

    /// Index that persists itself under `paths` on `cleanup`.
    pub fn with_store(paths: IndexPaths) -> Self {
        Self { store: Some(paths), ..Self::default() }
    }

    /// Records one occurrence of `token` at `offset` in `doc_id`.
    ///
    /// Tokens that are empty or contain whitespace cannot be written to the
    /// line-oriented files and are rejected without touching the index.
    pub fn insert(&mut self, token: &str, doc_id: DocId, offset: Position) -> Result<()> {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(Error::malformed("insert", format!("unusable token {token:?} for doc {doc_id}")));
        }
        if let Some(list) = self.terms.get_mut(token) {
            list.add(doc_id, 0.0, offset);
        } else {
            let mut list = PostingsList::new();
            list.add(doc_id, 0.0, offset);
            self.terms.insert(token.to_string(), list);
        }
        self.doc_entry(doc_id).word_count += 1;
        Ok(())
    }

    /// Attaches a filename label to `doc_id`, registering it if unseen.
    pub fn register_document(&mut self, doc_id: DocId, filename: &str) -> Result<()> {
        if filename.is_empty() || filename.trim() != filename || filename.contains(['\n', '\r']) {
            return Err(Error::malformed("register_document", format!("unusable filename {filename:?} for doc {doc_id}")));
        }
        self.doc_entry(doc_id).filename = filename.to_string();
        Ok(())
    }

    fn doc_entry(&mut self, doc_id: DocId) -> &mut DocInfo {
        let order = &mut self.doc_order;
        self.docs.entry(doc_id).or_insert_with(|| {
            order.push(doc_id);
            DocInfo { filename: doc_id.to_string(), word_count: 0 }
        })
    }

    /// Documents in the order they were first seen.
    pub fn docs(&self) -> impl Iterator<Item = (DocId, &DocInfo)> + '_ {
        self.doc_order.iter().filter_map(move |id| self.docs.get(id).map(|info| (*id, info)))
    }

    pub fn term_count(&self) -> usize { self.terms.len() }

    /// Stored postings in dictionary order, scores untouched.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PostingsList)> + '_ {
        self.terms.iter().map(|(term, list)| (term.as_str(), list))
    }

    fn doc_info(&self, doc_id: DocId) -> Result<&DocInfo> {
        self.docs.get(&doc_id).ok_or(Error::DocNotFound(doc_id))
    }
}

impl Index for MemoryIndex {
    fn postings(&self, term: &str, skip_positions: bool) -> Result<PostingsList> {
        let Some(stored) = self.terms.get(term) else {
            return Ok(PostingsList::new());
        };
        if skip_positions {
            let mut list = PostingsList::new();
            for doc_id in stored.doc_ids() {
                list.insert_doc(doc_id, 0.0);
            }
            return Ok(list);
        }
        let n = self.docs.len();
        let df = stored.len();
        let mut list = stored.clone();
        for entry in list.iter_mut() {
            let len = self.docs.get(&entry.doc_id).map_or(0, |d| d.word_count);
            entry.score = tf_idf(entry.term_frequency(), n, df, len);
        }
        Ok(list)
    }

    fn dictionary(&self) -> Result<Terms<'_>> {
        Ok(Box::new(self.terms.keys().cloned().map(Ok)))
    }

    fn doc_name(&self, doc_id: DocId) -> Result<String> {
        Ok(self.doc_info(doc_id)?.filename.clone())
    }

    fn doc_word_count(&self, doc_id: DocId) -> Result<u32> {
        Ok(self.doc_info(doc_id)?.word_count)
    }

    fn num_docs(&self) -> usize { self.docs.len() }

    fn cleanup(&mut self) -> Result<()> {
        match &self.store {
            Some(paths) => write_index(self, paths).map(|_| ()),
            None => Ok(()),
        }
    }
}
