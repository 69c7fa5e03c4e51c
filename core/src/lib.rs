//! Positional inverted index with a line-oriented on-disk format.
//!
//! A [`MemoryIndex`] is filled during a single build pass and persisted with
//! [`persist::write_index`]. A [`DiskIndex`] answers lookups from the
//! persisted files by bisecting the sorted dictionary file, and
//! [`query::search`] evaluates intersection, phrase and ranked queries
//! against either backend through the [`Index`] trait.

pub mod disk;
pub mod error;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod persist;
pub mod postings;
pub mod query;
pub mod scoring;
pub mod tokenizer;

pub use disk::DiskIndex;
pub use error::{Error, Result};
pub use index::{DocId, DocInfo, Index, Position};
pub use memory::MemoryIndex;
pub use persist::{IndexPaths, MetaFile};
pub use postings::{PostingsEntry, PostingsList};
pub use query::{search, search_at, QueryMode, SearchHit};
