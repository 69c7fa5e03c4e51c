//! Loads raw documents from disk and feeds them through a [`Tokenizer`]
//! into a [`MemoryIndex`].
//!
//! Accepted inputs are `.json` files (one object or an array of objects),
//! `.jsonl` files (one object per line) and `.txt` files (one document per
//! file, named by its path relative to the input root). Directories are
//! walked recursively. Doc ids are assigned sequentially from 0.

use crate::index::DocId;
use crate::memory::MemoryIndex;
use crate::tokenizer::Tokenizer;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub documents: u32,
    pub tokens: u64,
    pub rejected: u64,
}

pub struct Ingestor<'a> {
    index: &'a mut MemoryIndex,
    tokenizer: Tokenizer,
    next_doc_id: DocId,
    stats: IngestStats,
}

impl<'a> Ingestor<'a> {
    pub fn new(index: &'a mut MemoryIndex, tokenizer: Tokenizer) -> Self {
        Self { index, tokenizer, next_doc_id: 0, stats: IngestStats::default() }
    }

    pub fn stats(&self) -> IngestStats { self.stats }

    /// Indexes one document and returns its doc id.
    ///
    /// Tokens the index rejects are logged and skipped; the rest of the
    /// document is still indexed.
    pub fn add_document(&mut self, name: &str, text: &str) -> DocId {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;
        self.stats.documents += 1;
        if let Err(e) = self.index.register_document(doc_id, name) {
            tracing::warn!(doc_id, error = %e, "keeping numeric document name");
        }
        for (term, offset) in self.tokenizer.tokenize(text) {
            match self.index.insert(&term, doc_id, offset) {
                Ok(()) => self.stats.tokens += 1,
                Err(e) => {
                    self.stats.rejected += 1;
                    tracing::warn!(doc_id, offset, error = %e, "token rejected");
                }
            }
        }
        doc_id
    }

    /// Indexes a file, or every supported file below a directory.
    pub fn add_path(&mut self, input: &Path) -> Result<IngestStats> {
        let mut files: Vec<PathBuf> = Vec::new();
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && supported(p) {
                    files.push(p.to_path_buf());
                }
            }
        } else if input.is_file() {
            files.push(input.to_path_buf());
        } else {
            anyhow::bail!("input path {} does not exist", input.display());
        }

        for file in files {
            let base = if input.is_dir() { input } else { input.parent().unwrap_or(input) };
            match extension(&file) {
                Some("jsonl") => self.add_jsonl(&file)?,
                Some("json") => self.add_json(&file)?,
                _ => {
                    let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
                    let name = file.strip_prefix(base).unwrap_or(&file).to_string_lossy().into_owned();
                    self.add_document(&name, &text);
                }
            }
        }
        tracing::info!(documents = self.stats.documents, tokens = self.stats.tokens, rejected = self.stats.rejected, "ingested documents");
        Ok(self.stats)
    }

    fn add_jsonl(&mut self, file: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(file)?);
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            match serde_json::from_str::<InputDoc>(&line) {
                Ok(doc) => { self.add_document(&doc.id, &doc.body); }
                Err(e) => tracing::warn!(file = %file.display(), line = n + 1, error = %e, "skipping malformed document"),
            }
        }
        Ok(())
    }

    fn add_json(&mut self, file: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(file)?);
        let json: serde_json::Value = serde_json::from_reader(reader)
            .with_context(|| format!("parsing {}", file.display()))?;
        let values = match json {
            serde_json::Value::Array(arr) => arr,
            obj @ serde_json::Value::Object(_) => vec![obj],
            _ => Vec::new(),
        };
        for v in values {
            match serde_json::from_value::<InputDoc>(v) {
                Ok(doc) => { self.add_document(&doc.id, &doc.body); }
                Err(e) => tracing::warn!(file = %file.display(), error = %e, "skipping malformed document"),
            }
        }
        Ok(())
    }
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn supported(p: &Path) -> bool {
    matches!(extension(p), Some("json" | "jsonl" | "txt"))
}

/// Builds an in-memory index from `input` in one pass.
pub fn build_from_path(input: &Path, tokenizer: Tokenizer) -> Result<(MemoryIndex, IngestStats)> {
    let mut index = MemoryIndex::new();
    let stats = Ingestor::new(&mut index, tokenizer).add_path(input)?;
    Ok((index, stats))
}
