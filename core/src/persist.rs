use crate::memory::MemoryIndex;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, remove_file, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

/// File layout of a persisted index under one root directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    /// Sorted `<term> <docs offset>` lines.
    pub fn dictionary(&self) -> PathBuf { self.root.join("dictionary.txt") }
    /// One line of `<docID>:<positions offset>` tokens per term.
    pub fn docs(&self) -> PathBuf { self.root.join("docs.txt") }
    /// One line of ascending token offsets per (term, document).
    pub fn positions(&self) -> PathBuf { self.root.join("positions.txt") }
    /// `<docID> <filename> <wordCount>` lines.
    pub fn doc_info(&self) -> PathBuf { self.root.join("doc_info.txt") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Buffered writer that knows how many bytes it has accepted so far.
struct OffsetWriter {
    inner: BufWriter<File>,
    offset: u64,
}

impl OffsetWriter {
    fn create(path: &Path) -> io::Result<Self> {
        Ok(Self { inner: BufWriter::new(File::create(path)?), offset: 0 })
    }

    fn finish(mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Write for OffsetWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Serializes `index` under `paths`, truncating any previous index there.
///
/// Terms are visited once in sorted order. Each term's positions are
/// written first so their offsets are known when its docs line is written,
/// and the docs offset is captured before the dictionary line is emitted.
pub fn write_index(index: &MemoryIndex, paths: &IndexPaths) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    // A stale manifest must not vouch for half-rewritten files.
    match remove_file(paths.meta()) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    let mut dict = OffsetWriter::create(&paths.dictionary())?;
    let mut docs = OffsetWriter::create(&paths.docs())?;
    let mut positions = OffsetWriter::create(&paths.positions())?;

    let total = index.term_count();
    let mut line = String::new();
    for (i, (term, list)) in index.entries().enumerate() {
        writeln!(dict, "{term} {}", docs.offset)?;
        line.clear();
        for entry in list {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&format!("{}:{}", entry.doc_id, positions.offset));
            let joined = entry.positions.iter().map(u32::to_string).collect::<Vec<_>>().join(" ");
            writeln!(positions, "{joined}")?;
        }
        writeln!(docs, "{line}")?;
        if (i + 1) % 10_000 == 0 {
            tracing::info!(written = i + 1, total, "persisting postings");
        }
    }
    dict.finish()?;
    docs.finish()?;
    positions.finish()?;

    let mut doc_info = BufWriter::new(File::create(paths.doc_info())?);
    let mut num_docs = 0u32;
    for (doc_id, info) in index.docs() {
        writeln!(doc_info, "{doc_id} {} {}", info.filename, info.word_count)?;
        num_docs += 1;
    }
    doc_info.flush()?;

    let meta = MetaFile {
        num_docs,
        num_terms: total as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs, num_terms = total, "index persisted");
    Ok(meta)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version > FORMAT_VERSION {
        return Err(Error::malformed("meta.json", format!("unsupported format version {}", meta.version)));
    }
    Ok(meta)
}
