use crate::index::{DocId, DocInfo, Index, Position, Terms};
use crate::persist::{load_meta, IndexPaths, MetaFile};
use crate::postings::PostingsList;
use crate::scoring::tf_idf;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

/// Bytes at the end of the dictionary checked before bisecting.
const TAIL_WINDOW: u64 = 100;
/// Bisection stops once the candidate range is narrower than this.
const MIN_SPAN: u64 = 50;
/// Padding on both sides of the final linear scan.
const SCAN_PAD: u64 = 100;
/// Lookups seek far more than they read, so keep refills small.
const LINE_BUF: usize = 512;

/// Line reader over a seekable source that tracks the byte offset of the
/// line it is about to read.
struct LineCursor<R> {
    reader: BufReader<R>,
    pos: u64,
    line: Vec<u8>,
}

impl<R: Read + Seek> LineCursor<R> {
    fn new(source: R) -> Self {
        Self { reader: BufReader::with_capacity(LINE_BUF, source), pos: 0, line: Vec::new() }
    }

    fn len(&mut self) -> io::Result<u64> {
        self.reader.seek(SeekFrom::End(0))
    }

    /// Moves to the first line starting at or after `at`.
    fn seek_line_start(&mut self, at: u64) -> io::Result<()> {
        if at == 0 {
            self.pos = self.reader.seek(SeekFrom::Start(0))?;
            return Ok(());
        }
        self.pos = self.reader.seek(SeekFrom::Start(at - 1))?;
        self.line.clear();
        self.pos += self.reader.read_until(b'\n', &mut self.line)? as u64;
        Ok(())
    }

    /// Reads the next line without its terminator; `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        if n == 0 {
            return Ok(None);
        }
        self.pos += n as u64;
        while matches!(self.line.last(), Some(b'\n' | b'\r')) {
            self.line.pop();
        }
        Ok(Some(self.line.as_slice()))
    }
}

fn line_key(line: &[u8]) -> &[u8] {
    let end = line.iter().position(u8::is_ascii_whitespace).unwrap_or(line.len());
    &line[..end]
}

/// Finds the dictionary line whose first field equals `term` in a file
/// sorted by term, without reading the whole file.
///
/// The tail of the file is scanned first, which also fixes the upper bound
/// for a byte-offset bisection over the rest. Bisection lands mid-line, so
/// every midpoint skips to the next line start before comparing. The final
/// narrow range is scanned linearly.
pub fn locate_term_line<R: Read + Seek>(term: &str, source: R) -> io::Result<Option<String>> {
    let target = term.as_bytes();
    let mut cursor = LineCursor::new(source);
    let len = cursor.len()?;

    cursor.seek_line_start(len.saturating_sub(TAIL_WINDOW))?;
    let mut hi = cursor.pos;
    while let Some(line) = cursor.next_line()? {
        if line_key(line) == target {
            return Ok(Some(String::from_utf8_lossy(line).into_owned()));
        }
    }

    let mut lo = 0u64;
    while hi - lo > MIN_SPAN {
        let mid = lo + (hi - lo) / 2;
        cursor.seek_line_start(mid)?;
        if cursor.pos >= hi {
            hi = mid;
            continue;
        }
        let Some(line) = cursor.next_line()? else {
            hi = mid;
            continue;
        };
        match line_key(line).cmp(target) {
            std::cmp::Ordering::Less => lo = mid,
            std::cmp::Ordering::Greater => hi = mid,
            std::cmp::Ordering::Equal => return Ok(Some(String::from_utf8_lossy(line).into_owned())),
        }
    }

    let end = (hi + SCAN_PAD).min(len);
    cursor.seek_line_start(lo.saturating_sub(SCAN_PAD))?;
    while cursor.pos < end {
        let Some(line) = cursor.next_line()? else { break };
        if line_key(line) == target {
            return Ok(Some(String::from_utf8_lossy(line).into_owned()));
        }
    }
    Ok(None)
}

fn parse_dictionary_line(line: &str) -> Result<u64> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(_), Some(offset), None) => offset
            .parse()
            .map_err(|_| Error::malformed("dictionary.txt", format!("bad docs offset in `{line}`"))),
        _ => Err(Error::malformed("dictionary.txt", format!("expected `<term> <offset>`, got `{line}`"))),
    }
}

fn parse_doc_ref(token: &str) -> Result<(DocId, u64)> {
    let bad = || Error::malformed("docs.txt", format!("expected `<docID>:<offset>`, got `{token}`"));
    let (doc, offset) = token.split_once(':').ok_or_else(bad)?;
    Ok((doc.parse().map_err(|_| bad())?, offset.parse().map_err(|_| bad())?))
}

fn parse_positions(line: &str) -> Result<Vec<Position>> {
    let positions = line
        .split_whitespace()
        .map(|p| p.parse().map_err(|_| Error::malformed("positions.txt", format!("bad position `{p}`"))))
        .collect::<Result<Vec<Position>>>()?;
    if positions.is_empty() {
        return Err(Error::malformed("positions.txt", "empty position line"));
    }
    Ok(positions)
}

fn parse_doc_info_line(line: &str) -> Result<(DocId, DocInfo)> {
    let bad = || Error::malformed("doc_info.txt", format!("expected `<docID> <filename> <wordCount>`, got `{line}`"));
    let (doc_id, rest) = line.split_once(' ').ok_or_else(bad)?;
    let (filename, count) = rest.rsplit_once(' ').ok_or_else(bad)?;
    if filename.is_empty() {
        return Err(bad());
    }
    let info = DocInfo { filename: filename.to_string(), word_count: count.parse().map_err(|_| bad())? };
    Ok((doc_id.parse().map_err(|_| bad())?, info))
}

fn read_line_at<R: BufRead + Seek>(reader: &mut R, offset: u64, buf: &mut String) -> io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    buf.clear();
    reader.read_line(buf)?;
    Ok(())
}

/// Read-only view of a persisted index.
///
/// Only document metadata is held in memory. Every lookup opens its own
/// file handles, so concurrent queries share nothing mutable.
#[derive(Debug)]
pub struct DiskIndex {
    paths: IndexPaths,
    meta: MetaFile,
    docs: HashMap<DocId, DocInfo>,
}

impl DiskIndex {
    pub fn open(paths: IndexPaths) -> Result<Self> {
        let meta = load_meta(&paths)?;
        let reader = BufReader::new(File::open(paths.doc_info())?);
        let mut docs = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (doc_id, info) = parse_doc_info_line(&line)?;
            docs.insert(doc_id, info);
        }
        if docs.len() != meta.num_docs as usize {
            tracing::warn!(manifest = meta.num_docs, doc_info = docs.len(), "document count mismatch, using doc_info");
        }
        tracing::info!(root = %paths.root.display(), num_docs = docs.len(), num_terms = meta.num_terms, "opened index");
        Ok(Self { paths, meta, docs })
    }

    pub fn meta(&self) -> &MetaFile { &self.meta }
}

impl Index for DiskIndex {
    fn postings(&self, term: &str, skip_positions: bool) -> Result<PostingsList> {
        let mut list = PostingsList::new();
        let Some(line) = locate_term_line(term, File::open(self.paths.dictionary())?)? else {
            tracing::debug!(term, "term not in dictionary");
            return Ok(list);
        };
        let docs_offset = parse_dictionary_line(&line)?;

        let mut buf = String::new();
        let mut docs = BufReader::new(File::open(self.paths.docs())?);
        read_line_at(&mut docs, docs_offset, &mut buf)?;
        let refs = buf.split_whitespace().map(parse_doc_ref).collect::<Result<Vec<_>>>()?;
        tracing::debug!(term, df = refs.len(), skip_positions, "postings lookup");

        if skip_positions {
            for (doc_id, _) in refs {
                list.insert_doc(doc_id, 0.0);
            }
            return Ok(list);
        }

        let n = self.docs.len();
        let df = refs.len();
        let mut positions_file = BufReader::new(File::open(self.paths.positions())?);
        for (doc_id, offset) in refs {
            read_line_at(&mut positions_file, offset, &mut buf)?;
            let positions = parse_positions(&buf)?;
            let len = self
                .docs
                .get(&doc_id)
                .map(|d| d.word_count)
                .ok_or_else(|| Error::malformed("doc_info.txt", format!("no entry for document {doc_id}")))?;
            let score = tf_idf(positions.len(), n, df, len);
            for p in positions {
                list.add(doc_id, score, p);
            }
        }
        Ok(list)
    }

    fn dictionary(&self) -> Result<Terms<'_>> {
        let reader = BufReader::new(File::open(self.paths.dictionary())?);
        let terms = reader.lines().filter_map(|line| match line {
            Ok(line) => line.split_whitespace().next().map(|t| Ok(t.to_string())),
            Err(e) => Some(Err(Error::Io(e))),
        });
        Ok(Box::new(terms))
    }

    fn doc_name(&self, doc_id: DocId) -> Result<String> {
        self.docs.get(&doc_id).map(|d| d.filename.clone()).ok_or(Error::DocNotFound(doc_id))
    }

    fn doc_word_count(&self, doc_id: DocId) -> Result<u32> {
        self.docs.get(&doc_id).map(|d| d.word_count).ok_or(Error::DocNotFound(doc_id))
    }

    fn num_docs(&self) -> usize { self.docs.len() }

    fn cleanup(&mut self) -> Result<()> { Ok(()) }
}
