use crate::index::{DocId, Position};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

/// One document's occurrence record for a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingsEntry {
    pub doc_id: DocId,
    pub score: f64,
    pub positions: BTreeSet<Position>,
}

impl PostingsEntry {
    pub fn new(doc_id: DocId, score: f64) -> Self {
        Self { doc_id, score, positions: BTreeSet::new() }
    }

    pub fn term_frequency(&self) -> usize {
        self.positions.len()
    }
}

/// All postings for one term, keyed and iterated by ascending doc id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingsList {
    entries: BTreeMap<DocId, PostingsEntry>,
}

impl PostingsList {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Records `offset` for `doc_id`. The entry, and therefore its score, is
    /// created on first sight only; later calls just accumulate positions.
    pub fn add(&mut self, doc_id: DocId, score: f64, offset: Position) {
        self.entries
            .entry(doc_id)
            .or_insert_with(|| PostingsEntry::new(doc_id, score))
            .positions
            .insert(offset);
    }

    /// Doc-only entry without positions, for lookups that never need them.
    pub fn insert_doc(&mut self, doc_id: DocId, score: f64) {
        self.entries.entry(doc_id).or_insert_with(|| PostingsEntry::new(doc_id, score));
    }

    pub fn get(&self, doc_id: DocId) -> Option<&PostingsEntry> {
        self.entries.get(&doc_id)
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.entries.contains_key(&doc_id)
    }

    pub fn iter(&self) -> btree_map::Values<'_, DocId, PostingsEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, DocId, PostingsEntry> {
        self.entries.values_mut()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.entries.keys().copied()
    }

    /// Consumes the list, yielding entries by ascending doc id.
    pub fn into_entries(self) -> impl Iterator<Item = PostingsEntry> {
        self.entries.into_values()
    }

    fn push(&mut self, entry: PostingsEntry) {
        self.entries.insert(entry.doc_id, entry);
    }

    /// Sorted merge keeping every doc id of either side. Shared doc ids sum
    /// their scores and merge their positions.
    pub fn union(&self, other: &PostingsList) -> PostingsList {
        let mut out = PostingsList::new();
        let mut a = self.iter();
        let mut b = other.iter();
        let (mut x, mut y) = (a.next(), b.next());
        loop {
            match (x, y) {
                (Some(p1), Some(p2)) if p1.doc_id == p2.doc_id => {
                    let mut merged = p1.clone();
                    merged.score += p2.score;
                    merged.positions.extend(p2.positions.iter().copied());
                    out.push(merged);
                    x = a.next();
                    y = b.next();
                }
                (Some(p1), Some(p2)) if p1.doc_id < p2.doc_id => {
                    out.push(p1.clone());
                    x = a.next();
                }
                (Some(_), Some(p2)) => {
                    out.push(p2.clone());
                    y = b.next();
                }
                (Some(p1), None) => {
                    out.extend(std::iter::once(p1).chain(a).cloned());
                    break;
                }
                (None, Some(p2)) => {
                    out.extend(std::iter::once(p2).chain(b).cloned());
                    break;
                }
                (None, None) => break,
            }
        }
        out
    }

    /// Sorted merge keeping doc ids present on both sides. The left side's
    /// positions are kept and the two scores are summed, so repeated
    /// intersections accumulate evidence across terms.
    pub fn intersect(&self, other: &PostingsList) -> PostingsList {
        let mut out = PostingsList::new();
        merge_shared(self, other, |x, y| {
            let mut kept = x.clone();
            kept.score += y.score;
            out.push(kept);
        });
        out
    }

    /// Keeps a shared doc id when some position `p1` on the left has a
    /// position `p2` on the right with `p1 + k1 <= p2 <= p1 + k2`. The left
    /// entry is kept unchanged.
    pub fn intersect_window(&self, other: &PostingsList, k1: i64, k2: i64) -> PostingsList {
        let mut out = PostingsList::new();
        merge_shared(self, other, |x, y| {
            if positions_within(&x.positions, &y.positions, k1, k2) {
                out.push(x.clone());
            }
        });
        out
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingsEntry;
    type IntoIter = btree_map::Values<'a, DocId, PostingsEntry>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl Extend<PostingsEntry> for PostingsList {
    fn extend<I: IntoIterator<Item = PostingsEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}

impl FromIterator<PostingsEntry> for PostingsList {
    fn from_iter<I: IntoIterator<Item = PostingsEntry>>(iter: I) -> Self {
        let mut list = PostingsList::new();
        list.extend(iter);
        list
    }
}

/// Walks both lists in doc id order and calls `on_shared` for every doc id
/// they have in common. Stops as soon as either side runs out.
fn merge_shared<'a, F>(left: &'a PostingsList, right: &'a PostingsList, mut on_shared: F)
where
    F: FnMut(&'a PostingsEntry, &'a PostingsEntry),
{
    let mut a = left.iter();
    let mut b = right.iter();
    let (mut x, mut y) = (a.next(), b.next());
    while let (Some(p1), Some(p2)) = (x, y) {
        if p1.doc_id == p2.doc_id {
            on_shared(p1, p2);
            x = a.next();
            y = b.next();
        } else if p1.doc_id < p2.doc_id {
            x = a.next();
        } else {
            y = b.next();
        }
    }
}

/// Linear scan over two ascending position sets; stops at the first hit.
fn positions_within(left: &BTreeSet<Position>, right: &BTreeSet<Position>, k1: i64, k2: i64) -> bool {
    let mut a = left.iter().map(|&p| i64::from(p)).peekable();
    let mut b = right.iter().map(|&p| i64::from(p)).peekable();
    while let (Some(&p1), Some(&p2)) = (a.peek(), b.peek()) {
        let (lo, hi) = (p1 + k1, p1 + k2);
        if lo <= p2 && p2 <= hi {
            return true;
        }
        if p2 < lo {
            b.next();
        } else {
            a.next();
        }
    }
    false
}
