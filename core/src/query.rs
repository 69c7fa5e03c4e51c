use crate::index::{DocId, Index, Position};
use crate::postings::PostingsList;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Documents containing every term.
    #[default]
    Intersection,
    /// Documents containing the terms contiguously and in order.
    Phrase,
    /// Documents containing any term, by descending summed tf-idf.
    Ranked,
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intersection" | "and" => Ok(QueryMode::Intersection),
            "phrase" => Ok(QueryMode::Phrase),
            "ranked" => Ok(QueryMode::Ranked),
            other => Err(format!("unknown query mode `{other}`")),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryMode::Intersection => "intersection",
            QueryMode::Phrase => "phrase",
            QueryMode::Ranked => "ranked",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

/// Evaluates `terms` against `index`, taking consecutive terms as
/// adjacent words for phrase queries.
pub fn search<I, S>(index: &I, terms: &[S], mode: QueryMode) -> Result<Vec<SearchHit>>
where
    I: Index + ?Sized,
    S: AsRef<str>,
{
    let placed: Vec<(&str, Position)> = terms.iter().zip(0..).map(|(t, i)| (t.as_ref(), i)).collect();
    search_at(index, &placed, mode)
}

/// Evaluates `(term, offset)` pairs against `index`.
///
/// Postings are fetched term by term and folded left to right; an empty
/// query or an empty fold yields no hits. In phrase mode each term must sit
/// exactly its offset minus the first term's offset after the first term,
/// so tokenizer offsets that skip stopwords keep their gaps. Ranked hits
/// are ordered by descending score, ties by ascending doc id; the other
/// modes return doc id order.
pub fn search_at<I, S>(index: &I, terms: &[(S, Position)], mode: QueryMode) -> Result<Vec<SearchHit>>
where
    I: Index + ?Sized,
    S: AsRef<str>,
{
    let base = terms.first().map_or(0, |(_, at)| i64::from(*at));
    let mut acc: Option<PostingsList> = None;
    for (term, at) in terms {
        let term = term.as_ref();
        let next = index.postings(term, mode == QueryMode::Intersection)?;
        let gap = i64::from(*at) - base;
        acc = Some(match (acc, mode) {
            (None, _) => next,
            (Some(prev), QueryMode::Intersection) => prev.intersect(&next),
            (Some(prev), QueryMode::Phrase) => prev.intersect_window(&next, gap, gap),
            (Some(prev), QueryMode::Ranked) => prev.union(&next),
        });
        if mode != QueryMode::Ranked && acc.as_ref().is_some_and(PostingsList::is_empty) {
            tracing::debug!(term, %mode, "no documents left, stopping early");
            break;
        }
    }

    let mut hits: Vec<SearchHit> = acc
        .map(|list| list.into_entries().map(|e| SearchHit { doc_id: e.doc_id, score: e.score }).collect())
        .unwrap_or_default();
    if mode == QueryMode::Ranked {
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.doc_id.cmp(&b.doc_id)));
    }
    tracing::debug!(%mode, terms = terms.len(), hits = hits.len(), "query evaluated");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIndex;

    fn index(docs: &[(DocId, &str)]) -> MemoryIndex {
        let mut idx = MemoryIndex::new();
        for &(doc, text) in docs {
            for (pos, tok) in text.split_whitespace().enumerate() {
                idx.insert(tok, doc, pos as u32).unwrap();
            }
        }
        idx
    }

    fn ids(hits: &[SearchHit]) -> Vec<DocId> {
        hits.iter().map(|h| h.doc_id).collect()
    }

    #[test]
    fn phrase_needs_contiguous_order() {
        let idx = index(&[(1, "the cat sat"), (2, "the dog sat")]);
        assert_eq!(ids(&search(&idx, &["the", "cat"], QueryMode::Phrase).unwrap()), vec![1]);
        assert_eq!(ids(&search(&idx, &["the", "sat"], QueryMode::Phrase).unwrap()), Vec::<DocId>::new());
        assert_eq!(ids(&search(&idx, &["the", "cat", "sat"], QueryMode::Phrase).unwrap()), vec![1]);
        assert_eq!(ids(&search(&idx, &["cat", "the"], QueryMode::Phrase).unwrap()), Vec::<DocId>::new());
    }

    #[test]
    fn phrase_matches_later_occurrence() {
        let idx = index(&[(1, "a b x a c a b c")]);
        assert_eq!(ids(&search(&idx, &["a", "b", "c"], QueryMode::Phrase).unwrap()), vec![1]);
        assert!(search(&idx, &["b", "a", "b"], QueryMode::Phrase).unwrap().is_empty());
    }

    #[test]
    fn phrase_offsets_span_dropped_words() {
        // "the cat sat on the mat" with stopwords dropped at index time
        let mut idx = MemoryIndex::new();
        for (tok, pos) in [("cat", 1), ("sat", 2), ("mat", 5)] {
            idx.insert(tok, 1, pos).unwrap();
        }
        assert_eq!(ids(&search_at(&idx, &[("sat", 0), ("mat", 3)], QueryMode::Phrase).unwrap()), vec![1]);
        assert_eq!(ids(&search_at(&idx, &[("sat", 4), ("mat", 7)], QueryMode::Phrase).unwrap()), vec![1]);
        assert!(search_at(&idx, &[("cat", 0), ("mat", 1)], QueryMode::Phrase).unwrap().is_empty());
        assert!(search(&idx, &["sat", "mat"], QueryMode::Phrase).unwrap().is_empty());
    }

    #[test]
    fn intersection_keeps_common_documents() {
        let idx = index(&[(1, "red green"), (2, "green blue"), (3, "red blue green")]);
        assert_eq!(ids(&search(&idx, &["red", "green"], QueryMode::Intersection).unwrap()), vec![1, 3]);
        assert_eq!(ids(&search(&idx, &["red", "green", "blue"], QueryMode::Intersection).unwrap()), vec![3]);
    }

    #[test]
    fn empty_and_unmatched_queries_return_no_hits() {
        let idx = index(&[(1, "red green")]);
        let none: [&str; 0] = [];
        for mode in [QueryMode::Intersection, QueryMode::Phrase, QueryMode::Ranked] {
            assert!(search(&idx, &none, mode).unwrap().is_empty());
            assert!(search(&idx, &["purple"], mode).unwrap().is_empty());
        }
        assert!(search(&idx, &["purple", "red"], QueryMode::Intersection).unwrap().is_empty());
    }

    #[test]
    fn ranked_sums_across_terms_and_sorts_descending() {
        let idx = index(&[(1, "rust rust web"), (2, "web web web"), (3, "rust go"), (4, "go go go")]);
        let hits = search(&idx, &["rust", "web"], QueryMode::Ranked).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        // doc 1 matches both terms
        let idf = 2f64.ln();
        let d1 = hits.iter().find(|h| h.doc_id == 1).unwrap();
        assert!((d1.score - (2.0 * idf / 3.0 + idf / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn ranked_ties_are_both_present() {
        let idx = index(&[(1, "the cat sat"), (2, "the dog sat"), (3, "a b c")]);
        let hits = search(&idx, &["sat"], QueryMode::Ranked).unwrap();
        assert_eq!(ids(&hits), vec![1, 2]);
        assert_eq!(hits[0].score, hits[1].score);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in [QueryMode::Intersection, QueryMode::Phrase, QueryMode::Ranked] {
            assert_eq!(mode.to_string().parse::<QueryMode>().unwrap(), mode);
        }
        assert!("fuzzy".parse::<QueryMode>().is_err());
        assert_eq!("AND".parse::<QueryMode>().unwrap(), QueryMode::Intersection);
    }
}
