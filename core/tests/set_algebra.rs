use posidx_core::{DocId, PostingsList};
use std::collections::BTreeSet;

struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn random_list(rng: &mut Lcg, universe: u64) -> PostingsList {
    let mut list = PostingsList::new();
    let docs = rng.next(universe);
    for _ in 0..docs {
        let doc = rng.next(universe) as DocId;
        let score = rng.next(1000) as f64 / 64.0;
        for _ in 0..=rng.next(4) {
            list.add(doc, score, rng.next(40) as u32);
        }
    }
    list
}

fn doc_set(list: &PostingsList) -> BTreeSet<DocId> {
    list.doc_ids().collect()
}

fn pairs() -> impl Iterator<Item = (PostingsList, PostingsList)> {
    let mut rng = Lcg(0x5eed);
    (0..300).map(move |i| {
        let universe = [1, 3, 20, 200][i % 4];
        (random_list(&mut rng, universe), random_list(&mut rng, universe))
    })
}

#[test]
fn union_covers_exactly_both_sides() {
    for (a, b) in pairs() {
        let expected: BTreeSet<DocId> = doc_set(&a).union(&doc_set(&b)).copied().collect();
        let u = a.union(&b);
        assert_eq!(u.len(), expected.len());
        assert_eq!(doc_set(&u), expected);
    }
}

#[test]
fn intersections_stay_within_both_sides() {
    for (a, b) in pairs() {
        let common: BTreeSet<DocId> = doc_set(&a).intersection(&doc_set(&b)).copied().collect();
        assert_eq!(doc_set(&a.intersect(&b)), common);
        assert!(doc_set(&a.intersect_window(&b, 1, 1)).is_subset(&common));
        assert!(doc_set(&a.intersect_window(&b, -3, 5)).is_subset(&common));
    }
}

#[test]
fn operators_commute_on_ids_and_scores() {
    for (a, b) in pairs() {
        for (x, y) in [(a.union(&b), b.union(&a)), (a.intersect(&b), b.intersect(&a))] {
            assert_eq!(doc_set(&x), doc_set(&y));
            for (ex, ey) in x.iter().zip(y.iter()) {
                assert!((ex.score - ey.score).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn window_agrees_with_brute_force() {
    for (a, b) in pairs() {
        for (k1, k2) in [(0, 0), (1, 1), (1, 3), (-2, 2)] {
            let got = doc_set(&a.intersect_window(&b, k1, k2));
            let expected: BTreeSet<DocId> = a
                .iter()
                .filter(|x| b.contains(x.doc_id))
                .filter(|x| {
                    b.get(x.doc_id).is_some_and(|y| {
                        x.positions.iter().any(|&p1| {
                            y.positions.iter().any(|&p2| {
                                let (p1, p2) = (i64::from(p1), i64::from(p2));
                                p1 + k1 <= p2 && p2 <= p1 + k2
                            })
                        })
                    })
                })
                .map(|x| x.doc_id)
                .collect();
            assert_eq!(got, expected, "window [{k1}, {k2}]");
        }
    }
}

#[test]
fn union_with_empty_is_identity() {
    for (a, _) in pairs().take(20) {
        assert_eq!(a.union(&PostingsList::new()), a);
        assert_eq!(PostingsList::new().union(&a), a);
    }
}
