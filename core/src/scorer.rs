//! Okapi BM25 scoring over a built index.
//!
//! The scorer only reads the frequency and idf tables, so any number of
//! scorers can run at once against the same index.

use crate::config::Bm25Params;
use crate::frequency::FrequencyIndex;
use crate::idf::IdfTable;
use crate::{DocId, Error, Result, TermId};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    freqs: &'a FrequencyIndex,
    idf: &'a IdfTable,
    params: Bm25Params,
}

impl<'a> Scorer<'a> {
    pub fn new(freqs: &'a FrequencyIndex, idf: &'a IdfTable, params: Bm25Params) -> Self {
        Self { freqs, idf, params }
    }

    /// BM25 score of `doc` for `query`. Repeated query terms count once per
    /// occurrence; ids outside the vocabulary contribute nothing.
    pub fn score(&self, query: &[TermId], doc: usize) -> Result<f32> {
        if doc >= self.freqs.num_docs() {
            return Err(Error::doc_out_of_range(doc, self.freqs.num_docs()));
        }
        Ok(self.score_doc(query, doc))
    }

    /// One score per document, in corpus order.
    pub fn score_all(&self, query: &[TermId]) -> Vec<f32> {
        (0..self.freqs.num_docs())
            .into_par_iter()
            .map(|doc| self.score_doc(query, doc))
            .collect()
    }

    /// Score vectors for several queries at once.
    pub fn score_batch<Q: AsRef<[TermId]> + Sync>(&self, queries: &[Q]) -> Vec<Vec<f32>> {
        queries.par_iter().map(|q| self.score_all(q.as_ref())).collect()
    }

    /// The `k` highest scoring documents, best first. Ties go to the lower
    /// document id and zero scores are left out; negative scores (floored
    /// idf with a negative corpus average) still rank.
    pub fn top_k(&self, query: &[TermId], k: usize) -> Vec<(DocId, f32)> {
        rank(self.score_all(query), k)
    }

    fn score_doc(&self, query: &[TermId], doc: usize) -> f32 {
        let Some(tf) = self.freqs.term_freqs(doc) else {
            return 0.0;
        };
        let Bm25Params { k1, b, .. } = self.params;
        let dl = self.freqs.doc_length(doc).unwrap_or(0) as f32;
        let avgdl = self.freqs.average_doc_length();
        // constant across query terms for this document
        let length_norm = k1 * (1.0 - b + b * dl / avgdl);

        query.iter().fold(0.0f32, |acc, term| {
            let f = match tf.get(term) {
                Some(&f) if f > 0 => f as f32,
                _ => return acc,
            };
            let idf = self.idf.get(*term as usize).unwrap_or(0.0);
            acc + idf * (f * (k1 + 1.0)) / (f + length_norm)
        })
    }
}

/// Sort `(doc, score)` pairs best first, dropping zero scores and keeping `k`.
pub fn rank(scores: Vec<f32>, k: usize) -> Vec<(DocId, f32)> {
    let mut hits: Vec<(DocId, f32)> = scores
        .into_iter()
        .enumerate()
        .filter(|(_, s)| *s != 0.0)
        .map(|(doc, s)| (doc as DocId, s))
        .collect();
    hits.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idf::compute_idf;
    use crate::Document;

    fn tables(raw: &[&[TermId]], vocab: usize) -> (FrequencyIndex, IdfTable) {
        let docs: Vec<Document> = raw.iter().map(|d| Document::new(d.to_vec())).collect();
        let freqs = FrequencyIndex::build(&docs, vocab, 2).unwrap();
        let idf = compute_idf(freqs.doc_freqs(), docs.len(), 0.25);
        (freqs, idf)
    }

    #[test]
    fn higher_tf_scores_higher() {
        let (freqs, idf) = tables(&[&[0, 0, 0, 1], &[0, 1, 2, 3], &[2, 3], &[3, 3], &[1, 2]], 4);
        let scorer = Scorer::new(&freqs, &idf, Bm25Params::default());
        assert!(scorer.score(&[0], 0).unwrap() > scorer.score(&[0], 1).unwrap());
    }

    #[test]
    fn matches_formula() {
        let (freqs, idf) = tables(&[&[0, 1, 1], &[1, 2], &[2]], 3);
        let p = Bm25Params::default();
        let scorer = Scorer::new(&freqs, &idf, p);
        let avgdl = 2.0f32;
        let idf0 = idf.get(0).unwrap();
        let expected = idf0 * (1.0 * (p.k1 + 1.0)) / (1.0 + p.k1 * (1.0 - p.b + p.b * 3.0 / avgdl));
        assert!((scorer.score(&[0], 0).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn repeated_query_terms_add_up() {
        let (freqs, idf) = tables(&[&[0, 1], &[1, 2], &[2, 2]], 3);
        let scorer = Scorer::new(&freqs, &idf, Bm25Params::default());
        let once = scorer.score(&[0], 0).unwrap();
        let twice = scorer.score(&[0, 0], 0).unwrap();
        assert!((twice - 2.0 * once).abs() < 1e-6);
    }

    #[test]
    fn unknown_ids_and_empty_queries_score_zero() {
        let (freqs, idf) = tables(&[&[0, 1], &[1]], 2);
        let scorer = Scorer::new(&freqs, &idf, Bm25Params::default());
        assert_eq!(scorer.score(&[99], 0).unwrap(), 0.0);
        assert_eq!(scorer.score(&[], 1).unwrap(), 0.0);
        assert_eq!(scorer.score_all(&[]), vec![0.0, 0.0]);
    }

    #[test]
    fn doc_out_of_range() {
        let (freqs, idf) = tables(&[&[0]], 1);
        let scorer = Scorer::new(&freqs, &idf, Bm25Params::default());
        assert!(matches!(scorer.score(&[0], 1), Err(Error::OutOfRange { index: 1, len: 1, .. })));
    }

    #[test]
    fn score_all_agrees_with_score() {
        let (freqs, idf) = tables(&[&[0, 1, 2], &[2, 3], &[0, 0], &[], &[3, 1, 1]], 4);
        let scorer = Scorer::new(&freqs, &idf, Bm25Params::default());
        let query = [1, 3, 0, 7];
        let all = scorer.score_all(&query);
        for (doc, s) in all.iter().enumerate() {
            assert_eq!(*s, scorer.score(&query, doc).unwrap());
        }
        let batch = scorer.score_batch(&[vec![1, 3, 0, 7], vec![]]);
        assert_eq!(batch[0], all);
        assert!(batch[1].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn rank_orders_and_truncates() {
        let hits = rank(vec![0.5, 0.0, 2.0, 0.5, 1.0], 3);
        assert_eq!(hits, vec![(2, 2.0), (4, 1.0), (0, 0.5)]);
        assert!(rank(vec![0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn rank_keeps_negative_scores() {
        let hits = rank(vec![-0.25, 0.0, 1.0, -0.5], 10);
        assert_eq!(hits, vec![(2, 1.0), (0, -0.25), (3, -0.5)]);
    }

    #[test]
    fn top_k_returns_matches_under_negative_floor() {
        // the, cat, sat, dog, ran: average raw idf is negative, so "cat" is floored below zero
        let (freqs, idf) = tables(&[&[0, 1, 2], &[0, 3, 4], &[0, 1, 4]], 5);
        assert!(idf.average() < 0.0);
        let scorer = Scorer::new(&freqs, &idf, Bm25Params::default());
        let hits = scorer.top_k(&[1], 10);
        let docs: Vec<DocId> = hits.iter().map(|&(d, _)| d).collect();
        assert_eq!(docs, vec![0, 2]);
        assert!(hits.iter().all(|&(_, s)| s < 0.0));
    }
}
