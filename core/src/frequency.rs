//! Term and document frequency tables.
//!
//! The corpus is cut into contiguous shards, one worker per shard. Each worker
//! owns the `tf` and `doc_length` slots of its own documents, so those writes
//! never overlap. Document frequencies are the only shared counters: every
//! worker returns its shard-local presence counts and they are summed into
//! `df` after all workers have joined.

use crate::{Document, Error, Result, TermId};
use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

/// Per-document term counts. Absent terms have frequency zero.
pub type TermFreqs = HashMap<TermId, u32>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrequencyIndex {
    term_freqs: Vec<TermFreqs>,
    doc_freqs: Vec<u32>,
    doc_lengths: Vec<u32>,
    avg_doc_length: f32,
}

/// Split `len` items into contiguous ranges of `len / shards` items, the last
/// range absorbing the remainder. There are never more ranges than items
/// (and always at least one), so any positive `shards` is safe.
pub fn shard_ranges(len: usize, shards: usize) -> Vec<Range<usize>> {
    if shards == 0 {
        return Vec::new();
    }
    let shards = shards.min(len.max(1));
    let base = len / shards;
    (0..shards)
        .map(|i| {
            let start = i * base;
            let end = if i + 1 == shards { len } else { start + base };
            start..end
        })
        .collect()
}

impl FrequencyIndex {
    /// Count `tf`, `df` and document lengths for `docs` using `threads` workers.
    ///
    /// The result does not depend on `threads`: each document is counted by
    /// exactly one worker and the `df` reduction is a plain sum.
    pub fn build(docs: &[Document], vocab_size: usize, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::invalid_configuration("thread count must be positive"));
        }
        let start = Instant::now();
        let n = docs.len();
        // counts below are stored as u32
        checked_u32(n, "document count")?;
        for doc in docs {
            checked_u32(doc.len(), "document length")?;
        }
        let mut term_freqs: Vec<TermFreqs> = vec![TermFreqs::new(); n];
        let mut doc_lengths: Vec<u32> = vec![0; n];
        let ranges = shard_ranges(n, threads);

        let mut shards = Vec::with_capacity(ranges.len());
        let mut tf_rest: &mut [TermFreqs] = &mut term_freqs;
        let mut len_rest: &mut [u32] = &mut doc_lengths;
        for range in ranges.iter().filter(|r| !r.is_empty()) {
            let (tf_shard, tf_tail) = std::mem::take(&mut tf_rest).split_at_mut(range.len());
            let (len_shard, len_tail) = std::mem::take(&mut len_rest).split_at_mut(range.len());
            tf_rest = tf_tail;
            len_rest = len_tail;
            shards.push((&docs[range.clone()], tf_shard, len_shard));
        }
        tracing::debug!(shards = shards.len(), threads, "counting shards");

        let partials: Vec<TermFreqs> = std::thread::scope(|s| {
            let handles: Vec<_> = shards
                .into_iter()
                .map(|(shard_docs, tf_shard, len_shard)| s.spawn(move || count_shard(shard_docs, tf_shard, len_shard)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        // single writer: all workers have joined
        let mut doc_freqs = vec![0u32; vocab_size];
        for presence in partials {
            for (term, count) in presence {
                let slot = doc_freqs
                    .get_mut(term as usize)
                    .ok_or_else(|| Error::term_out_of_range(term as usize, vocab_size))?;
                *slot += count;
            }
        }

        let total_len: u64 = doc_lengths.iter().map(|&l| l as u64).sum();
        let avg_doc_length = if n == 0 { 0.0 } else { (total_len as f64 / n as f64) as f32 };

        tracing::debug!(
            docs = n,
            vocab_size,
            threads,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "frequency pass complete"
        );
        Ok(Self { term_freqs, doc_freqs, doc_lengths, avg_doc_length })
    }

    pub fn num_docs(&self) -> usize { self.doc_lengths.len() }

    pub fn vocab_size(&self) -> usize { self.doc_freqs.len() }

    /// Occurrences of `term` in `doc`; `None` only when `doc` is out of range.
    pub fn term_freq(&self, doc: usize, term: TermId) -> Option<u32> {
        self.term_freqs.get(doc).map(|tf| tf.get(&term).copied().unwrap_or(0))
    }

    pub fn term_freqs(&self, doc: usize) -> Option<&TermFreqs> { self.term_freqs.get(doc) }

    pub fn doc_freq(&self, term: TermId) -> Option<u32> { self.doc_freqs.get(term as usize).copied() }

    pub fn doc_freqs(&self) -> &[u32] { &self.doc_freqs }

    pub fn doc_length(&self, doc: usize) -> Option<u32> { self.doc_lengths.get(doc).copied() }

    pub fn doc_lengths(&self) -> &[u32] { &self.doc_lengths }

    pub fn average_doc_length(&self) -> f32 { self.avg_doc_length }
}

fn checked_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid_configuration(format!("{what} {value} exceeds {}", u32::MAX)))
}

fn count_shard(docs: &[Document], tf_out: &mut [TermFreqs], len_out: &mut [u32]) -> TermFreqs {
    let mut presence = TermFreqs::new();
    for ((doc, tf), len) in docs.iter().zip(tf_out.iter_mut()).zip(len_out.iter_mut()) {
        *len = doc.len() as u32;
        let mut counts = TermFreqs::with_capacity(doc.len());
        for &term in doc.terms() {
            *counts.entry(term).or_insert(0) += 1;
        }
        for &term in counts.keys() {
            *presence.entry(term).or_insert(0) += 1;
        }
        *tf = counts;
    }
    presence
}
