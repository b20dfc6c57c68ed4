//! Inverse document frequency with an epsilon floor.
//!
//! `idf(t) = ln((N - df + 0.5) / (df + 0.5))` goes to zero or below for terms
//! present in at least half the corpus. Those terms are scored with
//! `epsilon * average_idf` instead, where the average is taken over the raw,
//! unclipped values of every term.

use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IdfTable {
    raw: Vec<f32>,
    effective: Vec<f32>,
    average: f32,
}

impl IdfTable {
    /// The idf used at scoring time, floor applied.
    pub fn get(&self, term: usize) -> Option<f32> { self.effective.get(term).copied() }

    pub fn raw(&self, term: usize) -> Option<f32> { self.raw.get(term).copied() }

    pub fn values(&self) -> &[f32] { &self.effective }

    /// Mean of the raw idf over all terms.
    pub fn average(&self) -> f32 { self.average }

    pub fn len(&self) -> usize { self.effective.len() }

    pub fn is_empty(&self) -> bool { self.effective.is_empty() }
}

pub fn raw_idf(doc_freq: u32, total_docs: usize) -> f64 {
    let df = doc_freq as f64;
    let n = total_docs as f64;
    ((n - df + 0.5) / (df + 0.5)).ln()
}

pub fn compute_idf(doc_freqs: &[u32], total_docs: usize, epsilon: f32) -> IdfTable {
    let raw: Vec<f64> = doc_freqs.iter().map(|&df| raw_idf(df, total_docs)).collect();
    let average = if raw.is_empty() { 0.0 } else { raw.iter().sum::<f64>() / raw.len() as f64 };
    let floor = epsilon as f64 * average;

    let mut clipped = 0usize;
    let effective: Vec<f32> = raw
        .iter()
        .map(|&idf| {
            if idf <= 0.0 {
                clipped += 1;
                floor as f32
            } else {
                idf as f32
            }
        })
        .collect();
    tracing::debug!(terms = raw.len(), clipped, average_idf = average, "idf computed");

    IdfTable {
        raw: raw.into_iter().map(|v| v as f32).collect(),
        effective,
        average: average as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rare_terms_keep_raw_idf() {
        let table = compute_idf(&[1], 10, 0.25);
        let expected = (9.5f64 / 1.5).ln() as f32;
        assert_eq!(table.get(0), Some(expected));
        assert_eq!(table.raw(0), Some(expected));
    }

    #[test]
    fn common_terms_are_floored_from_raw_average() {
        // N = 3: df 3 -> ln(0.5/3.5) < 0, df 2 -> ln(1.5/2.5) < 0, df 1 -> ln(2.5/1.5) > 0
        let table = compute_idf(&[3, 2, 1], 3, 0.25);
        let raws = [(0.5f64 / 3.5).ln(), (1.5f64 / 2.5).ln(), (2.5f64 / 1.5).ln()];
        let avg = raws.iter().sum::<f64>() / 3.0;
        assert!((table.average() as f64 - avg).abs() < 1e-6);
        let floor = (0.25 * avg) as f32;
        assert_eq!(table.get(0), Some(floor));
        assert_eq!(table.get(1), Some(floor));
        assert_eq!(table.get(2), Some(raws[2] as f32));
        assert!(table.raw(0).unwrap() < 0.0);
    }

    #[test]
    fn zero_idf_is_clipped() {
        // N = 2, df = 1 -> ln(1.5 / 1.5) == 0
        let table = compute_idf(&[1, 0], 2, 0.5);
        assert_eq!(table.raw(0), Some(0.0));
        let avg = (0.0 + (2.5f64 / 0.5).ln()) / 2.0;
        assert_eq!(table.get(0), Some((0.5 * avg) as f32));
    }

    #[test]
    fn empty_vocabulary() {
        let table = compute_idf(&[], 0, 0.25);
        assert!(table.is_empty());
        assert_eq!(table.average(), 0.0);
    }
}
