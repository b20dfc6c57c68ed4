//! Okapi BM25 relevance scoring over a fixed, in-memory corpus.
//!
//! A [`Bm25Index`] is created with its hyperparameters, loaded with tokenized
//! documents, built once, and then scored against any number of times:
//!
//! ```
//! use bm25_core::{Bm25Index, Bm25Params};
//!
//! let mut index = Bm25Index::with_params(Bm25Params::default()).unwrap();
//! index.load(vec![
//!     vec!["rust".to_string(), "is".to_string(), "fast".to_string()],
//!     vec!["python".to_string(), "is".to_string(), "easy".to_string()],
//!     vec!["go".to_string(), "is".to_string(), "simple".to_string()],
//! ]).unwrap();
//! index.build(2).unwrap();
//!
//! let rust = index.term_id("rust").unwrap();
//! let scores = index.get_scores(&[rust]).unwrap();
//! assert!(scores[0] > 0.0);
//! assert_eq!(scores[1], 0.0);
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod frequency;
pub mod idf;
pub mod index;
pub mod query;
pub mod scorer;
pub mod tokenizer;
pub mod vocab;

pub use config::Bm25Params;
pub use error::{Error, Result};
pub use index::{Bm25Index, BuiltIndex, IndexStats};
pub use query::{QueryTerm, UnknownTermPolicy};
pub use tokenizer::Analyzer;

pub type TermId = u32;
pub type DocId = u32;

/// A document in its encoded form: term ids in token order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
    terms: Vec<TermId>,
}

impl Document {
    pub fn new(terms: Vec<TermId>) -> Self { Self { terms } }

    pub fn terms(&self) -> &[TermId] { &self.terms }

    /// Token count.
    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}
