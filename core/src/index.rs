//! The index aggregate: vocabulary, frequency tables and idf in one place.

use crate::config::Bm25Params;
use crate::corpus::TokenizedDoc;
use crate::frequency::FrequencyIndex;
use crate::idf::{compute_idf, IdfTable};
use crate::query::{resolve_query, resolve_tokens, QueryTerm, UnknownTermPolicy};
use crate::scorer::Scorer;
use crate::vocab::Vocabulary;
use crate::{DocId, Document, Error, Result, TermId};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_docs: usize,
    pub vocab_size: usize,
    pub average_doc_length: f32,
    pub average_idf: f32,
    pub params: Bm25Params,
}

#[derive(Debug)]
enum State {
    Empty,
    Loaded(Vec<TokenizedDoc>),
    Built(BuiltIndex),
}

/// A BM25 index moving through `Empty -> Loaded -> Built`.
///
/// Statistics and scores are only available once [`build`](Self::build) has
/// run; before that every accessor returns [`Error::NotBuilt`].
#[derive(Debug)]
pub struct Bm25Index {
    params: Bm25Params,
    state: State,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self { params: Bm25Params::default(), state: State::Empty }
    }
}

impl Bm25Index {
    pub fn new(k1: f32, b: f32, epsilon: f32) -> Result<Self> {
        Self::with_params(Bm25Params::new(k1, b, epsilon))
    }

    pub fn with_params(params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, state: State::Empty })
    }

    /// Load and build in one step.
    pub fn from_documents(params: Bm25Params, docs: Vec<TokenizedDoc>, threads: usize) -> Result<Self> {
        let mut index = Self::with_params(params)?;
        index.load(docs)?;
        index.build(threads)?;
        Ok(index)
    }

    /// Append tokenized documents. Calls accumulate in order; nothing is
    /// counted until [`build`](Self::build).
    pub fn load<I>(&mut self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = TokenizedDoc>,
    {
        match &mut self.state {
            State::Built(_) => return Err(Error::AlreadyBuilt),
            State::Loaded(loaded) => {
                loaded.extend(docs);
                return Ok(());
            }
            State::Empty => {}
        }
        self.state = State::Loaded(docs.into_iter().collect());
        Ok(())
    }

    /// Build vocabulary, frequency tables and idf with `threads` workers.
    /// On error the loaded documents are kept and the call may be retried.
    pub fn build(&mut self, threads: usize) -> Result<()> {
        if threads == 0 {
            return Err(Error::invalid_configuration("thread count must be positive"));
        }
        let raw = match std::mem::replace(&mut self.state, State::Empty) {
            State::Loaded(raw) => raw,
            State::Empty => return Err(Error::NotLoaded),
            built @ State::Built(_) => {
                self.state = built;
                return Err(Error::AlreadyBuilt);
            }
        };
        match BuiltIndex::build(self.params, &raw, threads) {
            Ok(built) => {
                self.state = State::Built(built);
                Ok(())
            }
            Err(e) => {
                self.state = State::Loaded(raw);
                Err(e)
            }
        }
    }

    pub fn is_built(&self) -> bool { matches!(self.state, State::Built(_)) }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn built(&self) -> Result<&BuiltIndex> {
        match &self.state {
            State::Built(built) => Ok(built),
            _ => Err(Error::NotBuilt),
        }
    }

    /// Take the built tables out, e.g. to share them behind an `Arc`.
    pub fn into_built(self) -> Result<BuiltIndex> {
        match self.state {
            State::Built(built) => Ok(built),
            _ => Err(Error::NotBuilt),
        }
    }

    pub fn vocab_size(&self) -> Result<usize> { Ok(self.built()?.vocab.len()) }

    pub fn total_docs(&self) -> Result<usize> { Ok(self.built()?.documents.len()) }

    pub fn doc_length(&self, doc: usize) -> Result<u32> { self.built()?.doc_length(doc) }

    pub fn doc_freq(&self, term: TermId) -> Result<u32> { self.built()?.doc_freq(term) }

    pub fn term_freq(&self, doc: usize, term: TermId) -> Result<u32> { self.built()?.term_freq(doc, term) }

    pub fn idf(&self, term: TermId) -> Result<f32> { self.built()?.idf(term) }

    pub fn average_doc_length(&self) -> Result<f32> { Ok(self.built()?.freqs.average_doc_length()) }

    pub fn average_idf(&self) -> Result<f32> { Ok(self.built()?.idf.average()) }

    /// Token strings indexed by term id.
    pub fn vocabulary(&self) -> Result<&[String]> { Ok(self.built()?.vocab.tokens()) }

    pub fn term_id(&self, token: &str) -> Result<TermId> { self.built()?.vocab.resolve(token) }

    pub fn token(&self, term: TermId) -> Result<&str> { self.built()?.vocab.token_of(term) }

    pub fn stats(&self) -> Result<IndexStats> { Ok(self.built()?.stats()) }

    pub fn get_score(&self, query: &[TermId], doc: usize) -> Result<f32> { self.built()?.scorer().score(query, doc) }

    pub fn get_scores(&self, query: &[TermId]) -> Result<Vec<f32>> { Ok(self.built()?.scorer().score_all(query)) }

    pub fn get_batch_scores(&self, queries: &[Vec<TermId>]) -> Result<Vec<Vec<f32>>> {
        Ok(self.built()?.scorer().score_batch(queries))
    }

    pub fn top_k(&self, query: &[TermId], k: usize) -> Result<Vec<(DocId, f32)>> {
        Ok(self.built()?.scorer().top_k(query, k))
    }

    /// Score with string or id terms, resolved under `policy` first.
    pub fn get_score_terms(&self, query: &[QueryTerm], doc: usize, policy: UnknownTermPolicy) -> Result<f32> {
        let built = self.built()?;
        let ids = resolve_query(&built.vocab, query, policy)?;
        built.scorer().score(&ids, doc)
    }

    pub fn get_scores_terms(&self, query: &[QueryTerm], policy: UnknownTermPolicy) -> Result<Vec<f32>> {
        let built = self.built()?;
        let ids = resolve_query(&built.vocab, query, policy)?;
        Ok(built.scorer().score_all(&ids))
    }
}

/// The read-only tables of a built index. Shared freely across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltIndex {
    params: Bm25Params,
    vocab: Vocabulary,
    documents: Vec<Document>,
    freqs: FrequencyIndex,
    idf: IdfTable,
}

impl BuiltIndex {
    /// Vocabulary pass, then the sharded frequency pass, then idf.
    pub fn build(params: Bm25Params, raw: &[TokenizedDoc], threads: usize) -> Result<Self> {
        let _span = tracing::debug_span!("bm25_build", docs = raw.len(), threads).entered();
        let start = Instant::now();

        let (vocab, documents) = Vocabulary::build(raw)?;
        tracing::debug!(vocab_size = vocab.len(), "vocabulary built");

        let freqs = FrequencyIndex::build(&documents, vocab.len(), threads)?;
        let idf = compute_idf(freqs.doc_freqs(), documents.len(), params.epsilon);

        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "index built");
        Ok(Self { params, vocab, documents, freqs, idf })
    }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocab }

    pub fn frequencies(&self) -> &FrequencyIndex { &self.freqs }

    pub fn idf_table(&self) -> &IdfTable { &self.idf }

    pub fn scorer(&self) -> Scorer<'_> { Scorer::new(&self.freqs, &self.idf, self.params) }

    pub fn total_docs(&self) -> usize { self.documents.len() }

    pub fn document(&self, doc: usize) -> Result<&[TermId]> {
        self.documents
            .get(doc)
            .map(Document::terms)
            .ok_or_else(|| Error::doc_out_of_range(doc, self.documents.len()))
    }

    pub fn doc_length(&self, doc: usize) -> Result<u32> {
        self.freqs.doc_length(doc).ok_or_else(|| Error::doc_out_of_range(doc, self.freqs.num_docs()))
    }

    pub fn doc_freq(&self, term: TermId) -> Result<u32> {
        self.freqs.doc_freq(term).ok_or_else(|| Error::term_out_of_range(term as usize, self.vocab.len()))
    }

    pub fn term_freq(&self, doc: usize, term: TermId) -> Result<u32> {
        if term as usize >= self.vocab.len() {
            return Err(Error::term_out_of_range(term as usize, self.vocab.len()));
        }
        self.freqs.term_freq(doc, term).ok_or_else(|| Error::doc_out_of_range(doc, self.freqs.num_docs()))
    }

    pub fn idf(&self, term: TermId) -> Result<f32> {
        self.idf.get(term as usize).ok_or_else(|| Error::term_out_of_range(term as usize, self.vocab.len()))
    }

    /// Resolve token strings and score every document.
    pub fn score_tokens<S: AsRef<str>>(&self, tokens: &[S], policy: UnknownTermPolicy) -> Result<Vec<f32>> {
        let ids = resolve_tokens(&self.vocab, tokens, policy)?;
        Ok(self.scorer().score_all(&ids))
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_docs: self.documents.len(),
            vocab_size: self.vocab.len(),
            average_doc_length: self.freqs.average_doc_length(),
            average_idf: self.idf.average(),
            params: self.params,
        }
    }
}
