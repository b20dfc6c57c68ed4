//! Token <-> term id mapping.
//!
//! Ids are dense in `[0, len)` and handed out in first-seen order, so a fixed
//! document order always yields the same vocabulary.

use crate::{Document, Error, Result, TermId};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    ids: HashMap<String, TermId>,
    tokens: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self { Self::default() }

    /// Walk every document once, interning tokens and encoding each document
    /// to term ids. Returns the finished vocabulary with the encoded corpus.
    pub fn build<S: AsRef<str>>(docs: &[Vec<S>]) -> Result<(Self, Vec<Document>)> {
        let mut vocab = Vocabulary::new();
        let mut encoded = Vec::with_capacity(docs.len());
        for doc in docs {
            let terms = doc.iter().map(|tok| vocab.intern(tok.as_ref())).collect::<Result<Vec<_>>>()?;
            encoded.push(Document::new(terms));
        }
        Ok((vocab, encoded))
    }

    /// Return the id for `token`, assigning the next free id if unseen.
    /// Fails once the id space of [`TermId`] is exhausted.
    pub fn intern(&mut self, token: &str) -> Result<TermId> {
        if let Some(&id) = self.ids.get(token) {
            return Ok(id);
        }
        let id = next_term_id(self.tokens.len())?;
        self.ids.insert(token.to_owned(), id);
        self.tokens.push(token.to_owned());
        Ok(id)
    }

    pub fn id_of(&self, token: &str) -> Option<TermId> {
        self.ids.get(token).copied()
    }

    /// Like [`id_of`](Self::id_of) but unseen tokens are an `UnknownTerm` error.
    pub fn resolve(&self, token: &str) -> Result<TermId> {
        self.id_of(token).ok_or_else(|| Error::UnknownTerm(token.to_owned()))
    }

    pub fn token_of(&self, id: TermId) -> Result<&str> {
        self.tokens
            .get(id as usize)
            .map(String::as_str)
            .ok_or_else(|| Error::term_out_of_range(id as usize, self.tokens.len()))
    }

    pub fn len(&self) -> usize { self.tokens.len() }

    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

    /// Tokens indexed by term id.
    pub fn tokens(&self) -> &[String] { &self.tokens }
}

fn next_term_id(len: usize) -> Result<TermId> {
    TermId::try_from(len)
        .map_err(|_| Error::invalid_configuration(format!("vocabulary exceeds {} distinct terms", TermId::MAX)))
}
