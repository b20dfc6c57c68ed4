//! Translating caller-supplied query terms into term ids.
//!
//! The scorer only understands [`TermId`]s. Hosts that accept token strings
//! resolve them here first and choose what an unknown token means.

use crate::vocab::Vocabulary;
use crate::{Result, TermId};
use serde::{Deserialize, Serialize};

/// A query term as a caller may supply it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryTerm {
    Id(TermId),
    Token(String),
}

impl From<TermId> for QueryTerm {
    fn from(id: TermId) -> Self { QueryTerm::Id(id) }
}

impl From<&str> for QueryTerm {
    fn from(token: &str) -> Self { QueryTerm::Token(token.to_owned()) }
}

impl From<String> for QueryTerm {
    fn from(token: String) -> Self { QueryTerm::Token(token) }
}

/// What to do with a token that has no vocabulary entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTermPolicy {
    /// Fail with `UnknownTerm` before any scoring happens.
    #[default]
    Reject,
    /// Drop the token; it would have contributed nothing anyway.
    Skip,
}

/// Resolve terms in order. `Id`s pass through untouched, including ids the
/// vocabulary has never issued.
pub fn resolve_query(vocab: &Vocabulary, terms: &[QueryTerm], policy: UnknownTermPolicy) -> Result<Vec<TermId>> {
    let mut ids = Vec::with_capacity(terms.len());
    for term in terms {
        match term {
            QueryTerm::Id(id) => ids.push(*id),
            QueryTerm::Token(token) => {
                if let Some(id) = resolve_token(vocab, token, policy)? {
                    ids.push(id);
                }
            }
        }
    }
    Ok(ids)
}

pub fn resolve_tokens<S: AsRef<str>>(vocab: &Vocabulary, tokens: &[S], policy: UnknownTermPolicy) -> Result<Vec<TermId>> {
    let mut ids = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(id) = resolve_token(vocab, token.as_ref(), policy)? {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn resolve_token(vocab: &Vocabulary, token: &str, policy: UnknownTermPolicy) -> Result<Option<TermId>> {
    match policy {
        UnknownTermPolicy::Reject => vocab.resolve(token).map(Some),
        UnknownTermPolicy::Skip => Ok(vocab.id_of(token)),
    }
}
