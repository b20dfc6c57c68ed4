//! Line-oriented corpus loading: one document per line.

use crate::tokenizer::Analyzer;
use crate::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A document as produced by a loader, before vocabulary encoding.
pub type TokenizedDoc = Vec<String>;

/// Read one document per line. Empty lines are empty documents; a trailing
/// newline at end of input does not start another one.
pub fn load_from_reader<R: BufRead>(reader: R, analyzer: Analyzer) -> Result<Vec<TokenizedDoc>> {
    let mut docs = Vec::new();
    for line in reader.lines() {
        docs.push(analyzer.tokenize(&line?));
    }
    Ok(docs)
}

pub fn load_from_file<P: AsRef<Path>>(path: P, analyzer: Analyzer) -> Result<Vec<TokenizedDoc>> {
    let path = path.as_ref();
    let f = File::open(path)?;
    let docs = load_from_reader(BufReader::new(f), analyzer)?;
    tracing::debug!(path = %path.display(), docs = docs.len(), "loaded corpus file");
    Ok(docs)
}

pub fn load_from_str(text: &str, analyzer: Analyzer) -> Vec<TokenizedDoc> {
    text.lines().map(|line| analyzer.tokenize(line)).collect()
}
