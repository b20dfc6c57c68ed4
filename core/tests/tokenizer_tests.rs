use bm25_core::tokenizer::tokenize;
use bm25_core::Analyzer;

#[test]
fn it_normalizes_and_stems() {
    let words = tokenize("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Unicode normalization keeps the accented letter as one token
    assert!(words.iter().any(|w| w.starts_with("caf")));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn whitespace_analyzer_is_case_sensitive() {
    let words = Analyzer::Whitespace.tokenize("The the THE");
    assert_eq!(words, vec!["The", "the", "THE"]);
}
