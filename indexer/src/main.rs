use anyhow::{bail, Context, Result};
use bm25_core::corpus::{load_from_file, TokenizedDoc};
use bm25_core::{Analyzer, Bm25Index, Bm25Params, UnknownTermPolicy};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query an in-memory BM25 index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index repeatedly and report build times
    Build {
        #[command(flatten)]
        index: IndexArgs,
        /// Number of timed builds
        #[arg(long, default_value_t = 1)]
        iterations: usize,
    },
    /// Build once and score a query
    Query {
        #[command(flatten)]
        index: IndexArgs,
        /// Query text, tokenized with the corpus analyzer
        #[arg(long)]
        q: String,
        /// Number of hits to print
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Score a single document instead of ranking the corpus
        #[arg(long)]
        doc: Option<usize>,
        /// Drop query tokens missing from the vocabulary instead of failing
        #[arg(long, default_value_t = false)]
        skip_unknown: bool,
    },
}

#[derive(Args, Debug, Serialize)]
struct IndexArgs {
    /// Input path: a corpus file, or a directory of *.txt corpus files
    #[arg(long)]
    input: PathBuf,
    /// Worker threads for the frequency pass
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Tokenization applied to each line: whitespace or stemmed
    #[arg(long, default_value = "whitespace")]
    analyzer: Analyzer,
    /// JSON file with k1 / b / epsilon; flags below take precedence
    #[arg(long)]
    params: Option<PathBuf>,
    #[arg(long)]
    k1: Option<f32>,
    #[arg(long)]
    b: Option<f32>,
    #[arg(long)]
    epsilon: Option<f32>,
}

impl IndexArgs {
    fn resolve_params(&self) -> Result<Bm25Params> {
        let mut params = match &self.params {
            Some(path) => Bm25Params::from_json_file(path)
                .with_context(|| format!("reading parameters from {}", path.display()))?,
            None => Bm25Params::default(),
        };
        if let Some(k1) = self.k1 { params.k1 = k1; }
        if let Some(b) = self.b { params.b = b; }
        if let Some(epsilon) = self.epsilon { params.epsilon = epsilon; }
        params.validate()?;
        Ok(params)
    }
}

#[derive(Debug, Serialize)]
struct BuildReport {
    started_at: String,
    num_docs: usize,
    vocab_size: usize,
    times_s: Vec<f64>,
    mean_s: f64,
    var_s: f64,
    std_s: f64,
}

#[derive(Debug, Serialize)]
struct Hit {
    doc_id: u32,
    score: f32,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { index, iterations } => run_build(&index, iterations),
        Commands::Query { index, q, k, doc, skip_unknown } => run_query(&index, &q, k, doc, skip_unknown),
    }
}

fn run_build(args: &IndexArgs, iterations: usize) -> Result<()> {
    if iterations == 0 {
        bail!("--iterations must be at least 1");
    }
    let params = args.resolve_params()?;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "config": args, "params": params }))?);

    let started_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let mut times = Vec::with_capacity(iterations);
    let mut last = None;
    for it in 1..=iterations {
        let docs = load_corpus(&args.input, args.analyzer)?;
        let start = Instant::now();
        let index = Bm25Index::from_documents(params, docs, args.threads)?;
        let secs = start.elapsed().as_secs_f64();
        tracing::info!(iteration = it, of = iterations, secs, "build complete");
        times.push(secs);
        last = Some(index);
    }
    let index = last.context("no build ran")?;

    let (mean_s, var_s, std_s) = summarize(&times);
    let report = BuildReport {
        started_at,
        num_docs: index.total_docs()?,
        vocab_size: index.vocab_size()?,
        times_s: times,
        mean_s,
        var_s,
        std_s,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_query(args: &IndexArgs, q: &str, k: usize, doc: Option<usize>, skip_unknown: bool) -> Result<()> {
    let params = args.resolve_params()?;
    let docs = load_corpus(&args.input, args.analyzer)?;
    let index = Bm25Index::from_documents(params, docs, args.threads)?;
    let built = index.built()?;

    let policy = if skip_unknown { UnknownTermPolicy::Skip } else { UnknownTermPolicy::Reject };
    let tokens = args.analyzer.tokenize(q);
    let query = bm25_core::query::resolve_tokens(built.vocabulary(), &tokens, policy)?;

    match doc {
        Some(d) => {
            let score = built.scorer().score(&query, d)?;
            println!("{}", serde_json::to_string_pretty(&Hit { doc_id: d as u32, score })?);
        }
        None => {
            let hits: Vec<Hit> = built
                .scorer()
                .top_k(&query, k)
                .into_iter()
                .map(|(doc_id, score)| Hit { doc_id, score })
                .collect();
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
    }
    Ok(())
}

/// Load a corpus file, or every `*.txt` file under a directory in path order.
fn load_corpus(input: &Path, analyzer: Analyzer) -> Result<Vec<TokenizedDoc>> {
    let files = corpus_files(input)?;
    let mut docs = Vec::new();
    for file in &files {
        let mut loaded = load_from_file(file, analyzer).with_context(|| format!("loading {}", file.display()))?;
        docs.append(&mut loaded);
    }
    tracing::info!(files = files.len(), num_docs = docs.len(), "loaded corpus");
    Ok(docs)
}

fn corpus_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input path {} does not exist", input.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    files.sort();
    Ok(files)
}

/// Mean, population variance and standard deviation.
fn summarize(times: &[f64]) -> (f64, f64, f64) {
    if times.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = times.len() as f64;
    let mean = times.iter().sum::<f64>() / n;
    let mean_sq = times.iter().map(|t| t * t).sum::<f64>() / n;
    let var = (mean_sq - mean * mean).max(0.0);
    (mean, var, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn summarize_population_stats() {
        let (mean, var, std) = summarize(&[1.0, 2.0, 3.0, 4.0]);
        assert!((mean - 2.5).abs() < 1e-12);
        assert!((var - 1.25).abs() < 1e-12);
        assert!((std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(summarize(&[]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn directory_inputs_load_txt_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.txt"), "second file\n").unwrap();
        fs::write(dir.path().join("a.txt"), "first file\nmore\n").unwrap();
        fs::write(dir.path().join("nested/c.txt"), "third\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored\n").unwrap();

        let docs = load_corpus(dir.path(), Analyzer::Whitespace).unwrap();
        assert_eq!(docs, vec![vec!["first", "file"], vec!["more"], vec!["second", "file"], vec!["third"]]);
    }

    #[test]
    fn flags_override_param_file() {
        let dir = tempfile::tempdir().unwrap();
        let params_path = dir.path().join("params.json");
        fs::write(&params_path, r#"{"k1": 2.0, "b": 0.5}"#).unwrap();
        let args = IndexArgs {
            input: dir.path().to_path_buf(),
            threads: 1,
            analyzer: Analyzer::Whitespace,
            params: Some(params_path),
            k1: None,
            b: Some(0.9),
            epsilon: None,
        };
        assert_eq!(args.resolve_params().unwrap(), Bm25Params::new(2.0, 0.9, 0.25));
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(corpus_files(Path::new("/no/such/corpus")).is_err());
    }
}
