use anyhow::Result;
use axum::Router;
use bm25_core::{Analyzer, Bm25Params};
use clap::Parser;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus file, one document per line
    #[arg(long, default_value = "./corpus.txt")]
    corpus: PathBuf,
    /// Worker threads for the index build
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Tokenization for corpus lines and queries: whitespace or stemmed
    #[arg(long, default_value = "whitespace")]
    analyzer: Analyzer,
    /// JSON file with k1 / b / epsilon
    #[arg(long)]
    params: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let params = match &args.params {
        Some(path) => Bm25Params::from_json_file(path)?,
        None => Bm25Params::default(),
    };
    let config = ServerConfig { corpus: args.corpus, threads: args.threads, analyzer: args.analyzer, params };
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
