use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use bm25_core::corpus::load_from_file;
use bm25_core::query::resolve_tokens;
use bm25_core::{Analyzer, Bm25Index, Bm25Params, BuiltIndex, IndexStats, TermId, UnknownTermPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Everything needed to build the index the server answers from.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub corpus: PathBuf,
    pub threads: usize,
    pub analyzer: Analyzer,
    pub params: Bm25Params,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct ScoreParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f32,
    pub length: u32,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub doc_id: usize,
    pub score: f32,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub token: String,
    pub term_id: TermId,
    pub df: u32,
    pub idf: f32,
}

/// Handler errors, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<bm25_core::Error> for ApiError {
    fn from(err: bm25_core::Error) -> Self {
        use bm25_core::Error;
        match err {
            Error::OutOfRange { .. } => ApiError::NotFound(err.to_string()),
            Error::UnknownTerm(_) | Error::InvalidConfiguration(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<BuiltIndex>,
    pub analyzer: Analyzer,
}

/// Load the corpus, build the index once, and wire up the routes.
pub fn build_app(config: &ServerConfig) -> Result<Router> {
    let docs = load_from_file(&config.corpus, config.analyzer)?;
    let index = Bm25Index::from_documents(config.params, docs, config.threads)?.into_built()?;
    tracing::info!(
        num_docs = index.total_docs(),
        vocab_size = index.vocabulary().len(),
        threads = config.threads,
        "index built"
    );
    Ok(router(AppState { index: Arc::new(index), analyzer: config.analyzer }))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/score/:doc_id", get(score_handler))
        .route("/term/:token", get(term_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.index.stats())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let tokens = state.analyzer.tokenize(&params.q);
    let query = resolve_tokens(state.index.vocabulary(), &tokens, UnknownTermPolicy::Skip)?;
    // Edge case: nothing left after dropping unknown tokens
    if query.is_empty() {
        let elapsed = start.elapsed();
        return Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: 0, results: vec![] }));
    }

    let scorer = state.index.scorer();
    let scores = scorer.score_all(&query);
    let total_hits = scores.iter().filter(|&&s| s != 0.0).count();
    let k = params.k.clamp(1, 100);
    let results = bm25_core::scorer::rank(scores, k)
        .into_iter()
        .map(|(doc_id, score)| SearchHit { doc_id, score, length: state.index.doc_length(doc_id as usize).unwrap_or(0) })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn score_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<usize>,
    Query(params): Query<ScoreParams>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let tokens = state.analyzer.tokenize(&params.q);
    let query = resolve_tokens(state.index.vocabulary(), &tokens, UnknownTermPolicy::Reject)?;
    let score = state.index.scorer().score(&query, doc_id)?;
    Ok(Json(ScoreResponse { doc_id, score }))
}

pub async fn term_handler(State(state): State<AppState>, Path(token): Path<String>) -> Result<Json<TermResponse>, ApiError> {
    let term_id = state
        .index
        .vocabulary()
        .id_of(&token)
        .ok_or_else(|| ApiError::NotFound(format!("unknown term: {token:?}")))?;
    let df = state.index.doc_freq(term_id)?;
    let idf = state.index.idf(term_id)?;
    Ok(Json(TermResponse { token, term_id, df, idf }))
}
