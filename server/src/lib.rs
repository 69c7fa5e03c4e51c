use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use posidx_core::ingest::build_from_path;
use posidx_core::tokenizer::Tokenizer;
use posidx_core::{search_at, DiskIndex, DocId, Index, IndexPaths, QueryMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_mode() -> String { "ranked".into() }
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: Option<QueryMode>,
    pub terms: Vec<String>,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub name: String,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub name: String,
    pub word_count: u32,
}

/// Where the served index comes from.
pub enum IndexSource {
    /// A directory written by the indexer.
    Disk(String),
    /// Input documents indexed in memory at startup.
    Live(String),
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn Index>,
    pub tokenizer: Tokenizer,
}

pub fn load_index(source: &IndexSource, tokenizer: Tokenizer) -> Result<Arc<dyn Index>> {
    let index: Arc<dyn Index> = match source {
        IndexSource::Disk(dir) => Arc::new(DiskIndex::open(IndexPaths::new(dir))?),
        IndexSource::Live(input) => {
            let (index, stats) = build_from_path(std::path::Path::new(input), tokenizer)?;
            tracing::info!(num_docs = stats.documents, num_terms = index.term_count(), "serving live index");
            Arc::new(index)
        }
    };
    Ok(index)
}

pub fn build_app(index: Arc<dyn Index>, tokenizer: Tokenizer) -> Router {
    let app_state = AppState { index, tokenizer };

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
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let tokens = state.tokenizer.tokenize(&params.q);
    let terms: Vec<String> = tokens.iter().map(|(t, _)| t.clone()).collect();
    // Unknown modes answer with no hits rather than an error
    let mode = params.mode.parse::<QueryMode>().ok();
    let k = params.k.clamp(1, 100);

    let (total_hits, results) = match mode {
        None => (0, Vec::new()),
        Some(mode) => {
            let index = Arc::clone(&state.index);
            // lookups are blocking file reads
            tokio::task::spawn_blocking(move || -> posidx_core::Result<(usize, Vec<SearchHit>)> {
                let hits = search_at(&*index, &tokens, mode)?;
                let total = hits.len();
                let results = hits
                    .into_iter()
                    .take(k)
                    .map(|h| -> posidx_core::Result<SearchHit> {
                        Ok(SearchHit { doc_id: h.doc_id, score: h.score, name: index.doc_name(h.doc_id)? })
                    })
                    .collect::<posidx_core::Result<Vec<_>>>()?;
                Ok((total, results))
            })
            .await
            .map_err(internal)?
            .map_err(internal)?
        }
    };

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, mode, terms, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<DocResponse>, (StatusCode, String)> {
    let lookup = |e: posidx_core::Error| {
        if e.is_not_found() { (StatusCode::NOT_FOUND, e.to_string()) } else { internal(e) }
    };
    let name = state.index.doc_name(doc_id).map_err(lookup)?;
    let word_count = state.index.doc_word_count(doc_id).map_err(lookup)?;
    Ok(Json(DocResponse { doc_id, name, word_count }))
}
