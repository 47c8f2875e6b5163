use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use douggle_core::config::{DEFAULT_TOP_K, MAX_TOP_K, SNIPPET_LEAD, SNIPPET_LEN};
use douggle_core::source::load_folder;
use douggle_core::{CollectionStats, EngineError, IndexCache, Normalizer, SearchEngine};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub doc_id: String,
    pub score: f32,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub collection: CollectionStats,
    pub vocabulary_size: usize,
    pub normalizer: String,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

/// Loads the collection and opens the engine through the cache.
/// A missing or empty collection yields an empty engine that answers every
/// query with no results.
pub fn load_engine(data_dir: &str, cache_dir: &str, namespace: &str, normalizer: Arc<dyn Normalizer>) -> Result<SearchEngine> {
    let documents = match load_folder(data_dir) {
        Ok(loaded) => {
            for warning in &loaded.warnings {
                tracing::warn!("{warning}");
            }
            loaded.documents
        }
        Err(EngineError::Input(msg)) => {
            tracing::warn!(%msg, "serving an empty collection");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    let cache = IndexCache::open(cache_dir, namespace)?;
    Ok(SearchEngine::open(&cache, documents, normalizer)?)
}

pub fn build_app(engine: Arc<SearchEngine>) -> Router {
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
        .route("/stats", get(stats_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, MAX_TOP_K);
    let ranked = state.engine.search_all(&params.q);
    let total_hits = ranked.iter().take_while(|h| h.score > 0.0).count();

    let raw_terms: Vec<String> = params.q.split_whitespace().map(|s| s.to_string()).collect();
    let results = ranked
        .into_iter()
        .take_while(|h| h.score > 0.0)
        .take(k)
        .map(|hit| {
            let snippet = state.engine.document(&hit.doc_id).and_then(|text| snippet_from_text(text, &raw_terms));
            SearchResult { doc_id: hit.doc_id, score: hit.score, snippet }
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search served");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
    match state.engine.document(&doc_id) {
        Some(text) => (StatusCode::OK, Json(serde_json::json!({ "doc_id": doc_id, "text": text }))),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        collection: state.engine.stats(),
        vocabulary_size: state.engine.snapshot().vocabulary().len(),
        normalizer: state.engine.normalizer().name().to_string(),
        from_cache: state.engine.was_cached(),
    })
}

fn snippet_from_text(text: &str, raw_terms: &[String]) -> Option<String> {
    if text.is_empty() { return None; }
    // find first match (case-insensitive) of any raw term
    let first_idx = raw_terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .find_map(|t| find_case_insensitive(text, t));
    let snippet = match first_idx {
        Some(idx) => {
            let start = char_floor(text, idx.saturating_sub(SNIPPET_LEAD));
            let end = char_floor(text, (start + SNIPPET_LEN).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(SNIPPET_LEN).collect(),
    };
    Some(highlight_terms(&snippet, raw_terms))
}

fn char_floor(text: &str, mut idx: usize) -> usize {
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let pat = RegexBuilder::new(&regex::escape(needle)).case_insensitive(true).build().ok()?;
    pat.find(haystack).map(|m| m.start())
}

/// Wraps every query-term occurrence in `<em>` in one pass; everything else
/// is HTML-escaped.
fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut alternatives: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    // Longest first so a term never loses to its own prefix.
    alternatives.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let pattern = alternatives.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    if pattern.is_empty() {
        return escape_html(snippet);
    }
    let Ok(pat) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return escape_html(snippet);
    };

    let mut out = String::with_capacity(snippet.len() + 16);
    let mut last = 0;
    for m in pat.find_iter(snippet) {
        out.push_str(&escape_html(&snippet[last..m.start()]));
        out.push_str("<em>");
        out.push_str(&escape_html(m.as_str()));
        out.push_str("</em>");
        last = m.end();
    }
    out.push_str(&escape_html(&snippet[last..]));
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
