use artsearch_core::{
    CatalogItem, FusedResult, IndexStats, ItemId, ScoredResult, SearchEngine, SearchError, SearchOptions, SearchType,
    Strategy,
};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_LIMIT: usize = 100;

type ApiError = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(rename = "type", default)]
    pub search_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub strict: bool,
    /// Comma-separated strategies fused by a hybrid search.
    pub strategies: Option<String>,
    pub vector: Option<f32>,
    pub semantic: Option<f32>,
    pub fuzzy: Option<f32>,
    pub image: Option<f32>,
}
fn default_limit() -> usize { 10 }

#[derive(Deserialize)]
pub struct SimilarParams {
    #[serde(default = "default_similar_limit")]
    pub limit: usize,
}
fn default_similar_limit() -> usize { 5 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Hits in this response, after `limit` is applied.
    pub returned_hits: usize,
    pub warnings: Vec<String>,
    pub results: Vec<FusedResult>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub admin_token: Option<String>,
}

pub fn build_app(engine: Arc<SearchEngine>) -> Router {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { engine, admin_token };

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
        .route("/similar/:item_id", get(similar_handler))
        .route("/stats", get(stats_handler))
        .route("/index", post(index_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let options = search_options(&state.engine, &params)?;
    let outcome = state.engine.search(params.q.as_str(), &options).map_err(search_error)?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        returned_hits: outcome.results.len(),
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        results: outcome.results,
    }))
}

fn search_options(engine: &SearchEngine, params: &SearchParams) -> Result<SearchOptions, ApiError> {
    let search_type = match &params.search_type {
        Some(raw) => raw.parse::<SearchType>().map_err(|e| bad_request(e.to_string()))?,
        None => SearchType::Hybrid,
    };
    let mut weights = engine.config().fusion.weights;
    let overrides = [
        (Strategy::Vector, params.vector),
        (Strategy::Semantic, params.semantic),
        (Strategy::Fuzzy, params.fuzzy),
        (Strategy::Image, params.image),
    ];
    for (strategy, w) in overrides {
        if let Some(w) = w {
            if !w.is_finite() || w < 0.0 {
                return Err(bad_request(format!("{strategy} weight must be non-negative")));
            }
            weights = weights.with(strategy, w);
        }
    }
    let mut options = SearchOptions {
        search_type,
        limit: params.limit.clamp(1, MAX_LIMIT),
        weights: Some(weights),
        strict: params.strict,
        ..SearchOptions::default()
    };
    if let Some(list) = &params.strategies {
        options.strategies = parse_strategies(list)?;
    }
    Ok(options)
}

fn parse_strategies(list: &str) -> Result<BTreeSet<Strategy>, ApiError> {
    let mut out = BTreeSet::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let strategy = Strategy::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| bad_request(format!("unknown strategy '{name}'")))?;
        out.insert(strategy);
    }
    if out.is_empty() {
        return Err(bad_request("strategies must name at least one strategy"));
    }
    Ok(out)
}

pub async fn similar_handler(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<Vec<ScoredResult>>, ApiError> {
    state
        .engine
        .similar_to(item_id, params.limit.clamp(1, MAX_LIMIT))
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(json!({ "error": "not found", "item_id": item_id }))))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.engine.stats())
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap, Json(items): Json<Vec<CatalogItem>>) -> Result<Json<IndexStats>, ApiError> {
    authorize(&state, &headers)?;
    let engine = state.engine.clone();
    let stats = tokio::task::spawn_blocking(move || engine.index_corpus(&items))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;
    Ok(Json(stats))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(unauthorized("ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(unauthorized("invalid admin token"))
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

fn unauthorized(message: &str) -> ApiError {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

fn search_error(err: SearchError) -> ApiError {
    let status = match &err {
        SearchError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(json!({ "error": err.to_string() })))
}
