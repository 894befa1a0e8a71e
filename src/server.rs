use crate::collector::{RateCollector, Reading};
use crate::store::HistoryStore;
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};

/// Origins allowed to call the service, fixed at deploy time.
const ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

const CONSUMED_CAPACITY_HEADER: &str = "x-consumed-capacity";

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<RateCollector>,
    pub store: Arc<dyn HistoryStore>,
    /// Pair served when the history query names none.
    pub default_pair: String,
    pub window_months: u32,
}

pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .iter()
        .map(|origin| HeaderValue::from_static(origin))
        .collect();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(AllowOrigin::list(origins));

    Router::new()
        .route("/rates", get(collect_rates))
        .route("/history", get(rate_history))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Serialize)]
struct CollectResponse {
    results: Vec<Reading>,
}

/// Collection trigger. Succeeds as long as orchestration completes, even
/// if every source failed or the write did not stick; degraded sources
/// show up as null rates.
async fn collect_rates(State(state): State<AppState>) -> Json<CollectResponse> {
    let outcome = state.collector.collect().await;
    Json(CollectResponse {
        results: outcome.reading.rates,
    })
}

#[derive(Deserialize)]
struct HistoryParams {
    pair: Option<String>,
}

/// History query over the trailing window. Store failures become a 500
/// with a generic body; internals stay in the log.
async fn rate_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let pair = params.pair.unwrap_or_else(|| state.default_pair.clone());
    let end = Utc::now();
    let start = end
        .checked_sub_months(Months::new(state.window_months))
        .unwrap_or(end);

    match state.store.query(&pair, start, end).await {
        Ok(output) => (
            [(CONSUMED_CAPACITY_HEADER, output.read_units.to_string())],
            Json(output.records),
        )
            .into_response(),
        Err(error) => {
            error!(%error, %pair, "History query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to retrieve data" })),
            )
                .into_response()
        }
    }
}
