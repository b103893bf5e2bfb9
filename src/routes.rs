use axum::{extract::State, response::Html, Json};
use chrono::Local;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::config::UpstreamConfig;
use crate::errors::ApiError;
use crate::fetcher::fetch_market_data;
use crate::models::UiSettings;
use crate::report::build_report;
use crate::risk::{attack_51_probability, attack_records, risk_summary, summarize_pools};

pub struct AppState {
    pub upstream: UpstreamConfig,
}

pub async fn get_blockchain_attacks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let (price, distribution) = fetch_market_data(&state.upstream).await;

    let pools = summarize_pools(distribution);
    let probability = attack_51_probability(pools.top_pools_combined);
    let attacks = attack_records(pools.top_pools_combined, probability);
    let risk = risk_summary(&attacks);

    info!(
        top_pools_combined = pools.top_pools_combined,
        attack_51_probability = probability,
        total_risk_score = risk.total_risk_score,
        "Computed attack report"
    );

    let report = build_report(price, pools, attacks, risk, Local::now());
    Ok(Json(serde_json::to_value(report)?))
}

pub async fn get_settings() -> Json<UiSettings> {
    Json(UiSettings::default())
}

/// Echoes the submitted settings. Nothing is stored.
pub async fn post_settings(Json(settings): Json<Value>) -> Json<Value> {
    Json(json!({ "status": "success", "settings": settings }))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn index_page() -> Html<&'static str> {
    Html(include_str!("static/index.html"))
}

pub async fn risks_page() -> Html<&'static str> {
    Html(include_str!("static/risks.html"))
}

pub async fn analysis_page() -> Html<&'static str> {
    Html(include_str!("static/analysis.html"))
}

pub async fn recommendations_page() -> Html<&'static str> {
    Html(include_str!("static/recommendations.html"))
}

pub async fn blockchain_attacks_page() -> Html<&'static str> {
    Html(include_str!("static/blockchain_attacks.html"))
}
