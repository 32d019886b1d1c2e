use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::services::{self, SearchResult, SearchSnapshot};
use crate::error;
use crate::nutrition::NutritionFacts;
use crate::scoring::product::{self, ALTERNATIVES_THRESHOLD};
use crate::scoring::ProductRiskResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreProductRequest {
    pub nutrition: NutritionFacts,
    #[serde(default)]
    pub ingredient_statement: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(search))
        .route("/search/latest", get(latest))
        .route("/products/score", post(score_product))
}

#[instrument(skip(state, payload))]
pub async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, (StatusCode, String)> {
    let results = services::search(&state, &payload.query)
        .await
        .map_err(error::http)?;
    Ok(Json(results))
}

#[instrument(skip(state))]
pub async fn latest(
    State(state): State<AppState>,
) -> Result<Json<Option<SearchSnapshot>>, (StatusCode, String)> {
    Ok(Json(services::latest(&state)))
}

/// Scores caller-supplied nutrition facts directly. The core result is
/// synchronous and local; alternatives are attached best-effort when the
/// score is poor and the product is identifiable.
#[instrument(skip(state, payload))]
pub async fn score_product(
    State(state): State<AppState>,
    Json(payload): Json<ScoreProductRequest>,
) -> Result<Json<ProductRiskResult>, (StatusCode, String)> {
    payload.nutrition.validate().map_err(error::http)?;

    let mut result =
        product::score_product(&payload.nutrition, payload.ingredient_statement.as_deref());

    if result.score < ALTERNATIVES_THRESHOLD {
        if let Some(name) = payload.name.as_deref() {
            result.alternatives = product::enrich_alternatives(
                state.textgen.as_ref(),
                payload.brand.as_deref().unwrap_or(""),
                name,
            )
            .await;
        }
    }
    Ok(Json(result))
}
